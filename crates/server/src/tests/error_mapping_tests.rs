// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::http::StatusCode;
use manifest_guard_api::{ApiError, AuthError};

use crate::error::{BlockedResponse, ErrorBody, ErrorResponse, HttpError};

fn status_of(err: ApiError) -> StatusCode {
    HttpError::from(err).status
}

#[test]
fn test_status_mapping() {
    let cases: Vec<(ApiError, StatusCode)> = vec![
        (
            ApiError::NotFound {
                resource_type: String::from("Invoice"),
                message: String::from("i9"),
            },
            StatusCode::NOT_FOUND,
        ),
        (
            ApiError::Conflict {
                message: String::from("already cancelled"),
            },
            StatusCode::CONFLICT,
        ),
        (
            ApiError::InvalidOverride {
                message: String::from("Invalid override PIN"),
            },
            StatusCode::BAD_REQUEST,
        ),
        (
            ApiError::OverrideLockedOut {
                until: String::from("2026-03-14T12:15:00Z"),
            },
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (
            ApiError::ValidationFailure {
                field: String::from("items"),
                message: String::from("empty"),
            },
            StatusCode::BAD_REQUEST,
        ),
        (
            ApiError::ExternalServiceFailure {
                message: String::from("timeout"),
            },
            StatusCode::BAD_GATEWAY,
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(status_of(err), expected);
    }
}

#[test]
fn test_guard_block_carries_blocked_body() {
    let http: HttpError = ApiError::GuardBlocked {
        reason: String::from("Manifest 4 is still a draft"),
        draft_manifest_id: Some(4),
    }
    .into();

    assert_eq!(http.status, StatusCode::FORBIDDEN);
    assert_eq!(
        http.body,
        ErrorBody::Blocked(BlockedResponse {
            blocked: true,
            requires_override: true,
            reason: String::from("Manifest 4 is still a draft"),
            draft_manifest_id: Some(4),
        })
    );
}

#[test]
fn test_internal_error_hides_details() {
    let http: HttpError = ApiError::Internal {
        message: String::from("disk I/O error at /var/lib/db"),
    }
    .into();

    assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        http.body,
        ErrorBody::Error(ErrorResponse {
            error: String::from("Internal server error"),
            field: None,
            locked_until: None,
        })
    );
}

#[test]
fn test_auth_error_is_a_bad_request() {
    let http: HttpError = AuthError::AuthenticationFailed {
        reason: String::from("Actor ID cannot be empty"),
    }
    .into();

    assert_eq!(http.status, StatusCode::BAD_REQUEST);
    assert!(matches!(
        http.body,
        ErrorBody::Error(ErrorResponse { field: Some(ref field), .. }) if field == "actorId"
    ));
}

#[test]
fn test_only_a_guard_block_is_forbidden() {
    let rejected: HttpError = ApiError::InvalidOverride {
        message: String::from("Invalid override PIN"),
    }
    .into();

    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        rejected.body,
        ErrorBody::Error(ErrorResponse {
            error: String::from("Invalid override PIN"),
            field: None,
            locked_until: None,
        })
    );
}
