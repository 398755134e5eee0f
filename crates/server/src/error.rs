// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use manifest_guard_api::{ApiError, AuthError};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body returned when a guarded operation needs the override PIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedResponse {
    pub blocked: bool,
    pub requires_override: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_manifest_id: Option<i64>,
}

/// Body returned for every other failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// The offending request field, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Blocked(BlockedResponse),
    Error(ErrorResponse),
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    /// The HTTP status code.
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl HttpError {
    fn message(status: StatusCode, error: String) -> Self {
        Self {
            status,
            body: ErrorBody::Error(ErrorResponse {
                error,
                field: None,
                locked_until: None,
            }),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { .. } => Self::message(StatusCode::NOT_FOUND, err.to_string()),
            ApiError::Conflict { .. } => Self::message(StatusCode::CONFLICT, err.to_string()),
            ApiError::GuardBlocked {
                reason,
                draft_manifest_id,
            } => Self {
                status: StatusCode::FORBIDDEN,
                body: ErrorBody::Blocked(BlockedResponse {
                    blocked: true,
                    requires_override: true,
                    reason,
                    draft_manifest_id,
                }),
            },
            ApiError::InvalidOverride { message } => {
                Self::message(StatusCode::BAD_REQUEST, message)
            }
            ApiError::OverrideLockedOut { ref until } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: ErrorBody::Error(ErrorResponse {
                    error: err.to_string(),
                    field: None,
                    locked_until: Some(until.clone()),
                }),
            },
            ApiError::ValidationFailure { ref field, .. } => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody::Error(ErrorResponse {
                    error: err.to_string(),
                    field: Some(field.clone()),
                    locked_until: None,
                }),
            },
            ApiError::ExternalServiceFailure { .. } => {
                Self::message(StatusCode::BAD_GATEWAY, err.to_string())
            }
            ApiError::Internal { message } => {
                error!(error = %message, "Internal error while handling request");
                Self::message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal server error"),
                )
            }
        }
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        ApiError::from(err).into()
    }
}
