// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use manifest_guard_audit::{AuditAction, AuditEntry, EntityType};
use manifest_guard_persistence::Persistence;
use time::Duration;

use super::helpers::{
    TEST_PIN, WRONG_PIN, configure_pin, create_test_actor, create_test_persistence, test_now,
    test_policy,
};
use crate::{
    ApiError, PinCheck, PinStatusResponse, SetPinRequest, SetPinResponse, is_pin_configured,
    pin_status, set_override_pin, verify_override_pin,
};

fn set_request(new_pin: &str, current_pin: Option<&str>) -> SetPinRequest {
    SetPinRequest {
        new_pin: new_pin.to_string(),
        current_pin: current_pin.map(str::to_string),
    }
}

fn pin_audit(persistence: &mut Persistence) -> Vec<AuditEntry> {
    persistence
        .list_audit_entries(Some(EntityType::OverridePin), Some("override-pin"))
        .unwrap()
}

#[test]
fn test_status_before_configuration() {
    let mut persistence: Persistence = create_test_persistence();

    let status: PinStatusResponse = pin_status(&mut persistence, test_now()).unwrap();

    assert!(!status.configured);
    assert_eq!(status.updated_by, None);
    assert!(!is_pin_configured(&mut persistence).unwrap());
}

#[test]
fn test_initial_pin_needs_no_current_pin() {
    let mut persistence: Persistence = create_test_persistence();

    let response: SetPinResponse = set_override_pin(
        &mut persistence,
        &test_policy(),
        &set_request(TEST_PIN, None),
        &create_test_actor(),
        test_now(),
    )
    .unwrap();

    assert!(response.configured);
    assert_eq!(response.updated_by, "operator-1");
    assert_eq!(response.message, "Override PIN configured");

    let status: PinStatusResponse = pin_status(&mut persistence, test_now()).unwrap();
    assert!(status.configured);
    assert_eq!(status.updated_by.as_deref(), Some("operator-1"));
    assert_eq!(status.locked_until, None);

    let audit: Vec<AuditEntry> = pin_audit(&mut persistence);
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::OverridePinChanged { initial: true });
}

#[test]
fn test_malformed_pin_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();

    for candidate in ["12345", "12345a", "1234567"] {
        let result = set_override_pin(
            &mut persistence,
            &test_policy(),
            &set_request(candidate, None),
            &create_test_actor(),
            test_now(),
        );
        assert!(matches!(result, Err(ApiError::ValidationFailure { .. })));
    }
    assert!(!is_pin_configured(&mut persistence).unwrap());
}

#[test]
fn test_replacing_requires_current_pin() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);

    let result = set_override_pin(
        &mut persistence,
        &test_policy(),
        &set_request("111111", None),
        &create_test_actor(),
        test_now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::ValidationFailure { ref field, .. }) if field == "currentPin"
    ));
}

#[test]
fn test_replacing_with_wrong_current_pin_is_audited() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);

    let result = set_override_pin(
        &mut persistence,
        &test_policy(),
        &set_request("111111", Some(WRONG_PIN)),
        &create_test_actor(),
        test_now(),
    );

    assert_eq!(
        result.unwrap_err(),
        ApiError::InvalidOverride {
            message: String::from("Current PIN is incorrect"),
        }
    );
    let audit: Vec<AuditEntry> = pin_audit(&mut persistence);
    assert_eq!(
        audit[1].action,
        AuditAction::OverridePinChangeRejected { failed_attempts: 1 }
    );
    assert_eq!(
        verify_override_pin(&mut persistence, &test_policy(), TEST_PIN, test_now()).unwrap(),
        PinCheck::Valid
    );
}

#[test]
fn test_replacing_invalidates_the_old_pin() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);

    let response: SetPinResponse = set_override_pin(
        &mut persistence,
        &test_policy(),
        &set_request("111111", Some(TEST_PIN)),
        &create_test_actor(),
        test_now(),
    )
    .unwrap();

    assert_eq!(response.message, "Override PIN replaced");
    assert_eq!(
        verify_override_pin(&mut persistence, &test_policy(), "111111", test_now()).unwrap(),
        PinCheck::Valid
    );
    assert!(matches!(
        verify_override_pin(&mut persistence, &test_policy(), TEST_PIN, test_now()).unwrap(),
        PinCheck::Invalid { .. }
    ));
}

#[test]
fn test_verify_without_configuration() {
    let mut persistence: Persistence = create_test_persistence();

    let check: PinCheck =
        verify_override_pin(&mut persistence, &test_policy(), TEST_PIN, test_now()).unwrap();

    assert_eq!(check, PinCheck::NotConfigured);
}

#[test]
fn test_successful_verification_resets_the_counter() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);
    let policy = test_policy();

    for expected in 1..=2 {
        assert_eq!(
            verify_override_pin(&mut persistence, &policy, WRONG_PIN, test_now()).unwrap(),
            PinCheck::Invalid {
                failed_attempts: expected,
                locked_until: None,
            }
        );
    }
    assert_eq!(
        verify_override_pin(&mut persistence, &policy, TEST_PIN, test_now()).unwrap(),
        PinCheck::Valid
    );
    assert_eq!(
        verify_override_pin(&mut persistence, &policy, WRONG_PIN, test_now()).unwrap(),
        PinCheck::Invalid {
            failed_attempts: 1,
            locked_until: None,
        }
    );
}

#[test]
fn test_malformed_candidate_counts_as_a_failure() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);

    let check: PinCheck =
        verify_override_pin(&mut persistence, &test_policy(), "abc", test_now()).unwrap();

    assert!(matches!(check, PinCheck::Invalid { failed_attempts: 1, .. }));
}

#[test]
fn test_lockout_is_reported_until_it_expires() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);
    let policy = test_policy();

    for _ in 0..3 {
        verify_override_pin(&mut persistence, &policy, WRONG_PIN, test_now()).unwrap();
    }

    let until: String = String::from("2026-03-14T12:15:00Z");
    assert_eq!(
        verify_override_pin(&mut persistence, &policy, TEST_PIN, test_now()).unwrap(),
        PinCheck::LockedOut {
            until: until.clone(),
        }
    );
    let status: PinStatusResponse = pin_status(&mut persistence, test_now()).unwrap();
    assert_eq!(status.locked_until, Some(until));

    let later = test_now() + Duration::minutes(16);
    let status: PinStatusResponse = pin_status(&mut persistence, later).unwrap();
    assert_eq!(status.locked_until, None);
    assert_eq!(
        verify_override_pin(&mut persistence, &policy, TEST_PIN, later).unwrap(),
        PinCheck::Valid
    );
}

#[test]
fn test_lockout_blocks_pin_change() {
    let mut persistence: Persistence = create_test_persistence();
    configure_pin(&mut persistence);
    let policy = test_policy();

    for _ in 0..3 {
        verify_override_pin(&mut persistence, &policy, WRONG_PIN, test_now()).unwrap();
    }

    let result = set_override_pin(
        &mut persistence,
        &policy,
        &set_request("111111", Some(TEST_PIN)),
        &create_test_actor(),
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::OverrideLockedOut { .. })));
}
