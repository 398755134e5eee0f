// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Override PIN service.
//!
//! One PIN is shared by the whole organisation. It is stored as a bcrypt
//! hash, never logged, and locked for a while after repeated failures.

use manifest_guard_audit::{AuditAction, AuditEntry, EntityType};
use manifest_guard_domain::Pin;
use manifest_guard_persistence::{Persistence, PinAttemptState, PinCredentialData};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::auth::AuthenticatedActor;
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::policy::{OverridePolicy, PinPolicyError};
use crate::request_response::{PinStatusResponse, SetPinRequest, SetPinResponse};

/// Entity id used on audit entries about the override PIN.
const PIN_ENTITY_ID: &str = "override-pin";

/// Result of checking a candidate PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinCheck {
    /// The PIN matched; the failure counter was reset.
    Valid,
    /// The PIN did not match.
    Invalid {
        /// Consecutive failures including this one.
        failed_attempts: u32,
        /// Set when this failure started a lockout.
        locked_until: Option<String>,
    },
    /// A lockout is in force; the candidate was not checked.
    LockedOut {
        /// When the lockout ends.
        until: String,
    },
    /// No PIN has been set.
    NotConfigured,
}

fn format_timestamp(value: OffsetDateTime) -> Result<String, ApiError> {
    value.format(&Rfc3339).map_err(|e| ApiError::Internal {
        message: format!("Failed to format timestamp: {e}"),
    })
}

/// Returns the end of the lockout if one is still in force at `now`.
fn active_lockout(
    credential: &PinCredentialData,
    now: OffsetDateTime,
) -> Result<Option<String>, ApiError> {
    let Some(locked_until) = credential.locked_until.as_deref() else {
        return Ok(None);
    };
    let until: OffsetDateTime =
        OffsetDateTime::parse(locked_until, &Rfc3339).map_err(|e| ApiError::Internal {
            message: format!("Stored lockout time could not be read: {e}"),
        })?;
    Ok((until > now).then(|| locked_until.to_string()))
}

/// Message for a rejected PIN, mentioning the lockout it started.
pub(crate) fn rejection_message(base: &str, locked_until: Option<&str>) -> String {
    match locked_until {
        Some(until) => format!("{base}; override locked until {until}"),
        None => base.to_string(),
    }
}

/// Reports whether an override PIN has been set.
///
/// # Errors
///
/// Returns an error if the credential cannot be read.
pub fn is_pin_configured(persistence: &mut Persistence) -> Result<bool, ApiError> {
    Ok(persistence
        .get_override_pin()
        .map_err(translate_persistence_error)?
        .is_some())
}

/// Describes the override PIN without revealing it.
///
/// # Errors
///
/// Returns an error if the credential cannot be read.
pub fn pin_status(
    persistence: &mut Persistence,
    now: OffsetDateTime,
) -> Result<PinStatusResponse, ApiError> {
    let credential: Option<PinCredentialData> = persistence
        .get_override_pin()
        .map_err(translate_persistence_error)?;

    match credential {
        None => Ok(PinStatusResponse {
            configured: false,
            updated_by: None,
            updated_at: None,
            locked_until: None,
        }),
        Some(credential) => Ok(PinStatusResponse {
            configured: true,
            locked_until: active_lockout(&credential, now)?,
            updated_by: Some(credential.updated_by),
            updated_at: Some(credential.updated_at),
        }),
    }
}

/// Checks a candidate PIN against the stored hash.
///
/// A mismatch is an outcome, not an error. A malformed candidate counts as a
/// mismatch.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - Lockout limits
/// * `candidate` - The PIN as typed by the user
/// * `now` - The current time
///
/// # Errors
///
/// Returns an error only if the credential cannot be read or updated.
pub fn verify_override_pin(
    persistence: &mut Persistence,
    policy: &OverridePolicy,
    candidate: &str,
    now: OffsetDateTime,
) -> Result<PinCheck, ApiError> {
    let Some(credential) = persistence
        .get_override_pin()
        .map_err(translate_persistence_error)?
    else {
        return Ok(PinCheck::NotConfigured);
    };

    if let Some(until) = active_lockout(&credential, now)? {
        warn!(%until, "Override PIN attempt while locked");
        return Ok(PinCheck::LockedOut { until });
    }

    let matches: bool = match Pin::parse(candidate) {
        Ok(pin) => persistence
            .verify_pin(&pin, &credential.pin_hash)
            .map_err(translate_persistence_error)?,
        Err(_) => false,
    };

    if matches {
        persistence
            .clear_failed_pin_attempts()
            .map_err(translate_persistence_error)?;
        return Ok(PinCheck::Valid);
    }

    let lock_until: String = format_timestamp(now + policy.lockout)?;
    let state: PinAttemptState = persistence
        .record_failed_pin_attempt(policy.max_attempts, &lock_until)
        .map_err(translate_persistence_error)?;

    Ok(PinCheck::Invalid {
        failed_attempts: state.failed_attempts,
        locked_until: state.locked_until,
    })
}

/// Sets the override PIN, or replaces it given the current one.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - Lockout limits and hash cost
/// * `request` - The new PIN and, when replacing, the current one
/// * `authenticated_actor` - Who is changing the PIN
/// * `now` - The current time
///
/// # Errors
///
/// Returns an error if:
/// - the new PIN is not exactly six digits
/// - a PIN exists and the current PIN is missing, wrong or locked out
/// - the credential cannot be written
pub fn set_override_pin(
    persistence: &mut Persistence,
    policy: &OverridePolicy,
    request: &SetPinRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<SetPinResponse, ApiError> {
    let new_pin: Pin = Pin::parse(&request.new_pin).map_err(translate_domain_error)?;
    let configured: bool = is_pin_configured(persistence)?;

    if configured {
        let current: &str = request
            .current_pin
            .as_deref()
            .ok_or(PinPolicyError::CurrentPinRequired)?;

        match verify_override_pin(persistence, policy, current, now)? {
            PinCheck::Valid | PinCheck::NotConfigured => {}
            PinCheck::LockedOut { until } => return Err(ApiError::OverrideLockedOut { until }),
            PinCheck::Invalid {
                failed_attempts,
                locked_until,
            } => {
                let audit: AuditEntry = AuditEntry::new(
                    authenticated_actor.to_audit_actor(),
                    AuditAction::OverridePinChangeRejected { failed_attempts },
                    EntityType::OverridePin,
                    PIN_ENTITY_ID.to_string(),
                );
                persistence
                    .append_audit_entry(&audit)
                    .map_err(translate_persistence_error)?;
                warn!(
                    actor = %authenticated_actor.id,
                    failed_attempts,
                    "Override PIN change rejected"
                );
                return Err(ApiError::InvalidOverride {
                    message: rejection_message("Current PIN is incorrect", locked_until.as_deref()),
                });
            }
        }
    }

    let audit: AuditEntry = AuditEntry::new(
        authenticated_actor.to_audit_actor(),
        AuditAction::OverridePinChanged {
            initial: !configured,
        },
        EntityType::OverridePin,
        PIN_ENTITY_ID.to_string(),
    );
    persistence
        .replace_override_pin(&new_pin, &authenticated_actor.id, policy.hash_cost, &audit)
        .map_err(translate_persistence_error)?;

    info!(actor = %authenticated_actor.id, initial = !configured, "Override PIN set");

    Ok(SetPinResponse {
        configured: true,
        updated_by: authenticated_actor.id.clone(),
        message: if configured {
            String::from("Override PIN replaced")
        } else {
            String::from("Override PIN configured")
        },
    })
}
