// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Override PIN mutations.
//!
//! The credential is a single row. The PIN itself is never stored or logged;
//! only its bcrypt hash and who last set it.

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard_audit::AuditEntry;
use manifest_guard_domain::Pin;
use tracing::{info, warn};

use crate::data_models::PinAttemptState;
use crate::diesel_schema::override_pin;
use crate::error::PersistenceError;
use crate::mutations::audit::append_audit_entry;
use crate::queries::pin::PIN_ROW_ID;
use crate::timestamp_now;

/// Hashes and stores a new override PIN, clearing any lockout, and writes
/// the audit entry in the same transaction.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `pin` - The new PIN
/// * `updated_by` - The acting user's id
/// * `hash_cost` - The bcrypt cost factor
/// * `audit` - The audit entry for the change
///
/// # Errors
///
/// Returns an error if hashing or the write fails.
pub fn replace_override_pin(
    conn: &mut SqliteConnection,
    pin: &Pin,
    updated_by: &str,
    hash_cost: u32,
    audit: &AuditEntry,
) -> Result<(), PersistenceError> {
    let pin_hash: String = bcrypt::hash(pin.expose(), hash_cost)
        .map_err(|e| PersistenceError::PinHashError(format!("Failed to hash PIN: {e}")))?;
    let now: String = timestamp_now()?;

    conn.immediate_transaction(|conn| {
        diesel::replace_into(override_pin::table)
            .values((
                override_pin::pin_id.eq(PIN_ROW_ID),
                override_pin::pin_hash.eq(&pin_hash),
                override_pin::updated_by.eq(updated_by),
                override_pin::updated_at.eq(&now),
                override_pin::failed_attempts.eq(0),
                override_pin::locked_until.eq(None::<String>),
            ))
            .execute(conn)?;

        append_audit_entry(conn, audit)?;
        info!(updated_by, "Override PIN replaced");
        Ok(())
    })
}

/// Counts one failed PIN attempt.
///
/// When the count reaches `max_attempts` the credential is locked until
/// `lock_until` and the counter starts again from zero.
///
/// # Errors
///
/// Returns `NotFound` if no PIN has been set.
pub fn record_failed_pin_attempt(
    conn: &mut SqliteConnection,
    max_attempts: u32,
    lock_until: &str,
) -> Result<PinAttemptState, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let current: i32 = override_pin::table
            .filter(override_pin::pin_id.eq(PIN_ROW_ID))
            .select(override_pin::failed_attempts)
            .first(conn)
            .optional()?
            .ok_or_else(|| PersistenceError::NotFound("override PIN".to_string()))?;

        let failed_attempts: u32 = u32::try_from(current)
            .map_err(|e| PersistenceError::ReconstructionError(format!("failed_attempts: {e}")))?
            .saturating_add(1);

        let target = override_pin::table.filter(override_pin::pin_id.eq(PIN_ROW_ID));

        if failed_attempts >= max_attempts {
            diesel::update(target)
                .set((
                    override_pin::failed_attempts.eq(0),
                    override_pin::locked_until.eq(lock_until),
                ))
                .execute(conn)?;
            warn!(failed_attempts, lock_until, "Override PIN locked");
            return Ok(PinAttemptState {
                failed_attempts,
                locked_until: Some(lock_until.to_string()),
            });
        }

        let stored: i32 = i32::try_from(failed_attempts)
            .map_err(|e| PersistenceError::Other(format!("failed_attempts: {e}")))?;
        diesel::update(target)
            .set(override_pin::failed_attempts.eq(stored))
            .execute(conn)?;
        warn!(failed_attempts, "Override PIN attempt rejected");

        Ok(PinAttemptState {
            failed_attempts,
            locked_until: None,
        })
    })
}

/// Resets the failure counter and any expired lockout after a successful
/// verification.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn clear_failed_pin_attempts(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    diesel::update(override_pin::table.filter(override_pin::pin_id.eq(PIN_ROW_ID)))
        .set((
            override_pin::failed_attempts.eq(0),
            override_pin::locked_until.eq(None::<String>),
        ))
        .execute(conn)?;
    Ok(())
}
