// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Override PIN queries.

use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::data_models::PinCredentialData;
use crate::diesel_schema::override_pin;
use crate::error::PersistenceError;

/// The primary key of the single credential row.
pub const PIN_ROW_ID: i32 = 1;

#[derive(Queryable, Selectable)]
#[diesel(table_name = override_pin)]
struct PinRow {
    pin_hash: String,
    updated_by: String,
    updated_at: String,
    failed_attempts: i32,
    locked_until: Option<String>,
}

/// Retrieves the override credential, if one has been set.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn get_override_pin(
    conn: &mut SqliteConnection,
) -> Result<Option<PinCredentialData>, PersistenceError> {
    let row: Option<PinRow> = override_pin::table
        .filter(override_pin::pin_id.eq(PIN_ROW_ID))
        .select(PinRow::as_select())
        .first(conn)
        .optional()?;

    row.map(|row| {
        Ok(PinCredentialData {
            failed_attempts: u32::try_from(row.failed_attempts).map_err(|e| {
                PersistenceError::ReconstructionError(format!("failed_attempts: {e}"))
            })?,
            pin_hash: row.pin_hash,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
            locked_until: row.locked_until,
        })
    })
    .transpose()
}

/// Verifies a PIN against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_pin_hash(pin: &str, pin_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(pin, pin_hash)
        .map_err(|e| PersistenceError::PinHashError(format!("Failed to verify PIN: {e}")))
}
