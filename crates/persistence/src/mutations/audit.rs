// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit entry persistence.

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard_audit::AuditEntry;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::audit_entries;
use crate::error::PersistenceError;
use crate::timestamp_now;

/// Appends an audit entry.
///
/// The action metadata is stored as JSON next to the columns used for
/// filtering. Callers that also mutate state invoke this inside the same
/// transaction.
///
/// # Returns
///
/// The entry ID assigned by the database.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn append_audit_entry(
    conn: &mut SqliteConnection,
    entry: &AuditEntry,
) -> Result<i64, PersistenceError> {
    let action_json: String = serde_json::to_string(&entry.action)?;
    let created_at: String = match &entry.created_at {
        Some(created_at) => created_at.clone(),
        None => timestamp_now()?,
    };

    diesel::insert_into(audit_entries::table)
        .values((
            audit_entries::actor_id.eq(&entry.actor.id),
            audit_entries::actor_type.eq(&entry.actor.actor_type),
            audit_entries::action.eq(entry.action.name()),
            audit_entries::entity_type.eq(entry.entity_type.as_str()),
            audit_entries::entity_id.eq(&entry.entity_id),
            audit_entries::source.eq(entry.action.source().map(|s| s.as_str())),
            audit_entries::manifest_id.eq(entry.action.manifest_id()),
            audit_entries::action_json.eq(&action_json),
            audit_entries::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let entry_id: i64 = conn.get_last_insert_rowid()?;
    debug!(
        entry_id,
        action = entry.action.name(),
        entity_id = %entry.entity_id,
        "Audit entry written"
    );
    Ok(entry_id)
}
