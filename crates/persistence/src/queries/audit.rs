// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit trail queries.

use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard_audit::{Actor, AuditAction, AuditEntry, EntityType};

use crate::diesel_schema::audit_entries;
use crate::error::PersistenceError;

/// Diesel Queryable struct for audit entry rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_entries)]
struct AuditEntryRow {
    entry_id: i64,
    actor_id: String,
    actor_type: String,
    entity_type: String,
    entity_id: String,
    action_json: String,
    created_at: String,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = PersistenceError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let action: AuditAction = serde_json::from_str(&row.action_json)?;
        let entity_type: EntityType = EntityType::from_str(&row.entity_type)
            .map_err(PersistenceError::ReconstructionError)?;

        Ok(Self {
            entry_id: Some(row.entry_id),
            actor: Actor::new(row.actor_id, row.actor_type),
            action,
            entity_type,
            entity_id: row.entity_id,
            created_at: Some(row.created_at),
        })
    }
}

/// Lists audit entries in the order they were written.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `entity_type` - Only entries about this kind of entity
/// * `entity_id` - Only entries about this entity
///
/// # Errors
///
/// Returns an error if the database cannot be queried or an entry cannot be
/// deserialized.
pub fn list_audit_entries(
    conn: &mut SqliteConnection,
    entity_type: Option<EntityType>,
    entity_id: Option<&str>,
) -> Result<Vec<AuditEntry>, PersistenceError> {
    let mut query = audit_entries::table
        .select(AuditEntryRow::as_select())
        .order(audit_entries::entry_id.asc())
        .into_boxed();

    if let Some(entity_type) = entity_type {
        query = query.filter(audit_entries::entity_type.eq(entity_type.as_str()));
    }
    if let Some(entity_id) = entity_id {
        query = query.filter(audit_entries::entity_id.eq(entity_id.to_string()));
    }

    query
        .load::<AuditEntryRow>(conn)?
        .into_iter()
        .map(AuditEntry::try_from)
        .collect()
}
