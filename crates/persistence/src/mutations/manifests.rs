// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Manifest generation, lifecycle transitions and item outcomes.

use std::collections::{BTreeSet, HashMap, HashSet};

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use manifest_guard::{GenerationPlan, ManifestItemPlan, ScannedReturnRecord, orders_to_resolve};
use manifest_guard_audit::{Actor, AuditAction, AuditEntry, EntityType};
use manifest_guard_domain::{ItemOutcome, ManifestItemStatus, ManifestStatus, ManifestType};
use time::Date;
use time::macros::format_description;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::{GenerationOutcome, NewManifestItem};
use crate::diesel_schema::{manifest_awb_claims, manifest_items, manifests};
use crate::error::PersistenceError;
use crate::mutations::audit::append_audit_entry;
use crate::queries::manifests::open_manifest_awbs;
use crate::queries::returns::{latest_issued_invoices, load_return_candidates};
use crate::timestamp_now;

fn format_document_date(date: Date) -> Result<String, PersistenceError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Inserts a draft manifest, its items and their AWB claims.
///
/// Must run inside a transaction. A unique-index violation on the claims
/// table aborts the insert with `AwbAlreadyClaimed`.
fn insert_manifest(
    conn: &mut SqliteConnection,
    manifest_type: ManifestType,
    document_date: &str,
    items: &[ManifestItemPlan],
    actor: &Actor,
) -> Result<i64, PersistenceError> {
    let now: String = timestamp_now()?;

    diesel::insert_into(manifests::table)
        .values((
            manifests::manifest_type.eq(manifest_type.as_str()),
            manifests::status.eq(ManifestStatus::Draft.as_str()),
            manifests::document_date.eq(document_date),
            manifests::created_by.eq(&actor.id),
            manifests::created_at.eq(&now),
        ))
        .execute(conn)?;

    let manifest_id: i64 = conn.get_last_insert_rowid()?;

    for item in items {
        diesel::insert_into(manifest_items::table)
            .values((
                manifest_items::manifest_id.eq(manifest_id),
                manifest_items::awb_number.eq(&item.awb_number),
                manifest_items::original_awb_number.eq(&item.original_awb_number),
                manifest_items::order_id.eq(&item.order_id),
                manifest_items::invoice_id.eq(&item.invoice_id),
                manifest_items::status.eq(ManifestItemStatus::Pending.as_str()),
            ))
            .execute(conn)?;

        diesel::insert_into(manifest_awb_claims::table)
            .values((
                manifest_awb_claims::manifest_type.eq(manifest_type.as_str()),
                manifest_awb_claims::awb_number.eq(&item.awb_number),
                manifest_awb_claims::manifest_id.eq(manifest_id),
            ))
            .execute(conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    PersistenceError::AwbAlreadyClaimed {
                        manifest_type: manifest_type.as_str().to_string(),
                        awb_number: item.awb_number.clone(),
                    }
                }
                other => PersistenceError::from(other),
            })?;
    }

    let audit: AuditEntry = AuditEntry::new(
        actor.clone(),
        AuditAction::ManifestGenerated {
            manifest_type,
            item_count: items.len(),
            document_date: document_date.to_string(),
        },
        EntityType::Manifest,
        manifest_id.to_string(),
    );
    append_audit_entry(conn, &audit)?;

    Ok(manifest_id)
}

/// Runs one return manifest generation.
///
/// The exclusion set, the candidates and the insert are all read and
/// written under one `BEGIN IMMEDIATE`, so two concurrent runs serialize and
/// the second one sees the first one's items.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `document_date` - The date printed on the manifest
/// * `return_ids` - Restrict the run to these scanned returns when given
/// * `actor` - Who triggered the run
///
/// # Errors
///
/// Returns an error if any query fails or an AWB claim is contested.
pub fn generate_return_manifest(
    conn: &mut SqliteConnection,
    document_date: Date,
    return_ids: Option<&[String]>,
    actor: &Actor,
) -> Result<GenerationOutcome, PersistenceError> {
    let document_date_text: String = format_document_date(document_date)?;

    conn.immediate_transaction(|conn| {
        let excluded: HashSet<String> = open_manifest_awbs(conn, ManifestType::Return)?;
        let candidates: Vec<ScannedReturnRecord> = load_return_candidates(conn, return_ids)?;
        let order_ids: BTreeSet<String> = orders_to_resolve(&candidates);
        let latest: HashMap<String, String> = latest_issued_invoices(conn, &order_ids)?;

        debug!(
            candidates = candidates.len(),
            excluded = excluded.len(),
            "Planning return manifest"
        );

        match manifest_guard::plan_return_manifest(document_date, &candidates, &excluded, &latest)
        {
            GenerationPlan::NothingNew => {
                info!("No new returns available for a return manifest");
                Ok(GenerationOutcome::NothingNew)
            }
            GenerationPlan::Create(plan) => {
                let manifest_id: i64 = insert_manifest(
                    conn,
                    plan.manifest_type,
                    &document_date_text,
                    &plan.items,
                    actor,
                )?;
                info!(
                    manifest_id,
                    item_count = plan.items.len(),
                    "Return manifest generated"
                );
                Ok(GenerationOutcome::Created {
                    manifest_id,
                    item_count: plan.items.len(),
                })
            }
        }
    })
}

/// Creates a draft delivery manifest from items supplied by dispatch.
///
/// # Errors
///
/// Returns `AwbAlreadyClaimed` if any AWB is already on an open delivery
/// manifest.
pub fn create_delivery_manifest(
    conn: &mut SqliteConnection,
    document_date: Date,
    items: &[NewManifestItem],
    actor: &Actor,
) -> Result<i64, PersistenceError> {
    let document_date_text: String = format_document_date(document_date)?;
    let planned: Vec<ManifestItemPlan> = items
        .iter()
        .map(|item| ManifestItemPlan {
            awb_number: item.awb_number.clone(),
            original_awb_number: item.original_awb_number.clone(),
            order_id: item.order_id.clone(),
            invoice_id: item.invoice_id.clone(),
        })
        .collect();

    conn.immediate_transaction(|conn| {
        let manifest_id: i64 = insert_manifest(
            conn,
            ManifestType::Delivery,
            &document_date_text,
            &planned,
            actor,
        )?;
        info!(
            manifest_id,
            item_count = planned.len(),
            "Delivery manifest created"
        );
        Ok(manifest_id)
    })
}

/// Moves a manifest from `from` to `to`, stamping the actor and time.
///
/// The caller validates the step; this function only applies it if the
/// manifest is still in `from`. Reaching `PROCESSED` releases the
/// manifest's AWB claims.
///
/// # Errors
///
/// Returns `ManifestNotFound` or `ManifestStatusChanged` if nothing was
/// updated.
pub fn transition_manifest(
    conn: &mut SqliteConnection,
    manifest_id: i64,
    from: ManifestStatus,
    to: ManifestStatus,
    actor: &Actor,
) -> Result<(), PersistenceError> {
    let now: String = timestamp_now()?;

    conn.immediate_transaction(|conn| {
        let target = manifests::table
            .filter(manifests::manifest_id.eq(manifest_id))
            .filter(manifests::status.eq(from.as_str()));

        let updated: usize = match to {
            ManifestStatus::Confirmed => diesel::update(target)
                .set((
                    manifests::status.eq(to.as_str()),
                    manifests::confirmed_at.eq(&now),
                    manifests::confirmed_by.eq(&actor.id),
                ))
                .execute(conn)?,
            ManifestStatus::Processed => diesel::update(target)
                .set((
                    manifests::status.eq(to.as_str()),
                    manifests::processed_at.eq(&now),
                    manifests::processed_by.eq(&actor.id),
                ))
                .execute(conn)?,
            ManifestStatus::Draft => 0,
        };

        if updated == 0 {
            let exists: bool = diesel::select(diesel::dsl::exists(
                manifests::table.filter(manifests::manifest_id.eq(manifest_id)),
            ))
            .get_result(conn)?;
            if !exists {
                return Err(PersistenceError::ManifestNotFound(manifest_id));
            }
            return Err(PersistenceError::ManifestStatusChanged {
                manifest_id,
                expected: from.as_str().to_string(),
            });
        }

        let action: AuditAction = if to == ManifestStatus::Processed {
            let released_claims: usize = diesel::delete(
                manifest_awb_claims::table
                    .filter(manifest_awb_claims::manifest_id.eq(manifest_id)),
            )
            .execute(conn)?;
            AuditAction::ManifestProcessed { released_claims }
        } else {
            AuditAction::ManifestConfirmed
        };

        append_audit_entry(
            conn,
            &AuditEntry::new(
                actor.clone(),
                action,
                EntityType::Manifest,
                manifest_id.to_string(),
            ),
        )?;

        info!(
            manifest_id,
            from = from.as_str(),
            to = to.as_str(),
            "Manifest transitioned"
        );
        Ok(())
    })
}

/// Records the final outcome of a pending manifest item.
///
/// # Errors
///
/// Returns `ManifestItemNotFound` or `ManifestItemAlreadyResolved` if no
/// pending item matched.
pub fn record_item_outcome(
    conn: &mut SqliteConnection,
    item_id: i64,
    outcome: &ItemOutcome,
    actor: &Actor,
) -> Result<(), PersistenceError> {
    let now: String = timestamp_now()?;

    conn.immediate_transaction(|conn| {
        let manifest_id: Option<i64> = manifest_items::table
            .filter(manifest_items::item_id.eq(item_id))
            .select(manifest_items::manifest_id)
            .first(conn)
            .optional()?;
        let manifest_id: i64 = manifest_id.ok_or(PersistenceError::ManifestItemNotFound(item_id))?;

        let updated: usize = diesel::update(
            manifest_items::table
                .filter(manifest_items::item_id.eq(item_id))
                .filter(manifest_items::status.eq(ManifestItemStatus::Pending.as_str())),
        )
        .set((
            manifest_items::status.eq(outcome.status().as_str()),
            manifest_items::error_message.eq(outcome.error_message()),
            manifest_items::resolved_at.eq(&now),
        ))
        .execute(conn)?;

        if updated == 0 {
            return Err(PersistenceError::ManifestItemAlreadyResolved(item_id));
        }

        append_audit_entry(
            conn,
            &AuditEntry::new(
                actor.clone(),
                AuditAction::ManifestItemResolved {
                    manifest_id,
                    status: outcome.status(),
                    error_message: outcome.error_message().map(str::to_string),
                },
                EntityType::ManifestItem,
                item_id.to_string(),
            ),
        )?;

        debug!(item_id, status = outcome.status().as_str(), "Manifest item resolved");
        Ok(())
    })
}
