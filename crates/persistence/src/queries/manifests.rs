// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Manifest and manifest item queries.

use std::collections::HashSet;
use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard_domain::{ManifestItemStatus, ManifestStatus, ManifestType};
use tracing::debug;

use crate::data_models::{ManifestData, ManifestDetail, ManifestItemData};
use crate::diesel_schema::{manifest_items, manifests};
use crate::error::PersistenceError;

/// Diesel Queryable struct for manifest rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = manifests)]
struct ManifestRow {
    manifest_id: i64,
    manifest_type: String,
    status: String,
    document_date: String,
    created_by: String,
    created_at: String,
    confirmed_at: Option<String>,
    confirmed_by: Option<String>,
    processed_at: Option<String>,
    processed_by: Option<String>,
}

impl TryFrom<ManifestRow> for ManifestData {
    type Error = PersistenceError;

    fn try_from(row: ManifestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            manifest_id: row.manifest_id,
            manifest_type: ManifestType::from_str(&row.manifest_type)?,
            status: ManifestStatus::from_str(&row.status)?,
            document_date: row.document_date,
            created_by: row.created_by,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            confirmed_by: row.confirmed_by,
            processed_at: row.processed_at,
            processed_by: row.processed_by,
        })
    }
}

/// Diesel Queryable struct for manifest item rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = manifest_items)]
struct ManifestItemRow {
    item_id: i64,
    manifest_id: i64,
    awb_number: String,
    original_awb_number: Option<String>,
    order_id: Option<String>,
    invoice_id: Option<String>,
    status: String,
    error_message: Option<String>,
    resolved_at: Option<String>,
}

impl TryFrom<ManifestItemRow> for ManifestItemData {
    type Error = PersistenceError;

    fn try_from(row: ManifestItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            item_id: row.item_id,
            manifest_id: row.manifest_id,
            awb_number: row.awb_number,
            original_awb_number: row.original_awb_number,
            order_id: row.order_id,
            invoice_id: row.invoice_id,
            status: ManifestItemStatus::from_str(&row.status)?,
            error_message: row.error_message,
            resolved_at: row.resolved_at,
        })
    }
}

/// Retrieves a manifest header.
///
/// # Errors
///
/// Returns `ManifestNotFound` if no manifest has this id.
pub fn get_manifest(
    conn: &mut SqliteConnection,
    manifest_id: i64,
) -> Result<ManifestData, PersistenceError> {
    let row: ManifestRow = manifests::table
        .filter(manifests::manifest_id.eq(manifest_id))
        .select(ManifestRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(PersistenceError::ManifestNotFound(manifest_id))?;
    ManifestData::try_from(row)
}

/// Retrieves a manifest with its items in insertion order.
///
/// # Errors
///
/// Returns `ManifestNotFound` if no manifest has this id.
pub fn get_manifest_detail(
    conn: &mut SqliteConnection,
    manifest_id: i64,
) -> Result<ManifestDetail, PersistenceError> {
    let manifest: ManifestData = get_manifest(conn, manifest_id)?;

    let items: Vec<ManifestItemData> = manifest_items::table
        .filter(manifest_items::manifest_id.eq(manifest_id))
        .order(manifest_items::item_id.asc())
        .select(ManifestItemRow::as_select())
        .load::<ManifestItemRow>(conn)?
        .into_iter()
        .map(ManifestItemData::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(manifest_id, item_count = items.len(), "Loaded manifest");
    Ok(ManifestDetail { manifest, items })
}

/// Lists manifest headers, newest first, optionally filtered.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn list_manifests(
    conn: &mut SqliteConnection,
    manifest_type: Option<ManifestType>,
    status: Option<ManifestStatus>,
) -> Result<Vec<ManifestData>, PersistenceError> {
    let mut query = manifests::table
        .select(ManifestRow::as_select())
        .order(manifests::manifest_id.desc())
        .into_boxed();

    if let Some(manifest_type) = manifest_type {
        query = query.filter(manifests::manifest_type.eq(manifest_type.as_str()));
    }
    if let Some(status) = status {
        query = query.filter(manifests::status.eq(status.as_str()));
    }

    query
        .load::<ManifestRow>(conn)?
        .into_iter()
        .map(ManifestData::try_from)
        .collect()
}

/// Retrieves a single manifest item.
///
/// # Errors
///
/// Returns `ManifestItemNotFound` if no item has this id.
pub fn get_manifest_item(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> Result<ManifestItemData, PersistenceError> {
    let row: ManifestItemRow = manifest_items::table
        .filter(manifest_items::item_id.eq(item_id))
        .select(ManifestItemRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(PersistenceError::ManifestItemNotFound(item_id))?;
    ManifestItemData::try_from(row)
}

/// Collects every AWB number held by an item of a non-processed manifest of
/// the given type.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn open_manifest_awbs(
    conn: &mut SqliteConnection,
    manifest_type: ManifestType,
) -> Result<HashSet<String>, PersistenceError> {
    let awbs: Vec<String> = manifest_items::table
        .inner_join(manifests::table)
        .filter(manifests::manifest_type.eq(manifest_type.as_str()))
        .filter(manifests::status.ne(ManifestStatus::Processed.as_str()))
        .select(manifest_items::awb_number)
        .load(conn)?;
    Ok(awbs.into_iter().collect())
}
