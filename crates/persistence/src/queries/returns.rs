// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inputs for return manifest generation.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard::{OriginalShipment, ScannedReturnRecord};
use manifest_guard_domain::{InvoiceStatus, ScannedReturnStatus};

use crate::diesel_schema::{invoices, scanned_returns, shipments};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = scanned_returns)]
struct ScannedReturnRow {
    return_id: String,
    awb_number: String,
    status: String,
    order_id: Option<String>,
    original_shipment_id: Option<String>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = shipments)]
struct ShipmentRow {
    shipment_id: String,
    order_id: Option<String>,
    awb_number: String,
}

/// Loads the scanned returns that are physically at the warehouse, in scan
/// order, with their original shipments attached.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `return_ids` - Restrict to these scanned returns when given
///
/// # Errors
///
/// Returns an error if the database cannot be queried or a stored status is
/// not recognised.
pub fn load_return_candidates(
    conn: &mut SqliteConnection,
    return_ids: Option<&[String]>,
) -> Result<Vec<ScannedReturnRecord>, PersistenceError> {
    let received: Vec<&str> = ScannedReturnStatus::RECEIVED_AT_WAREHOUSE
        .iter()
        .map(ScannedReturnStatus::as_str)
        .collect();

    let mut query = scanned_returns::table
        .select(ScannedReturnRow::as_select())
        .filter(scanned_returns::status.eq_any(received))
        .order((
            scanned_returns::scanned_at.asc(),
            scanned_returns::return_id.asc(),
        ))
        .into_boxed();

    if let Some(ids) = return_ids {
        query = query.filter(scanned_returns::return_id.eq_any(ids.to_vec()));
    }

    let rows: Vec<ScannedReturnRow> = query.load(conn)?;

    let shipment_ids: Vec<String> = rows
        .iter()
        .filter_map(|row| row.original_shipment_id.clone())
        .collect();

    let shipments_by_id: HashMap<String, OriginalShipment> = shipments::table
        .filter(shipments::shipment_id.eq_any(shipment_ids))
        .select(ShipmentRow::as_select())
        .load::<ShipmentRow>(conn)?
        .into_iter()
        .map(|row| {
            (
                row.shipment_id.clone(),
                OriginalShipment {
                    shipment_id: row.shipment_id,
                    awb_number: row.awb_number,
                    order_id: row.order_id,
                },
            )
        })
        .collect();

    rows.into_iter()
        .map(|row| {
            let original_shipment: Option<OriginalShipment> = row
                .original_shipment_id
                .as_deref()
                .and_then(|id| shipments_by_id.get(id).cloned());
            Ok(ScannedReturnRecord {
                status: ScannedReturnStatus::from_str(&row.status)?,
                return_id: row.return_id,
                awb_number: row.awb_number,
                direct_order_id: row.order_id,
                original_shipment,
            })
        })
        .collect()
}

/// Returns the most recently created issued invoice for each order.
///
/// Orders without an issued invoice are absent from the map.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn latest_issued_invoices(
    conn: &mut SqliteConnection,
    order_ids: &BTreeSet<String>,
) -> Result<HashMap<String, String>, PersistenceError> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Option<String>, String)> = invoices::table
        .filter(invoices::order_id.eq_any(order_ids.iter().cloned().collect::<Vec<String>>()))
        .filter(invoices::status.eq(InvoiceStatus::Issued.as_str()))
        .order((invoices::created_at.desc(), invoices::invoice_id.desc()))
        .select((invoices::order_id, invoices::invoice_id))
        .load(conn)?;

    let mut latest: HashMap<String, String> = HashMap::new();
    for (order_id, invoice_id) in rows {
        if let Some(order_id) = order_id {
            latest.entry(order_id).or_insert(invoice_id);
        }
    }
    Ok(latest)
}
