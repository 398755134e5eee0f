// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inserts for the upstream entities this service reads.
//!
//! Orders, invoices, shipments and scanned returns are owned by the
//! surrounding back office. These helpers are its ingestion path into this
//! store and the fixture path for tests.

use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::data_models::{NewInvoice, NewScannedReturn};
use crate::diesel_schema::{companies, invoices, orders, scanned_returns, shipments, stores};
use crate::error::PersistenceError;

/// Inserts a billing company.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_company(
    conn: &mut SqliteConnection,
    company_id: &str,
    name: &str,
    vat_code: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(companies::table)
        .values((
            companies::company_id.eq(company_id),
            companies::name.eq(name),
            companies::vat_code.eq(vat_code),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts a store, optionally owned by a company.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_store(
    conn: &mut SqliteConnection,
    store_id: &str,
    name: &str,
    company_id: Option<&str>,
) -> Result<(), PersistenceError> {
    diesel::insert_into(stores::table)
        .values((
            stores::store_id.eq(store_id),
            stores::name.eq(name),
            stores::company_id.eq(company_id),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts an order.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_order(
    conn: &mut SqliteConnection,
    order_id: &str,
    store_id: Option<&str>,
    status: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(orders::table)
        .values((
            orders::order_id.eq(order_id),
            orders::store_id.eq(store_id),
            orders::status.eq(status),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts an outbound shipment.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_shipment(
    conn: &mut SqliteConnection,
    shipment_id: &str,
    order_id: Option<&str>,
    awb_number: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(shipments::table)
        .values((
            shipments::shipment_id.eq(shipment_id),
            shipments::order_id.eq(order_id),
            shipments::awb_number.eq(awb_number),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts a scanned return.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_scanned_return(
    conn: &mut SqliteConnection,
    scanned_return: &NewScannedReturn,
) -> Result<(), PersistenceError> {
    diesel::insert_into(scanned_returns::table)
        .values((
            scanned_returns::return_id.eq(&scanned_return.return_id),
            scanned_returns::awb_number.eq(&scanned_return.awb_number),
            scanned_returns::status.eq(scanned_return.status.as_str()),
            scanned_returns::order_id.eq(&scanned_return.order_id),
            scanned_returns::original_shipment_id.eq(&scanned_return.original_shipment_id),
            scanned_returns::scanned_at.eq(&scanned_return.scanned_at),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts an invoice.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_invoice(
    conn: &mut SqliteConnection,
    invoice: &NewInvoice,
) -> Result<(), PersistenceError> {
    diesel::insert_into(invoices::table)
        .values((
            invoices::invoice_id.eq(&invoice.invoice_id),
            invoices::order_id.eq(&invoice.order_id),
            invoices::company_id.eq(&invoice.company_id),
            invoices::series.eq(&invoice.series),
            invoices::number.eq(&invoice.number),
            invoices::status.eq(invoice.status.as_str()),
            invoices::payment_status.eq(invoice.payment_status.as_str()),
            invoices::created_at.eq(&invoice.created_at),
        ))
        .execute(conn)?;
    Ok(())
}
