// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice queries and manifest evidence lookup.

use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard::{EvidenceMatch, ManifestEvidence};
use manifest_guard_domain::{
    BillingCompany, CollectType, GuardedOperation, InvoiceStatus, ManifestStatus, ManifestType,
    OperationSource, PaymentStatus,
};
use tracing::debug;

use crate::data_models::{InvoiceContext, InvoiceData};
use crate::diesel_schema::{companies, invoices, manifest_items, manifests, orders, stores};
use crate::error::PersistenceError;

/// Diesel Queryable struct for invoice rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = invoices)]
struct InvoiceRow {
    invoice_id: String,
    order_id: Option<String>,
    company_id: Option<String>,
    series: String,
    number: String,
    status: String,
    payment_status: String,
    created_at: String,
    cancelled_at: Option<String>,
    cancellation_source: Option<String>,
    cancelled_from_manifest_id: Option<i64>,
    storno_series: Option<String>,
    storno_number: Option<String>,
    paid_at: Option<String>,
    payment_source: Option<String>,
    paid_from_manifest_id: Option<i64>,
    collect_type: Option<String>,
    pending_operation: Option<String>,
    pending_since: Option<String>,
}

/// Diesel Queryable struct for company rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = companies)]
struct CompanyRow {
    company_id: String,
    name: String,
    vat_code: String,
}

impl From<CompanyRow> for BillingCompany {
    fn from(row: CompanyRow) -> Self {
        Self {
            company_id: row.company_id,
            name: row.name,
            vat_code: row.vat_code,
        }
    }
}

fn parse_source(value: Option<String>) -> Result<Option<OperationSource>, PersistenceError> {
    value
        .map(|s| OperationSource::from_str(&s))
        .transpose()
        .map_err(Into::into)
}

impl TryFrom<InvoiceRow> for InvoiceData {
    type Error = PersistenceError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: InvoiceStatus::from_str(&row.status)?,
            payment_status: PaymentStatus::from_str(&row.payment_status)?,
            cancellation_source: parse_source(row.cancellation_source)?,
            payment_source: parse_source(row.payment_source)?,
            collect_type: row
                .collect_type
                .map(|s| CollectType::from_str(&s))
                .transpose()?,
            invoice_id: row.invoice_id,
            order_id: row.order_id,
            series: row.series,
            number: row.number,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
            cancelled_from_manifest_id: row.cancelled_from_manifest_id,
            storno_series: row.storno_series,
            storno_number: row.storno_number,
            paid_at: row.paid_at,
            paid_from_manifest_id: row.paid_from_manifest_id,
            pending_operation: row
                .pending_operation
                .map(|s| GuardedOperation::from_str(&s))
                .transpose()?,
            pending_since: row.pending_since,
        })
    }
}

fn load_company(
    conn: &mut SqliteConnection,
    company_id: &str,
) -> Result<Option<BillingCompany>, PersistenceError> {
    let row: Option<CompanyRow> = companies::table
        .filter(companies::company_id.eq(company_id))
        .select(CompanyRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(BillingCompany::from))
}

/// Loads an invoice with its order status and both candidate billing
/// companies.
///
/// # Errors
///
/// Returns `InvoiceNotFound` if the invoice does not exist.
pub fn get_invoice_context(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> Result<InvoiceContext, PersistenceError> {
    debug!(invoice_id, "Loading invoice context");

    let row: InvoiceRow = invoices::table
        .filter(invoices::invoice_id.eq(invoice_id))
        .select(InvoiceRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::InvoiceNotFound(invoice_id.to_string()))?;

    let invoice_company: Option<BillingCompany> = match row.company_id.as_deref() {
        Some(company_id) => load_company(conn, company_id)?,
        None => None,
    };

    let (order_status, store_company): (Option<String>, Option<BillingCompany>) =
        match row.order_id.as_deref() {
            Some(order_id) => {
                let order: Option<(String, Option<String>)> = orders::table
                    .filter(orders::order_id.eq(order_id))
                    .select((orders::status, orders::store_id))
                    .first(conn)
                    .optional()?;
                match order {
                    Some((status, Some(store_id))) => {
                        let company_id: Option<Option<String>> = stores::table
                            .filter(stores::store_id.eq(&store_id))
                            .select(stores::company_id)
                            .first(conn)
                            .optional()?;
                        let company: Option<BillingCompany> = match company_id.flatten() {
                            Some(company_id) => load_company(conn, &company_id)?,
                            None => None,
                        };
                        (Some(status), company)
                    }
                    Some((status, None)) => (Some(status), None),
                    None => (None, None),
                }
            }
            None => (None, None),
        };

    Ok(InvoiceContext {
        invoice: InvoiceData::try_from(row)?,
        order_status,
        invoice_company,
        store_company,
    })
}

fn to_evidence(
    rows: Vec<(i64, String, String)>,
    matched_by: EvidenceMatch,
) -> Result<Vec<ManifestEvidence>, PersistenceError> {
    rows.into_iter()
        .map(|(manifest_id, manifest_type, status)| {
            Ok(ManifestEvidence {
                manifest_id,
                manifest_type: ManifestType::from_str(&manifest_type)?,
                status: ManifestStatus::from_str(&status)?,
                matched_by,
            })
        })
        .collect()
}

/// Finds every manifest whose items reference the invoice, directly or
/// through its order.
///
/// Always reads current state; the guard is never served from a cache.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn find_manifest_evidence(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    order_id: Option<&str>,
) -> Result<Vec<ManifestEvidence>, PersistenceError> {
    let by_invoice: Vec<(i64, String, String)> = manifest_items::table
        .inner_join(manifests::table)
        .filter(manifest_items::invoice_id.eq(invoice_id))
        .select((
            manifests::manifest_id,
            manifests::manifest_type,
            manifests::status,
        ))
        .load(conn)?;

    let mut evidence: Vec<ManifestEvidence> = to_evidence(by_invoice, EvidenceMatch::Invoice)?;

    if let Some(order_id) = order_id {
        let by_order: Vec<(i64, String, String)> = manifest_items::table
            .inner_join(manifests::table)
            .filter(manifest_items::order_id.eq(order_id))
            .select((
                manifests::manifest_id,
                manifests::manifest_type,
                manifests::status,
            ))
            .load(conn)?;
        evidence.extend(to_evidence(by_order, EvidenceMatch::Order)?);
    }

    debug!(
        invoice_id,
        evidence_count = evidence.len(),
        "Loaded manifest evidence"
    );
    Ok(evidence)
}

/// Returns the status of an order, if it exists.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn get_order_status(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<Option<String>, PersistenceError> {
    Ok(orders::table
        .filter(orders::order_id.eq(order_id))
        .select(orders::status)
        .first(conn)
        .optional()?)
}
