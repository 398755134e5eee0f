// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice claims and final state for guarded operations.
//!
//! A guarded operation first claims the invoice with a conditional update,
//! then calls the external ledger, then either releases the claim (ledger
//! failure) or completes it. Only the claim holder can complete, so two
//! concurrent callers never both reach the ledger.

use diesel::SqliteConnection;
use diesel::prelude::*;
use manifest_guard_audit::AuditEntry;
use manifest_guard_domain::{GuardedOperation, InvoiceStatus, PaymentStatus};
use tracing::{info, warn};

use crate::data_models::{CancelCompletion, CollectCompletion};
use crate::diesel_schema::{invoices, orders};
use crate::error::PersistenceError;
use crate::mutations::audit::append_audit_entry;
use crate::timestamp_now;

/// Claims an invoice for a guarded operation.
///
/// Succeeds only while no other operation holds the invoice and its
/// precondition still holds: issued for both operations, and unpaid for a
/// collection.
///
/// # Errors
///
/// Returns `InvoiceClaimRejected` if no row matched.
pub fn claim_invoice(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    operation: GuardedOperation,
) -> Result<(), PersistenceError> {
    let now: String = timestamp_now()?;
    let target = invoices::table
        .filter(invoices::invoice_id.eq(invoice_id))
        .filter(invoices::pending_operation.is_null())
        .filter(invoices::status.eq(InvoiceStatus::Issued.as_str()));

    let claimed: usize = match operation {
        GuardedOperation::Cancel => diesel::update(target)
            .set((
                invoices::pending_operation.eq(operation.as_str()),
                invoices::pending_since.eq(&now),
            ))
            .execute(conn)?,
        GuardedOperation::Collect => diesel::update(
            target.filter(invoices::payment_status.eq(PaymentStatus::Unpaid.as_str())),
        )
        .set((
            invoices::pending_operation.eq(operation.as_str()),
            invoices::pending_since.eq(&now),
        ))
        .execute(conn)?,
    };

    if claimed == 0 {
        warn!(invoice_id, operation = operation.as_str(), "Invoice claim rejected");
        return Err(PersistenceError::InvoiceClaimRejected {
            invoice_id: invoice_id.to_string(),
        });
    }

    info!(invoice_id, operation = operation.as_str(), "Invoice claimed");
    Ok(())
}

/// Releases a claim taken by `claim_invoice` without changing anything else.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn release_invoice_claim(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    operation: GuardedOperation,
) -> Result<(), PersistenceError> {
    diesel::update(
        invoices::table
            .filter(invoices::invoice_id.eq(invoice_id))
            .filter(invoices::pending_operation.eq(operation.as_str())),
    )
    .set((
        invoices::pending_operation.eq(None::<String>),
        invoices::pending_since.eq(None::<String>),
    ))
    .execute(conn)?;

    info!(invoice_id, operation = operation.as_str(), "Invoice claim released");
    Ok(())
}

/// Releases a claim that outlived the request that took it, recording who
/// released it.
///
/// Only the claim taken at `pending_since` is released; a newer claim on the
/// same invoice is left alone.
///
/// # Returns
///
/// The audit entry id.
///
/// # Errors
///
/// Returns `InvoiceClaimRejected` if the invoice no longer holds that claim.
pub fn release_held_invoice(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    pending_since: &str,
    audit: &AuditEntry,
) -> Result<i64, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let released: usize = diesel::update(
            invoices::table
                .filter(invoices::invoice_id.eq(invoice_id))
                .filter(invoices::pending_operation.is_not_null())
                .filter(invoices::pending_since.eq(pending_since)),
        )
        .set((
            invoices::pending_operation.eq(None::<String>),
            invoices::pending_since.eq(None::<String>),
        ))
        .execute(conn)?;

        if released == 0 {
            return Err(PersistenceError::InvoiceClaimRejected {
                invoice_id: invoice_id.to_string(),
            });
        }

        append_audit_entry(conn, audit)
    })
}

fn update_order_status(
    conn: &mut SqliteConnection,
    order_id: Option<&str>,
    status: &str,
    now: &str,
) -> Result<(), PersistenceError> {
    if let Some(order_id) = order_id {
        diesel::update(orders::table.filter(orders::order_id.eq(order_id)))
            .set((orders::status.eq(status), orders::updated_at.eq(now)))
            .execute(conn)?;
    }
    Ok(())
}

/// Writes the cancelled state, the order status and the audit entry in one
/// transaction.
///
/// # Returns
///
/// The audit entry id.
///
/// # Errors
///
/// Returns `InvoiceClaimRejected` if the caller no longer holds the claim.
pub fn complete_cancel(
    conn: &mut SqliteConnection,
    completion: &CancelCompletion,
    audit: &AuditEntry,
) -> Result<i64, PersistenceError> {
    let now: String = timestamp_now()?;
    let operation: GuardedOperation = GuardedOperation::Cancel;

    conn.immediate_transaction(|conn| {
        let updated: usize = diesel::update(
            invoices::table
                .filter(invoices::invoice_id.eq(&completion.invoice_id))
                .filter(invoices::pending_operation.eq(operation.as_str()))
                .filter(invoices::status.eq(InvoiceStatus::Issued.as_str())),
        )
        .set((
            invoices::status.eq(InvoiceStatus::Cancelled.as_str()),
            invoices::cancelled_at.eq(&now),
            invoices::cancellation_source.eq(completion.source.as_str()),
            invoices::cancelled_from_manifest_id.eq(completion.manifest_id),
            invoices::storno_series.eq(&completion.storno_series),
            invoices::storno_number.eq(&completion.storno_number),
            invoices::pending_operation.eq(None::<String>),
            invoices::pending_since.eq(None::<String>),
        ))
        .execute(conn)?;

        if updated == 0 {
            return Err(PersistenceError::InvoiceClaimRejected {
                invoice_id: completion.invoice_id.clone(),
            });
        }

        update_order_status(
            conn,
            completion.order_id.as_deref(),
            operation.resulting_order_status(),
            &now,
        )?;

        let entry_id: i64 = append_audit_entry(conn, audit)?;
        info!(
            invoice_id = %completion.invoice_id,
            source = %completion.source,
            "Invoice cancelled"
        );
        Ok(entry_id)
    })
}

/// Writes the paid state, the order status and the audit entry in one
/// transaction.
///
/// # Returns
///
/// The audit entry id.
///
/// # Errors
///
/// Returns `InvoiceClaimRejected` if the caller no longer holds the claim.
pub fn complete_collect(
    conn: &mut SqliteConnection,
    completion: &CollectCompletion,
    audit: &AuditEntry,
) -> Result<i64, PersistenceError> {
    let now: String = timestamp_now()?;
    let operation: GuardedOperation = GuardedOperation::Collect;

    conn.immediate_transaction(|conn| {
        let updated: usize = diesel::update(
            invoices::table
                .filter(invoices::invoice_id.eq(&completion.invoice_id))
                .filter(invoices::pending_operation.eq(operation.as_str()))
                .filter(invoices::payment_status.eq(PaymentStatus::Unpaid.as_str())),
        )
        .set((
            invoices::payment_status.eq(PaymentStatus::Paid.as_str()),
            invoices::paid_at.eq(&now),
            invoices::payment_source.eq(completion.source.as_str()),
            invoices::paid_from_manifest_id.eq(completion.manifest_id),
            invoices::collect_type.eq(completion.collect_type.as_str()),
            invoices::pending_operation.eq(None::<String>),
            invoices::pending_since.eq(None::<String>),
        ))
        .execute(conn)?;

        if updated == 0 {
            return Err(PersistenceError::InvoiceClaimRejected {
                invoice_id: completion.invoice_id.clone(),
            });
        }

        update_order_status(
            conn,
            completion.order_id.as_deref(),
            operation.resulting_order_status(),
            &now,
        )?;

        let entry_id: i64 = append_audit_entry(conn, audit)?;
        info!(
            invoice_id = %completion.invoice_id,
            source = %completion.source,
            "Invoice collected"
        );
        Ok(entry_id)
    })
}
