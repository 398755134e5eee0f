// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operation guard service.
//!
//! Reads the current manifest evidence for an invoice and asks the core
//! decision function whether a manifest already proves the operation.

use manifest_guard::{GuardDecision, ManifestEvidence};
use manifest_guard_domain::GuardedOperation;
use manifest_guard_persistence::{InvoiceContext, Persistence};
use tracing::debug;

use crate::error::{ApiError, translate_persistence_error};
use crate::request_response::GuardCheckResponse;

/// Decides an operation for an already loaded invoice.
///
/// # Errors
///
/// Returns an error if the evidence cannot be read.
pub(crate) fn evaluate_guard(
    persistence: &mut Persistence,
    context: &InvoiceContext,
    operation: GuardedOperation,
) -> Result<GuardDecision, ApiError> {
    let evidence: Vec<ManifestEvidence> = persistence
        .find_manifest_evidence(
            &context.invoice.invoice_id,
            context.invoice.order_id.as_deref(),
        )
        .map_err(translate_persistence_error)?;

    let decision: GuardDecision = manifest_guard::decide(operation, &evidence);
    debug!(
        invoice_id = %context.invoice.invoice_id,
        operation = operation.as_str(),
        allowed = decision.is_allowed(),
        "Guard evaluated"
    );
    Ok(decision)
}

/// Checks whether a manifest proves `operation` for the invoice.
///
/// # Errors
///
/// Returns `NotFound` if the invoice does not exist.
pub fn check_guard(
    persistence: &mut Persistence,
    invoice_id: &str,
    operation: GuardedOperation,
) -> Result<GuardCheckResponse, ApiError> {
    let context: InvoiceContext = persistence
        .get_invoice_context(invoice_id)
        .map_err(translate_persistence_error)?;
    Ok(evaluate_guard(persistence, &context, operation)?.into())
}

/// Checks whether a confirmed return manifest allows cancelling the invoice.
///
/// # Errors
///
/// Returns `NotFound` if the invoice does not exist.
pub fn can_cancel(
    persistence: &mut Persistence,
    invoice_id: &str,
) -> Result<GuardCheckResponse, ApiError> {
    check_guard(persistence, invoice_id, GuardedOperation::Cancel)
}

/// Checks whether a confirmed delivery manifest allows marking the invoice
/// as paid.
///
/// # Errors
///
/// Returns `NotFound` if the invoice does not exist.
pub fn can_mark_paid(
    persistence: &mut Persistence,
    invoice_id: &str,
) -> Result<GuardCheckResponse, ApiError> {
    check_guard(persistence, invoice_id, GuardedOperation::Collect)
}
