// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use manifest_guard_domain::{
    BillingCompany, CollectType, GuardedOperation, InvoiceStatus, ManifestItemStatus, ManifestStatus, ManifestType,
    OperationSource, PaymentStatus, ScannedReturnStatus,
};
use serde::Serialize;

/// An invoice as stored, with its guarded-operation bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceData {
    pub invoice_id: String,
    pub order_id: Option<String>,
    pub series: String,
    pub number: String,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub cancelled_at: Option<String>,
    pub cancellation_source: Option<OperationSource>,
    pub cancelled_from_manifest_id: Option<i64>,
    pub storno_series: Option<String>,
    pub storno_number: Option<String>,
    pub paid_at: Option<String>,
    pub payment_source: Option<OperationSource>,
    pub paid_from_manifest_id: Option<i64>,
    pub collect_type: Option<CollectType>,
    /// Set while a guarded operation holds the invoice.
    pub pending_operation: Option<GuardedOperation>,
    /// RFC 3339 time the current claim was taken.
    pub pending_since: Option<String>,
}

/// An invoice loaded together with everything a guarded operation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceContext {
    pub invoice: InvoiceData,
    /// Current status of the invoice's order, if it has one.
    pub order_status: Option<String>,
    /// Company recorded directly on the invoice.
    pub invoice_company: Option<BillingCompany>,
    /// Company of the store the order was placed in.
    pub store_company: Option<BillingCompany>,
}

/// A manifest header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestData {
    pub manifest_id: i64,
    pub manifest_type: ManifestType,
    pub status: ManifestStatus,
    pub document_date: String,
    pub created_by: String,
    pub created_at: String,
    pub confirmed_at: Option<String>,
    pub confirmed_by: Option<String>,
    pub processed_at: Option<String>,
    pub processed_by: Option<String>,
}

/// One item of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestItemData {
    pub item_id: i64,
    pub manifest_id: i64,
    pub awb_number: String,
    pub original_awb_number: Option<String>,
    pub order_id: Option<String>,
    pub invoice_id: Option<String>,
    pub status: ManifestItemStatus,
    pub error_message: Option<String>,
    pub resolved_at: Option<String>,
}

/// A manifest with all of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestDetail {
    pub manifest: ManifestData,
    pub items: Vec<ManifestItemData>,
}

/// Result of a return manifest generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A draft manifest was written.
    Created {
        /// The new manifest id.
        manifest_id: i64,
        /// Number of items written.
        item_count: usize,
    },
    /// No eligible return was left after exclusion.
    NothingNew,
}

/// An item of a delivery manifest, as supplied by the dispatch side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewManifestItem {
    pub awb_number: String,
    pub original_awb_number: Option<String>,
    pub order_id: Option<String>,
    pub invoice_id: Option<String>,
}

/// The stored override credential.
///
/// `Debug` is not derived so the hash never reaches a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCredentialData {
    pub pin_hash: String,
    pub updated_by: String,
    pub updated_at: String,
    pub failed_attempts: u32,
    pub locked_until: Option<String>,
}

impl std::fmt::Debug for PinCredentialData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinCredentialData")
            .field("updated_by", &self.updated_by)
            .field("updated_at", &self.updated_at)
            .field("failed_attempts", &self.failed_attempts)
            .field("locked_until", &self.locked_until)
            .finish_non_exhaustive()
    }
}

/// Failure counter after a rejected PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinAttemptState {
    /// Consecutive failures including the one just recorded.
    pub failed_attempts: u32,
    /// Set when this failure started a lockout.
    pub locked_until: Option<String>,
}

/// Final state written when a cancel succeeds at the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelCompletion {
    pub invoice_id: String,
    pub order_id: Option<String>,
    pub source: OperationSource,
    /// The proving manifest. Always `None` for overrides.
    pub manifest_id: Option<i64>,
    pub storno_series: Option<String>,
    pub storno_number: Option<String>,
}

/// Final state written when a collection succeeds at the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectCompletion {
    pub invoice_id: String,
    pub order_id: Option<String>,
    pub source: OperationSource,
    pub manifest_id: Option<i64>,
    pub collect_type: CollectType,
}

/// Seed data for an invoice issued upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub invoice_id: String,
    pub order_id: Option<String>,
    pub company_id: Option<String>,
    pub series: String,
    pub number: String,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub created_at: String,
}

/// Seed data for a return parcel scanned at the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScannedReturn {
    pub return_id: String,
    pub awb_number: String,
    pub status: ScannedReturnStatus,
    pub order_id: Option<String>,
    pub original_shipment_id: Option<String>,
    pub scanned_at: String,
}
