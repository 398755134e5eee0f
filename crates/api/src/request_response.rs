// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Field names are camelCase on the wire.

use manifest_guard::GuardDecision;
use manifest_guard_audit::{AuditAction, AuditEntry, EntityType};
use manifest_guard_domain::{
    CollectType, GuardedOperation, ManifestItemStatus, ManifestStatus, ManifestType,
    OperationSource,
};
use manifest_guard_persistence::{ManifestData, ManifestDetail, ManifestItemData};
use serde::{Deserialize, Serialize};

/// API request to cancel an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelInvoiceRequest {
    /// Override PIN, needed only when no confirmed return manifest exists.
    #[serde(default)]
    pub pin: Option<String>,
    /// Free-text justification recorded on the audit entry.
    #[serde(default)]
    pub reason: Option<String>,
}

/// API request to mark an invoice as collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectInvoiceRequest {
    /// Override PIN, needed only when no confirmed delivery manifest exists.
    #[serde(default)]
    pub pin: Option<String>,
    /// Free-text justification recorded on the audit entry.
    #[serde(default)]
    pub reason: Option<String>,
    /// Defaults to cash on delivery.
    #[serde(default)]
    pub collect_type: Option<CollectType>,
}

/// API response for a guarded operation that reached the ledger and
/// completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardedOperationResponse {
    pub success: bool,
    pub invoice_id: String,
    /// What authorised the operation.
    pub source: OperationSource,
    /// The manifest that proved the operation. Never set for overrides.
    pub manifest_id: Option<i64>,
    /// The draft manifest that referenced the invoice during an override.
    pub draft_manifest_id: Option<i64>,
    pub storno_series: Option<String>,
    pub storno_number: Option<String>,
    pub audit_entry_id: i64,
}

/// API request to release an invoice left claimed by an interrupted
/// operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseClaimRequest {
    /// What was checked at the provider before releasing.
    pub reason: String,
}

/// API response after a held claim was released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseClaimResponse {
    pub invoice_id: String,
    /// The operation that held the invoice.
    pub released_operation: GuardedOperation,
    pub pending_since: String,
    pub audit_entry_id: i64,
}

/// API response for a guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardCheckResponse {
    pub allowed: bool,
    /// `manifest` when allowed.
    pub source: Option<OperationSource>,
    pub requires_override: bool,
    pub reason: Option<String>,
    /// The proving manifest when allowed.
    pub manifest_id: Option<i64>,
    /// The draft manifest referencing the invoice when not allowed.
    pub draft_manifest_id: Option<i64>,
}

impl From<GuardDecision> for GuardCheckResponse {
    fn from(decision: GuardDecision) -> Self {
        match decision {
            GuardDecision::Allowed { manifest_id } => Self {
                allowed: true,
                source: Some(OperationSource::Manifest),
                requires_override: false,
                reason: None,
                manifest_id: Some(manifest_id),
                draft_manifest_id: None,
            },
            GuardDecision::RequiresOverride {
                reason,
                draft_manifest_id,
            } => Self {
                allowed: false,
                source: None,
                requires_override: true,
                reason: Some(reason),
                manifest_id: None,
                draft_manifest_id,
            },
        }
    }
}

/// API request to generate a return manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReturnManifestRequest {
    /// `YYYY-MM-DD`; today when absent.
    #[serde(default)]
    pub document_date: Option<String>,
    /// Restrict the run to these scanned returns.
    #[serde(default)]
    pub return_ids: Option<Vec<String>>,
}

/// API response for a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReturnManifestResponse {
    /// False when no eligible return was left.
    pub created: bool,
    pub manifest_id: Option<i64>,
    pub item_count: usize,
    pub message: String,
}

/// One parcel of a delivery manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryItemRequest {
    pub awb_number: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

/// API request to create a delivery manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryManifestRequest {
    /// `YYYY-MM-DD`; today when absent.
    #[serde(default)]
    pub document_date: Option<String>,
    pub items: Vec<DeliveryItemRequest>,
}

/// API response for a created delivery manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryManifestResponse {
    pub manifest_id: i64,
    pub item_count: usize,
}

/// A manifest header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResponse {
    pub manifest_id: i64,
    #[serde(rename = "type")]
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

impl From<ManifestData> for ManifestResponse {
    fn from(data: ManifestData) -> Self {
        Self {
            manifest_id: data.manifest_id,
            manifest_type: data.manifest_type,
            status: data.status,
            document_date: data.document_date,
            created_by: data.created_by,
            created_at: data.created_at,
            confirmed_at: data.confirmed_at,
            confirmed_by: data.confirmed_by,
            processed_at: data.processed_at,
            processed_by: data.processed_by,
        }
    }
}

/// A manifest item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestItemResponse {
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

impl From<ManifestItemData> for ManifestItemResponse {
    fn from(data: ManifestItemData) -> Self {
        Self {
            item_id: data.item_id,
            manifest_id: data.manifest_id,
            awb_number: data.awb_number,
            original_awb_number: data.original_awb_number,
            order_id: data.order_id,
            invoice_id: data.invoice_id,
            status: data.status,
            error_message: data.error_message,
            resolved_at: data.resolved_at,
        }
    }
}

/// A manifest with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDetailResponse {
    pub manifest: ManifestResponse,
    pub items: Vec<ManifestItemResponse>,
}

impl From<ManifestDetail> for ManifestDetailResponse {
    fn from(detail: ManifestDetail) -> Self {
        Self {
            manifest: detail.manifest.into(),
            items: detail.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// API request to record a manifest item's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordItemOutcomeRequest {
    /// `PROCESSED` or `ERROR`.
    pub status: String,
    /// Required for `ERROR`.
    #[serde(default)]
    pub error_message: Option<String>,
}

/// API request to set or replace the override PIN.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPinRequest {
    pub new_pin: String,
    /// Required when a PIN is already configured.
    #[serde(default)]
    pub current_pin: Option<String>,
}

impl std::fmt::Debug for SetPinRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetPinRequest")
            .field("current_pin_supplied", &self.current_pin.is_some())
            .finish_non_exhaustive()
    }
}

/// API response for a PIN change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPinResponse {
    pub configured: bool,
    pub updated_by: String,
    pub message: String,
}

/// API response describing the override PIN without revealing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinStatusResponse {
    pub configured: bool,
    pub updated_by: Option<String>,
    pub updated_at: Option<String>,
    /// Set while a lockout is in force.
    pub locked_until: Option<String>,
}

/// An audit entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryResponse {
    pub entry_id: Option<i64>,
    pub actor_id: String,
    pub actor_type: String,
    /// The action name.
    pub action: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub source: Option<OperationSource>,
    pub manifest_id: Option<i64>,
    /// The action's metadata.
    pub details: AuditAction,
    pub created_at: Option<String>,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            actor_id: entry.actor.id,
            actor_type: entry.actor.actor_type,
            action: entry.action.name().to_string(),
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            source: entry.action.source(),
            manifest_id: entry.action.manifest_id(),
            details: entry.action,
            created_at: entry.created_at,
        }
    }
}
