// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use manifest_guard_domain::{
    CollectType, GuardedOperation, ManifestItemStatus, ManifestType, OperationSource,
};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Represents the entity performing an action.
///
/// An actor is either a back-office user or an automated process such as the
/// nightly manifest generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "user", "system", "scheduler").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// Creates an actor for a back-office user.
    #[must_use]
    pub fn user(id: &str) -> Self {
        Self::new(id.to_string(), String::from("user"))
    }
}

/// The kind of entity an audit entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// An invoice.
    Invoice,
    /// A manifest.
    Manifest,
    /// A single manifest item.
    ManifestItem,
    /// The organisation-wide override PIN.
    OverridePin,
}

impl EntityType {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Manifest => "manifest",
            Self::ManifestItem => "manifest_item",
            Self::OverridePin => "override_pin",
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(Self::Invoice),
            "manifest" => Ok(Self::Manifest),
            "manifest_item" => Ok(Self::ManifestItem),
            "override_pin" => Ok(Self::OverridePin),
            _ => Err(format!("Unknown entity type: '{s}'")),
        }
    }
}

/// What happened, with the metadata specific to that kind of action.
///
/// Each variant carries exactly the fields recorded for that action, so the
/// stored metadata is checked at compile time rather than assembled as a
/// free-form map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditAction {
    /// Invoice reversed on the strength of a confirmed return manifest.
    CancelViaManifest {
        /// Series of the cancelled invoice.
        series: String,
        /// Number of the cancelled invoice.
        number: String,
        /// Series of the storno document, if the provider returned one.
        storno_series: Option<String>,
        /// Number of the storno document, if the provider returned one.
        storno_number: Option<String>,
        /// The manifest that proved the return.
        manifest_id: i64,
        /// Free-text reason supplied by the operator.
        reason: Option<String>,
    },
    /// Invoice reversed with the supervisor override PIN.
    CancelViaOverride {
        /// Series of the cancelled invoice.
        series: String,
        /// Number of the cancelled invoice.
        number: String,
        /// Series of the storno document, if the provider returned one.
        storno_series: Option<String>,
        /// Number of the storno document, if the provider returned one.
        storno_number: Option<String>,
        /// Draft manifest that referenced the invoice at decision time, if any.
        draft_manifest_id: Option<i64>,
        /// Free-text reason supplied by the operator.
        reason: Option<String>,
    },
    /// Invoice collected on the strength of a confirmed delivery manifest.
    CollectViaManifest {
        /// Series of the collected invoice.
        series: String,
        /// Number of the collected invoice.
        number: String,
        /// How the money was collected.
        collect_type: CollectType,
        /// The manifest that proved the delivery.
        manifest_id: i64,
        /// Free-text reason supplied by the operator.
        reason: Option<String>,
    },
    /// Invoice collected with the supervisor override PIN.
    CollectViaOverride {
        /// Series of the collected invoice.
        series: String,
        /// Number of the collected invoice.
        number: String,
        /// How the money was collected.
        collect_type: CollectType,
        /// Draft manifest that referenced the invoice at decision time, if any.
        draft_manifest_id: Option<i64>,
        /// Free-text reason supplied by the operator.
        reason: Option<String>,
    },
    /// An override PIN matched but the operation stopped before the ledger
    /// call, so no other entry records the accepted PIN.
    OverrideAccepted {
        /// The operation that was attempted.
        operation: GuardedOperation,
        /// Free-text reason supplied by the operator.
        reason: Option<String>,
        /// Draft manifest that referenced the invoice at decision time, if any.
        draft_manifest_id: Option<i64>,
    },
    /// An override PIN was supplied and did not match.
    OverrideRejected {
        /// The operation that was attempted.
        operation: GuardedOperation,
        /// Free-text reason supplied by the operator.
        reason: Option<String>,
        /// Consecutive failures including this one.
        failed_attempts: u32,
        /// Set when this failure triggered a lockout.
        locked_until: Option<String>,
    },
    /// An override was attempted while the PIN was locked.
    OverrideLockedOut {
        /// The operation that was attempted.
        operation: GuardedOperation,
        /// When the lockout ends.
        locked_until: String,
    },
    /// The invoicing provider refused or failed the ledger call.
    LedgerCallFailed {
        /// The operation that was attempted.
        operation: GuardedOperation,
        /// What authorised the attempt.
        source: OperationSource,
        /// The provider's message.
        message: String,
    },
    /// The provider accepted the ledger call but its answer could not be
    /// read. The invoice stays claimed until someone reconciles it.
    LedgerOutcomeUnknown {
        /// The operation that was attempted.
        operation: GuardedOperation,
        /// What authorised the attempt.
        source: OperationSource,
        /// What went wrong reading the answer.
        message: String,
    },
    /// A supervisor released a claim left behind by an interrupted operation.
    InvoiceClaimReleased {
        /// The operation that held the invoice.
        operation: GuardedOperation,
        /// When the claim was taken.
        pending_since: String,
        /// Why the claim was released.
        reason: String,
    },
    /// The override PIN was set or replaced.
    OverridePinChanged {
        /// True when no PIN existed before.
        initial: bool,
    },
    /// A PIN change was refused because the current PIN did not match.
    OverridePinChangeRejected {
        /// Consecutive failures including this one.
        failed_attempts: u32,
    },
    /// A manifest was generated.
    ManifestGenerated {
        /// The manifest type.
        manifest_type: ManifestType,
        /// Number of items created.
        item_count: usize,
        /// The manifest document date.
        document_date: String,
    },
    /// A manifest was confirmed.
    ManifestConfirmed,
    /// A manifest was processed and released its AWB claims.
    ManifestProcessed {
        /// Number of AWB claims released.
        released_claims: usize,
    },
    /// A manifest item reached a final state.
    ManifestItemResolved {
        /// The owning manifest.
        manifest_id: i64,
        /// The new item status.
        status: ManifestItemStatus,
        /// Failure description for `ERROR`.
        error_message: Option<String>,
    },
}

impl AuditAction {
    /// Returns the action name stored alongside the metadata.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CancelViaManifest { .. } => "cancel_via_manifest",
            Self::CancelViaOverride { .. } => "cancel_via_override",
            Self::CollectViaManifest { .. } => "collect_via_manifest",
            Self::CollectViaOverride { .. } => "collect_via_override",
            Self::OverrideAccepted { .. } => "override_accepted",
            Self::OverrideRejected { .. } => "override_rejected",
            Self::OverrideLockedOut { .. } => "override_locked_out",
            Self::LedgerCallFailed { .. } => "ledger_call_failed",
            Self::LedgerOutcomeUnknown { .. } => "ledger_outcome_unknown",
            Self::InvoiceClaimReleased { .. } => "invoice_claim_released",
            Self::OverridePinChanged { .. } => "override_pin_changed",
            Self::OverridePinChangeRejected { .. } => "override_pin_change_rejected",
            Self::ManifestGenerated { .. } => "manifest_generated",
            Self::ManifestConfirmed => "manifest_confirmed",
            Self::ManifestProcessed { .. } => "manifest_processed",
            Self::ManifestItemResolved { .. } => "manifest_item_resolved",
        }
    }

    /// The authorisation source recorded by a successful guarded operation.
    #[must_use]
    pub const fn source(&self) -> Option<OperationSource> {
        match self {
            Self::CancelViaManifest { .. } | Self::CollectViaManifest { .. } => {
                Some(OperationSource::Manifest)
            }
            Self::CancelViaOverride { .. }
            | Self::CollectViaOverride { .. }
            | Self::OverrideAccepted { .. } => Some(OperationSource::PinOverride),
            Self::LedgerCallFailed { source, .. } | Self::LedgerOutcomeUnknown { source, .. } => {
                Some(*source)
            }
            _ => None,
        }
    }

    /// The manifest id the action relied on, if any.
    #[must_use]
    pub const fn manifest_id(&self) -> Option<i64> {
        match self {
            Self::CancelViaManifest { manifest_id, .. }
            | Self::CollectViaManifest { manifest_id, .. }
            | Self::ManifestItemResolved { manifest_id, .. } => Some(*manifest_id),
            Self::CancelViaOverride {
                draft_manifest_id, ..
            }
            | Self::CollectViaOverride {
                draft_manifest_id, ..
            }
            | Self::OverrideAccepted {
                draft_manifest_id, ..
            } => *draft_manifest_id,
            _ => None,
        }
    }
}

/// An immutable audit entry.
///
/// Every guarded decision outcome, success or denial, produces exactly one
/// entry. Entries are never updated or deleted once persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// The persisted id, `None` before the entry is written.
    pub entry_id: Option<i64>,
    /// Who performed the action.
    pub actor: Actor,
    /// What was done, with its metadata.
    pub action: AuditAction,
    /// The kind of entity affected.
    pub entity_type: EntityType,
    /// The affected entity's identifier.
    pub entity_id: String,
    /// RFC 3339 timestamp assigned at persistence time.
    pub created_at: Option<String>,
}

impl AuditEntry {
    /// Creates a new, not yet persisted, audit entry.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `action` - The action and its metadata
    /// * `entity_type` - The kind of entity affected
    /// * `entity_id` - The affected entity's identifier
    #[must_use]
    pub const fn new(
        actor: Actor,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: String,
    ) -> Self {
        Self {
            entry_id: None,
            actor,
            action,
            entity_type,
            entity_id,
            created_at: None,
        }
    }
}
