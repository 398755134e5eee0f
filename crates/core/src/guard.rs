// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The operation guard.
//!
//! A guarded operation is allowed outright only when a manifest of the
//! matching type, confirmed or processed, references the invoice. Everything
//! else needs the supervisor override.

use manifest_guard_domain::{GuardedOperation, ManifestStatus, ManifestType};
use serde::Serialize;

/// How a manifest item was linked to the invoice being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMatch {
    /// The item references the invoice's order.
    Order,
    /// The item references the invoice itself.
    Invoice,
}

/// One manifest membership found for an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEvidence {
    /// The manifest id.
    pub manifest_id: i64,
    /// The manifest type.
    pub manifest_type: ManifestType,
    /// The manifest status at read time.
    pub status: ManifestStatus,
    /// How the item was linked.
    pub matched_by: EvidenceMatch,
}

/// The guard's verdict for one invoice and operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// A manifest proves the physical event.
    Allowed {
        /// The proving manifest.
        manifest_id: i64,
    },
    /// No proof; the supervisor override is required.
    RequiresOverride {
        /// Human-readable explanation for the operator.
        reason: String,
        /// A draft manifest that references the invoice but is unconfirmed.
        draft_manifest_id: Option<i64>,
    },
}

impl GuardDecision {
    /// Returns true if the operation may proceed without an override.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

fn manifest_noun(manifest_type: ManifestType) -> &'static str {
    match manifest_type {
        ManifestType::Return => "return",
        ManifestType::Delivery => "delivery",
    }
}

/// Decides whether `operation` is proven by the given manifest memberships.
///
/// Evidence of the wrong manifest type is ignored. Among proving manifests a
/// direct invoice match is preferred over an order match, then the newest
/// manifest wins.
#[must_use]
pub fn decide(operation: GuardedOperation, evidence: &[ManifestEvidence]) -> GuardDecision {
    let wanted: ManifestType = operation.evidence_type();
    let relevant = evidence.iter().filter(|e| e.manifest_type == wanted);

    let proving: Option<&ManifestEvidence> = relevant
        .clone()
        .filter(|e| e.status.proves_evidence())
        .max_by_key(|e| (e.matched_by, e.manifest_id));

    if let Some(found) = proving {
        return GuardDecision::Allowed {
            manifest_id: found.manifest_id,
        };
    }

    let noun: &str = manifest_noun(wanted);
    let draft: Option<i64> = relevant
        .filter(|e| e.status == ManifestStatus::Draft)
        .map(|e| e.manifest_id)
        .max();

    let reason: String = draft.map_or_else(
        || format!("No confirmed {noun} manifest references this invoice"),
        |manifest_id| {
            format!(
                "Invoice is on {noun} manifest #{manifest_id}, which has not been confirmed yet"
            )
        },
    );

    GuardDecision::RequiresOverride {
        reason,
        draft_manifest_id: draft,
    }
}
