// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Return manifest planning.
//!
//! Given the scanned returns currently at the warehouse, the AWB numbers
//! already claimed by open return manifests and the latest issued invoice per
//! order, this module decides which items a new return manifest contains.

use std::collections::{BTreeSet, HashMap, HashSet};

use manifest_guard_domain::{ManifestType, ScannedReturnStatus};
use serde::Serialize;
use time::Date;

/// The outbound shipment a return parcel belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalShipment {
    /// The shipment identifier.
    pub shipment_id: String,
    /// The outbound AWB number.
    pub awb_number: String,
    /// The order the shipment was sent for.
    pub order_id: Option<String>,
}

/// A scanned return as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedReturnRecord {
    /// The scanned return identifier.
    pub return_id: String,
    /// The return parcel's own AWB number.
    pub awb_number: String,
    /// The intake status.
    pub status: ScannedReturnStatus,
    /// Order linked directly on the return record, if any.
    pub direct_order_id: Option<String>,
    /// The original outbound shipment, if recorded.
    pub original_shipment: Option<OriginalShipment>,
}

/// A scanned return with its order resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReturn {
    /// The scanned return identifier.
    pub return_id: String,
    /// The return parcel's own AWB number.
    pub awb_number: String,
    /// The original outbound AWB number, if known.
    pub original_awb_number: Option<String>,
    /// The resolved order.
    pub order_id: Option<String>,
}

/// Resolves the order a scanned return belongs to.
///
/// A direct order link on the return record wins over the order reached
/// through the original shipment; the direct link is recorded at intake by
/// the operator holding the parcel.
#[must_use]
pub fn resolve_return(record: &ScannedReturnRecord) -> ResolvedReturn {
    let shipment_order: Option<&String> = record
        .original_shipment
        .as_ref()
        .and_then(|shipment| shipment.order_id.as_ref());

    ResolvedReturn {
        return_id: record.return_id.clone(),
        awb_number: record.awb_number.clone(),
        original_awb_number: record
            .original_shipment
            .as_ref()
            .map(|shipment| shipment.awb_number.clone()),
        order_id: record.direct_order_id.clone().or_else(|| shipment_order.cloned()),
    }
}

/// Collects the distinct orders whose latest issued invoice must be looked up.
#[must_use]
pub fn orders_to_resolve(records: &[ScannedReturnRecord]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| resolve_return(record).order_id)
        .collect()
}

/// One item of a planned manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestItemPlan {
    /// The parcel's AWB number.
    pub awb_number: String,
    /// The original outbound AWB number, if known.
    pub original_awb_number: Option<String>,
    /// The order the parcel belongs to.
    pub order_id: Option<String>,
    /// The invoice the parcel is evidence for.
    pub invoice_id: Option<String>,
}

/// A manifest ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPlan {
    /// The manifest type.
    pub manifest_type: ManifestType,
    /// The document date printed on the manifest.
    pub document_date: Date,
    /// The items, in scan order.
    pub items: Vec<ManifestItemPlan>,
}

/// Outcome of planning a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPlan {
    /// Create this manifest.
    Create(ManifestPlan),
    /// Every candidate is already claimed; nothing to do.
    NothingNew,
}

/// Plans a return manifest.
///
/// # Arguments
///
/// * `document_date` - The date for the new manifest
/// * `candidates` - Scanned returns, in scan order
/// * `excluded_awbs` - AWB numbers held by open return manifests
/// * `latest_invoices` - Latest issued invoice id per order id
///
/// Candidates that are not received at the warehouse, that are already
/// claimed, or that repeat an AWB number seen earlier in the same run are
/// dropped.
#[must_use]
pub fn plan_return_manifest(
    document_date: Date,
    candidates: &[ScannedReturnRecord],
    excluded_awbs: &HashSet<String>,
    latest_invoices: &HashMap<String, String>,
) -> GenerationPlan {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut items: Vec<ManifestItemPlan> = Vec::new();

    for record in candidates {
        if !record.status.is_received_at_warehouse() {
            continue;
        }
        if excluded_awbs.contains(&record.awb_number) {
            continue;
        }
        if !seen.insert(record.awb_number.as_str()) {
            continue;
        }

        let resolved: ResolvedReturn = resolve_return(record);
        let invoice_id: Option<String> = resolved
            .order_id
            .as_ref()
            .and_then(|order_id| latest_invoices.get(order_id).cloned());

        items.push(ManifestItemPlan {
            awb_number: resolved.awb_number,
            original_awb_number: resolved.original_awb_number,
            order_id: resolved.order_id,
            invoice_id,
        });
    }

    if items.is_empty() {
        return GenerationPlan::NothingNew;
    }

    GenerationPlan::Create(ManifestPlan {
        manifest_type: ManifestType::Return,
        document_date,
        items,
    })
}
