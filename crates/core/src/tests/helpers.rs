// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use manifest_guard_domain::{ManifestStatus, ManifestType, ScannedReturnStatus};
use time::Date;
use time::macros::date;

use crate::{EvidenceMatch, ManifestEvidence, OriginalShipment, ScannedReturnRecord};

pub fn test_date() -> Date {
    date!(2026 - 03 - 14)
}

pub fn received_return(return_id: &str, awb: &str, order_id: &str) -> ScannedReturnRecord {
    ScannedReturnRecord {
        return_id: return_id.to_string(),
        awb_number: awb.to_string(),
        status: ScannedReturnStatus::Received,
        direct_order_id: None,
        original_shipment: Some(OriginalShipment {
            shipment_id: format!("ship-{return_id}"),
            awb_number: format!("OUT-{awb}"),
            order_id: Some(order_id.to_string()),
        }),
    }
}

pub fn evidence(
    manifest_id: i64,
    manifest_type: ManifestType,
    status: ManifestStatus,
    matched_by: EvidenceMatch,
) -> ManifestEvidence {
    ManifestEvidence {
        manifest_id,
        manifest_type,
        status,
        matched_by,
    }
}
