// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Warehouse intake state of a scanned return parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannedReturnStatus {
    /// Announced by the courier, not yet at the warehouse.
    Scanned,
    /// Received intact.
    Received,
    /// Received with visible damage.
    ReceivedDamaged,
    /// Refused at intake.
    Rejected,
}

impl ScannedReturnStatus {
    /// Statuses that count as "received at warehouse" for manifest generation.
    pub const RECEIVED_AT_WAREHOUSE: [Self; 2] = [Self::Received, Self::ReceivedDamaged];

    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Received => "received",
            Self::ReceivedDamaged => "received_damaged",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true if the parcel is physically at the warehouse.
    #[must_use]
    pub const fn is_received_at_warehouse(&self) -> bool {
        matches!(self, Self::Received | Self::ReceivedDamaged)
    }
}

impl FromStr for ScannedReturnStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scanned" => Ok(Self::Scanned),
            "received" => Ok(Self::Received),
            "received_damaged" => Ok(Self::ReceivedDamaged),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidScannedReturnStatus(s.to_string())),
        }
    }
}
