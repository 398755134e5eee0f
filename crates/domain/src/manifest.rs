// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Manifest kinds, lifecycle states and transition rules.
//!
//! A manifest moves strictly forward: `DRAFT -> CONFIRMED -> PROCESSED`.
//! Transitions are triggered by operators or schedulers, never by the
//! generator itself. Items move from `PENDING` to either `PROCESSED` or
//! `ERROR` as downstream processing completes.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What kind of physical evidence a manifest groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManifestType {
    /// Outbound shipments handed to the courier.
    Delivery,
    /// Returned parcels received at the warehouse.
    Return,
}

impl ManifestType {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "DELIVERY",
            Self::Return => "RETURN",
        }
    }
}

impl FromStr for ManifestType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELIVERY" => Ok(Self::Delivery),
            "RETURN" => Ok(Self::Return),
            _ => Err(DomainError::InvalidManifestType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ManifestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManifestStatus {
    /// Generated, evidence recorded but not yet confirmed by an operator.
    Draft,
    /// Physically verified.
    Confirmed,
    /// All items handled. Terminal.
    Processed,
}

impl ManifestStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Confirmed => "CONFIRMED",
            Self::Processed => "PROCESSED",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true while the manifest still holds claims on its AWB numbers.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if membership in a manifest with this status counts as
    /// confirmed physical evidence for a guarded operation.
    #[must_use]
    pub const fn proves_evidence(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Processed)
    }

    /// The only state reachable from this one, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Processed),
            Self::Processed => None,
        }
    }

    /// Validates a transition from this status to `target`.
    ///
    /// Only single forward steps are permitted; skips and reversals are rejected.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidManifestTransition` if the step is not allowed.
    pub fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.next() == Some(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidManifestTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }
}

impl FromStr for ManifestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PROCESSED" => Ok(Self::Processed),
            _ => Err(DomainError::InvalidManifestStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Processing state of a single manifest item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManifestItemStatus {
    /// Awaiting downstream processing.
    Pending,
    /// Handled successfully.
    Processed,
    /// Downstream processing failed; see the item's error message.
    Error,
}

impl ManifestItemStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Error => "ERROR",
        }
    }
}

impl FromStr for ManifestItemStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSED" => Ok(Self::Processed),
            "ERROR" => Ok(Self::Error),
            _ => Err(DomainError::InvalidManifestItemStatus(s.to_string())),
        }
    }
}

/// Result of downstream processing of one manifest item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The item was handled.
    Processed,
    /// The item failed with a human-readable message.
    Error(String),
}

impl ItemOutcome {
    /// Builds an outcome from a requested status and optional message.
    ///
    /// # Errors
    ///
    /// Returns an error if the status is `PENDING`, or if `ERROR` is requested
    /// without a non-empty message.
    pub fn new(status: ManifestItemStatus, message: Option<&str>) -> Result<Self, DomainError> {
        match status {
            ManifestItemStatus::Processed => Ok(Self::Processed),
            ManifestItemStatus::Error => {
                let message: &str = message.map(str::trim).unwrap_or_default();
                if message.is_empty() {
                    return Err(DomainError::MissingItemErrorMessage);
                }
                Ok(Self::Error(message.to_string()))
            }
            ManifestItemStatus::Pending => Err(DomainError::InvalidItemTransition {
                from: ManifestItemStatus::Pending.as_str().to_string(),
                to: ManifestItemStatus::Pending.as_str().to_string(),
            }),
        }
    }

    /// The status this outcome moves the item to.
    #[must_use]
    pub const fn status(&self) -> ManifestItemStatus {
        match self {
            Self::Processed => ManifestItemStatus::Processed,
            Self::Error(_) => ManifestItemStatus::Error,
        }
    }

    /// The error message, if this is a failure.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Processed => None,
            Self::Error(message) => Some(message),
        }
    }

    /// Validates that an item currently in `current` may take this outcome.
    ///
    /// # Errors
    ///
    /// Returns an error unless the item is still `PENDING`.
    pub fn validate_from(&self, current: ManifestItemStatus) -> Result<(), DomainError> {
        if current == ManifestItemStatus::Pending {
            Ok(())
        } else {
            Err(DomainError::InvalidItemTransition {
                from: current.as_str().to_string(),
                to: self.status().as_str().to_string(),
            })
        }
    }
}
