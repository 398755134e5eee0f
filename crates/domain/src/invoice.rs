// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice states and the guarded operations that change them.

use crate::error::DomainError;
use crate::manifest::ManifestType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Issuance state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued and still valid.
    Issued,
    /// Reversed through a storno document.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(Self::Issued),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidInvoiceStatus(s.to_string())),
        }
    }
}

/// Collection state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet collected.
    Unpaid,
    /// Collected.
    Paid,
}

impl PaymentStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            _ => Err(DomainError::InvalidPaymentStatus(s.to_string())),
        }
    }
}

/// What authorised a guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationSource {
    /// A confirmed manifest proves the physical event.
    #[serde(rename = "manifest")]
    Manifest,
    /// A supervisor supplied the shared override PIN.
    #[serde(rename = "pin-override")]
    PinOverride,
}

impl OperationSource {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::PinOverride => "pin-override",
        }
    }
}

impl FromStr for OperationSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manifest" => Ok(Self::Manifest),
            "pin-override" => Ok(Self::PinOverride),
            _ => Err(DomainError::InvalidOperationSource(s.to_string())),
        }
    }
}

impl std::fmt::Display for OperationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment was collected, as reported to the invoicing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectType {
    /// Card payment.
    Card,
    /// Cash at the counter.
    Cash,
    /// Cash collected by the courier on delivery.
    #[default]
    CashOnDelivery,
    /// Bank transfer.
    BankTransfer,
}

impl CollectType {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

impl FromStr for CollectType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            "bank_transfer" => Ok(Self::BankTransfer),
            _ => Err(DomainError::InvalidCollectType(s.to_string())),
        }
    }
}

/// An irreversible financial action gated by manifest evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardedOperation {
    /// Reverse the invoice through a storno.
    Cancel,
    /// Mark the invoice as collected.
    Collect,
}

impl GuardedOperation {
    /// Returns the operation name used in logs and claims.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Collect => "collect",
        }
    }

    /// The manifest type whose confirmed membership proves this operation.
    ///
    /// A return manifest proves the parcel came back; a delivery manifest
    /// proves it left with the courier.
    #[must_use]
    pub const fn evidence_type(&self) -> ManifestType {
        match self {
            Self::Cancel => ManifestType::Return,
            Self::Collect => ManifestType::Delivery,
        }
    }

    /// The order status written after the operation succeeds.
    #[must_use]
    pub const fn resulting_order_status(&self) -> &'static str {
        match self {
            Self::Cancel => "cancelled",
            Self::Collect => "completed",
        }
    }

    /// Checks that an invoice in the given state may undergo this operation.
    ///
    /// # Errors
    ///
    /// - `InvoiceAlreadyCancelled` for a cancelled invoice (both operations)
    /// - `InvoiceAlreadyPaid` when collecting an invoice that is already paid
    pub fn check_preconditions(
        &self,
        invoice_id: &str,
        status: InvoiceStatus,
        payment_status: PaymentStatus,
    ) -> Result<(), DomainError> {
        if status == InvoiceStatus::Cancelled {
            return Err(DomainError::InvoiceAlreadyCancelled {
                invoice_id: invoice_id.to_string(),
            });
        }
        if *self == Self::Collect && payment_status == PaymentStatus::Paid {
            return Err(DomainError::InvoiceAlreadyPaid {
                invoice_id: invoice_id.to_string(),
            });
        }
        Ok(())
    }
}

impl std::str::FromStr for GuardedOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel" => Ok(Self::Cancel),
            "collect" => Ok(Self::Collect),
            _ => Err(DomainError::InvalidGuardedOperation(s.to_string())),
        }
    }
}
