// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Manifest type string is not recognised.
    InvalidManifestType(String),
    /// Manifest status string is not recognised.
    InvalidManifestStatus(String),
    /// Manifest item status string is not recognised.
    InvalidManifestItemStatus(String),
    /// A manifest status transition is not permitted.
    InvalidManifestTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
    /// A manifest item status transition is not permitted.
    InvalidItemTransition {
        /// The current item status.
        from: String,
        /// The requested item status.
        to: String,
    },
    /// An item was marked as failed without a description of the failure.
    MissingItemErrorMessage,
    /// Invoice status string is not recognised.
    InvalidInvoiceStatus(String),
    /// Payment status string is not recognised.
    InvalidPaymentStatus(String),
    /// Operation source string is not recognised.
    InvalidOperationSource(String),
    /// Collect type string is not recognised.
    InvalidCollectType(String),
    /// Scanned return status string is not recognised.
    InvalidScannedReturnStatus(String),
    /// Guarded operation string is not recognised.
    InvalidGuardedOperation(String),
    /// The invoice has already been cancelled.
    InvoiceAlreadyCancelled {
        /// The invoice identifier.
        invoice_id: String,
    },
    /// The invoice has already been marked as paid.
    InvoiceAlreadyPaid {
        /// The invoice identifier.
        invoice_id: String,
    },
    /// The override PIN does not have the required shape.
    InvalidPin(String),
    /// An AWB number is empty or malformed.
    InvalidAwbNumber(String),
    /// A document date could not be parsed.
    InvalidDocumentDate {
        /// The rejected input.
        value: String,
        /// The parser error.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidManifestType(value) => write!(f, "Invalid manifest type: '{value}'"),
            Self::InvalidManifestStatus(value) => {
                write!(f, "Invalid manifest status: '{value}'")
            }
            Self::InvalidManifestItemStatus(value) => {
                write!(f, "Invalid manifest item status: '{value}'")
            }
            Self::InvalidManifestTransition { from, to } => {
                write!(f, "Manifest cannot transition from {from} to {to}")
            }
            Self::InvalidItemTransition { from, to } => {
                write!(f, "Manifest item cannot transition from {from} to {to}")
            }
            Self::MissingItemErrorMessage => {
                write!(f, "An error message is required when marking an item as failed")
            }
            Self::InvalidInvoiceStatus(value) => write!(f, "Invalid invoice status: '{value}'"),
            Self::InvalidPaymentStatus(value) => write!(f, "Invalid payment status: '{value}'"),
            Self::InvalidOperationSource(value) => {
                write!(f, "Invalid operation source: '{value}'")
            }
            Self::InvalidCollectType(value) => write!(f, "Invalid collect type: '{value}'"),
            Self::InvalidGuardedOperation(value) => {
                write!(f, "Invalid guarded operation: '{value}'")
            }
            Self::InvalidScannedReturnStatus(value) => {
                write!(f, "Invalid scanned return status: '{value}'")
            }
            Self::InvoiceAlreadyCancelled { invoice_id } => {
                write!(f, "Invoice {invoice_id} is already cancelled")
            }
            Self::InvoiceAlreadyPaid { invoice_id } => {
                write!(f, "Invoice {invoice_id} is already paid")
            }
            Self::InvalidPin(reason) => write!(f, "Invalid PIN: {reason}"),
            Self::InvalidAwbNumber(reason) => write!(f, "Invalid AWB number: {reason}"),
            Self::InvalidDocumentDate { value, error } => {
                write!(f, "Failed to parse document date '{value}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
