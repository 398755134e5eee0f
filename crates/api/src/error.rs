// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use manifest_guard_domain::DomainError;
use manifest_guard_persistence::PersistenceError;

use crate::policy::PinPolicyError;

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain and persistence errors and represent the
/// API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A requested resource does not exist.
    NotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The target is not in a state that allows the request.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// The guard refused and no override was supplied.
    GuardBlocked {
        /// Why the guard refused.
        reason: String,
        /// The draft manifest referencing the invoice, if any.
        draft_manifest_id: Option<i64>,
    },
    /// An override PIN was supplied and rejected.
    InvalidOverride {
        /// A human-readable description.
        message: String,
    },
    /// The override PIN is locked after repeated failures.
    OverrideLockedOut {
        /// When the lockout ends (RFC 3339).
        until: String,
    },
    /// The invoicing provider refused or could not be reached.
    ExternalServiceFailure {
        /// The provider's message.
        message: String,
    },
    /// Invalid input was provided.
    ValidationFailure {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// An unexpected failure.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                resource_type,
                message,
            } => write!(f, "{resource_type} not found: {message}"),
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::GuardBlocked { reason, .. } => {
                write!(f, "Blocked, override required: {reason}")
            }
            Self::InvalidOverride { message } => write!(f, "Override rejected: {message}"),
            Self::OverrideLockedOut { until } => {
                write!(f, "Override PIN locked until {until}")
            }
            Self::ExternalServiceFailure { message } => {
                write!(f, "Invoicing provider failure: {message}")
            }
            Self::ValidationFailure { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::ValidationFailure {
                field: String::from("actorId"),
                message: reason,
            },
        }
    }
}

impl From<PinPolicyError> for ApiError {
    fn from(err: PinPolicyError) -> Self {
        let field: &str = match err {
            PinPolicyError::CurrentPinRequired => "currentPin",
            _ => "pin",
        };
        Self::ValidationFailure {
            field: field.to_string(),
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked
/// directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvoiceAlreadyCancelled { invoice_id } => ApiError::Conflict {
            message: format!("Invoice '{invoice_id}' is already cancelled"),
        },
        DomainError::InvoiceAlreadyPaid { invoice_id } => ApiError::Conflict {
            message: format!("Invoice '{invoice_id}' is already paid"),
        },
        DomainError::InvalidManifestTransition { from, to } => ApiError::Conflict {
            message: format!("Manifest cannot move from {from} to {to}"),
        },
        DomainError::InvalidItemTransition { from, to } => ApiError::Conflict {
            message: format!("Manifest item cannot move from {from} to {to}"),
        },
        DomainError::MissingItemErrorMessage => ApiError::ValidationFailure {
            field: String::from("errorMessage"),
            message: String::from("An error message is required when marking an item as ERROR"),
        },
        DomainError::InvalidPin(message) => ApiError::ValidationFailure {
            field: String::from("pin"),
            message,
        },
        DomainError::InvalidAwbNumber(message) => ApiError::ValidationFailure {
            field: String::from("awbNumber"),
            message,
        },
        DomainError::InvalidDocumentDate { value, error } => ApiError::ValidationFailure {
            field: String::from("documentDate"),
            message: format!("'{value}' is not a YYYY-MM-DD date: {error}"),
        },
        DomainError::InvalidManifestType(value) => ApiError::ValidationFailure {
            field: String::from("type"),
            message: format!("Unknown manifest type '{value}'"),
        },
        DomainError::InvalidManifestStatus(value) => ApiError::ValidationFailure {
            field: String::from("status"),
            message: format!("Unknown manifest status '{value}'"),
        },
        DomainError::InvalidManifestItemStatus(value) => ApiError::ValidationFailure {
            field: String::from("status"),
            message: format!("Unknown manifest item status '{value}'"),
        },
        DomainError::InvalidCollectType(value) => ApiError::ValidationFailure {
            field: String::from("collectType"),
            message: format!("Unknown collect type '{value}'"),
        },
        DomainError::InvalidInvoiceStatus(_)
        | DomainError::InvalidPaymentStatus(_)
        | DomainError::InvalidOperationSource(_)
        | DomainError::InvalidGuardedOperation(_)
        | DomainError::InvalidScannedReturnStatus(_) => ApiError::Internal {
            message: format!("Stored value could not be read: {err}"),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::InvoiceNotFound(invoice_id) => ApiError::NotFound {
            resource_type: String::from("Invoice"),
            message: format!("Invoice '{invoice_id}' does not exist"),
        },
        PersistenceError::ManifestNotFound(manifest_id) => ApiError::NotFound {
            resource_type: String::from("Manifest"),
            message: format!("Manifest {manifest_id} does not exist"),
        },
        PersistenceError::ManifestItemNotFound(item_id) => ApiError::NotFound {
            resource_type: String::from("Manifest item"),
            message: format!("Manifest item {item_id} does not exist"),
        },
        PersistenceError::InvoiceClaimRejected { invoice_id } => ApiError::Conflict {
            message: format!(
                "Invoice '{invoice_id}' changed or is being processed by another request"
            ),
        },
        PersistenceError::ManifestStatusChanged {
            manifest_id,
            expected,
        } => ApiError::Conflict {
            message: format!("Manifest {manifest_id} is no longer {expected}"),
        },
        PersistenceError::ManifestItemAlreadyResolved(item_id) => ApiError::Conflict {
            message: format!("Manifest item {item_id} is no longer PENDING"),
        },
        PersistenceError::AwbAlreadyClaimed {
            manifest_type,
            awb_number,
        } => ApiError::Conflict {
            message: format!("AWB '{awb_number}' is already on an open {manifest_type} manifest"),
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
