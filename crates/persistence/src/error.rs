// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// A stored value could not be turned back into a domain value.
    ReconstructionError(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested invoice was not found.
    InvoiceNotFound(String),
    /// The requested manifest was not found.
    ManifestNotFound(i64),
    /// The requested manifest item was not found.
    ManifestItemNotFound(i64),
    /// The invoice is no longer in the state the caller observed, or another
    /// guarded operation currently holds it.
    InvoiceClaimRejected {
        /// The invoice identifier.
        invoice_id: String,
    },
    /// The manifest status changed between read and write.
    ManifestStatusChanged {
        /// The manifest id.
        manifest_id: i64,
        /// The status the caller expected.
        expected: String,
    },
    /// The manifest item was already resolved.
    ManifestItemAlreadyResolved(i64),
    /// An open manifest of the same type already holds this AWB number.
    AwbAlreadyClaimed {
        /// The manifest type.
        manifest_type: String,
        /// The contested AWB number.
        awb_number: String,
    },
    /// Hashing or verifying the override PIN failed.
    PinHashError(String),
    /// The requested resource was not found.
    NotFound(String),
    /// A general error occurred.
    Other(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Reconstruction error: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::InvoiceNotFound(id) => write!(f, "Invoice not found: {id}"),
            Self::ManifestNotFound(id) => write!(f, "Manifest not found: {id}"),
            Self::ManifestItemNotFound(id) => write!(f, "Manifest item not found: {id}"),
            Self::InvoiceClaimRejected { invoice_id } => write!(
                f,
                "Invoice {invoice_id} changed or has an operation in progress"
            ),
            Self::ManifestStatusChanged {
                manifest_id,
                expected,
            } => write!(
                f,
                "Manifest {manifest_id} is no longer {expected}; reload and retry"
            ),
            Self::ManifestItemAlreadyResolved(id) => {
                write!(f, "Manifest item {id} has already been resolved")
            }
            Self::AwbAlreadyClaimed {
                manifest_type,
                awb_number,
            } => write!(
                f,
                "AWB {awb_number} is already on an open {manifest_type} manifest"
            ),
            Self::PinHashError(msg) => write!(f, "PIN hashing failed: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<manifest_guard_domain::DomainError> for PersistenceError {
    fn from(err: manifest_guard_domain::DomainError) -> Self {
        Self::ReconstructionError(err.to_string())
    }
}
