// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the manifest guard.
//!
//! This crate stores manifests and their items, the override credential, the
//! audit trail and the slice of the back office (orders, invoices, shipments,
//! scanned returns) the guard reads and updates. It is built on Diesel over
//! `SQLite`.
//!
//! ## Concurrency
//!
//! - Guarded invoice operations claim the invoice with a conditional update
//!   before calling the external ledger and complete it in one
//!   `BEGIN IMMEDIATE` transaction afterwards.
//! - Manifest generation reads its exclusion set and writes the new manifest
//!   inside one `BEGIN IMMEDIATE` transaction. The `manifest_awb_claims`
//!   unique index rejects any AWB claimed twice by open manifests of one type.
//!
//! ## Testing
//!
//! Tests use uniquely named shared-cache in-memory databases, so every
//! `Persistence::new_in_memory()` call is isolated.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use manifest_guard::ManifestEvidence;
use manifest_guard_audit::{Actor, AuditEntry, EntityType};
use manifest_guard_domain::{GuardedOperation, ItemOutcome, ManifestStatus, ManifestType, Pin};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

pub use data_models::{
    CancelCompletion, CollectCompletion, GenerationOutcome, InvoiceContext, InvoiceData,
    ManifestData, ManifestDetail, ManifestItemData, NewInvoice, NewManifestItem,
    NewScannedReturn, PinAttemptState, PinCredentialData,
};
pub use error::PersistenceError;

use backend::PersistenceBackend;

/// bcrypt cost used for the override PIN unless configured otherwise.
pub const DEFAULT_PIN_HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Lowest bcrypt cost the hashing library accepts.
pub const MIN_PIN_HASH_COST: u32 = 4;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns the current UTC time as RFC 3339 text.
pub(crate) fn timestamp_now() -> Result<String, PersistenceError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// so tests never share state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        conn.verify_foreign_key_enforcement()?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        conn.verify_foreign_key_enforcement()?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    // ========================================================================
    // Invoices
    // ========================================================================

    /// Loads an invoice with its order status and billing company candidates.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` if the invoice does not exist.
    pub fn get_invoice_context(
        &mut self,
        invoice_id: &str,
    ) -> Result<InvoiceContext, PersistenceError> {
        queries::invoices::get_invoice_context(&mut self.conn, invoice_id)
    }

    /// Finds every manifest referencing the invoice directly or via its order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn find_manifest_evidence(
        &mut self,
        invoice_id: &str,
        order_id: Option<&str>,
    ) -> Result<Vec<ManifestEvidence>, PersistenceError> {
        queries::invoices::find_manifest_evidence(&mut self.conn, invoice_id, order_id)
    }

    /// Returns the status of an order, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn get_order_status(&mut self, order_id: &str) -> Result<Option<String>, PersistenceError> {
        queries::invoices::get_order_status(&mut self.conn, order_id)
    }

    /// Claims an invoice for a guarded operation.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceClaimRejected` if the invoice changed or is held.
    pub fn claim_invoice(
        &mut self,
        invoice_id: &str,
        operation: GuardedOperation,
    ) -> Result<(), PersistenceError> {
        mutations::invoices::claim_invoice(&mut self.conn, invoice_id, operation)
    }

    /// Releases an invoice claim after a failed ledger call.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn release_invoice_claim(
        &mut self,
        invoice_id: &str,
        operation: GuardedOperation,
    ) -> Result<(), PersistenceError> {
        mutations::invoices::release_invoice_claim(&mut self.conn, invoice_id, operation)
    }

    /// Releases a claim left behind by an interrupted guarded operation.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceClaimRejected` if the claim changed since it was read.
    pub fn release_held_invoice(
        &mut self,
        invoice_id: &str,
        pending_since: &str,
        audit: &AuditEntry,
    ) -> Result<i64, PersistenceError> {
        mutations::invoices::release_held_invoice(&mut self.conn, invoice_id, pending_since, audit)
    }

    /// Writes the cancelled invoice, its order and the audit entry.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceClaimRejected` if the claim was lost.
    pub fn complete_cancel(
        &mut self,
        completion: &CancelCompletion,
        audit: &AuditEntry,
    ) -> Result<i64, PersistenceError> {
        mutations::invoices::complete_cancel(&mut self.conn, completion, audit)
    }

    /// Writes the collected invoice, its order and the audit entry.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceClaimRejected` if the claim was lost.
    pub fn complete_collect(
        &mut self,
        completion: &CollectCompletion,
        audit: &AuditEntry,
    ) -> Result<i64, PersistenceError> {
        mutations::invoices::complete_collect(&mut self.conn, completion, audit)
    }

    // ========================================================================
    // Manifests
    // ========================================================================

    /// Runs one return manifest generation.
    ///
    /// # Errors
    ///
    /// Returns an error if any query fails or an AWB claim is contested.
    pub fn generate_return_manifest(
        &mut self,
        document_date: Date,
        return_ids: Option<&[String]>,
        actor: &Actor,
    ) -> Result<GenerationOutcome, PersistenceError> {
        mutations::manifests::generate_return_manifest(
            &mut self.conn,
            document_date,
            return_ids,
            actor,
        )
    }

    /// Creates a draft delivery manifest.
    ///
    /// # Errors
    ///
    /// Returns `AwbAlreadyClaimed` if an AWB is on an open delivery manifest.
    pub fn create_delivery_manifest(
        &mut self,
        document_date: Date,
        items: &[NewManifestItem],
        actor: &Actor,
    ) -> Result<i64, PersistenceError> {
        mutations::manifests::create_delivery_manifest(&mut self.conn, document_date, items, actor)
    }

    /// Applies a validated manifest status transition.
    ///
    /// # Errors
    ///
    /// Returns `ManifestNotFound` or `ManifestStatusChanged` if nothing was
    /// updated.
    pub fn transition_manifest(
        &mut self,
        manifest_id: i64,
        from: ManifestStatus,
        to: ManifestStatus,
        actor: &Actor,
    ) -> Result<(), PersistenceError> {
        mutations::manifests::transition_manifest(&mut self.conn, manifest_id, from, to, actor)
    }

    /// Records the outcome of a pending manifest item.
    ///
    /// # Errors
    ///
    /// Returns `ManifestItemNotFound` or `ManifestItemAlreadyResolved`.
    pub fn record_item_outcome(
        &mut self,
        item_id: i64,
        outcome: &ItemOutcome,
        actor: &Actor,
    ) -> Result<(), PersistenceError> {
        mutations::manifests::record_item_outcome(&mut self.conn, item_id, outcome, actor)
    }

    /// Retrieves a manifest header.
    ///
    /// # Errors
    ///
    /// Returns `ManifestNotFound` if no manifest has this id.
    pub fn get_manifest(&mut self, manifest_id: i64) -> Result<ManifestData, PersistenceError> {
        queries::manifests::get_manifest(&mut self.conn, manifest_id)
    }

    /// Retrieves a manifest with its items.
    ///
    /// # Errors
    ///
    /// Returns `ManifestNotFound` if no manifest has this id.
    pub fn get_manifest_detail(
        &mut self,
        manifest_id: i64,
    ) -> Result<ManifestDetail, PersistenceError> {
        queries::manifests::get_manifest_detail(&mut self.conn, manifest_id)
    }

    /// Lists manifests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_manifests(
        &mut self,
        manifest_type: Option<ManifestType>,
        status: Option<ManifestStatus>,
    ) -> Result<Vec<ManifestData>, PersistenceError> {
        queries::manifests::list_manifests(&mut self.conn, manifest_type, status)
    }

    /// Retrieves a single manifest item.
    ///
    /// # Errors
    ///
    /// Returns `ManifestItemNotFound` if no item has this id.
    pub fn get_manifest_item(&mut self, item_id: i64) -> Result<ManifestItemData, PersistenceError> {
        queries::manifests::get_manifest_item(&mut self.conn, item_id)
    }

    // ========================================================================
    // Override PIN
    // ========================================================================

    /// Retrieves the override credential, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn get_override_pin(&mut self) -> Result<Option<PinCredentialData>, PersistenceError> {
        queries::pin::get_override_pin(&mut self.conn)
    }

    /// Hashes and stores a new override PIN together with its audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or the write fails.
    pub fn replace_override_pin(
        &mut self,
        pin: &Pin,
        updated_by: &str,
        hash_cost: u32,
        audit: &AuditEntry,
    ) -> Result<(), PersistenceError> {
        mutations::pin::replace_override_pin(&mut self.conn, pin, updated_by, hash_cost, audit)
    }

    /// Verifies a PIN against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    pub fn verify_pin(&self, pin: &Pin, pin_hash: &str) -> Result<bool, PersistenceError> {
        queries::pin::verify_pin_hash(pin.expose(), pin_hash)
    }

    /// Counts a failed PIN attempt, locking the credential at the limit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no PIN has been set.
    pub fn record_failed_pin_attempt(
        &mut self,
        max_attempts: u32,
        lock_until: &str,
    ) -> Result<PinAttemptState, PersistenceError> {
        mutations::pin::record_failed_pin_attempt(&mut self.conn, max_attempts, lock_until)
    }

    /// Resets the PIN failure counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn clear_failed_pin_attempts(&mut self) -> Result<(), PersistenceError> {
        mutations::pin::clear_failed_pin_attempts(&mut self.conn)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Appends an audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn append_audit_entry(&mut self, entry: &AuditEntry) -> Result<i64, PersistenceError> {
        mutations::audit::append_audit_entry(&mut self.conn, entry)
    }

    /// Lists audit entries in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if entries cannot be retrieved or deserialized.
    pub fn list_audit_entries(
        &mut self,
        entity_type: Option<EntityType>,
        entity_id: Option<&str>,
    ) -> Result<Vec<AuditEntry>, PersistenceError> {
        queries::audit::list_audit_entries(&mut self.conn, entity_type, entity_id)
    }

    // ========================================================================
    // Upstream entities
    // ========================================================================

    /// Inserts a billing company.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_company(
        &mut self,
        company_id: &str,
        name: &str,
        vat_code: &str,
    ) -> Result<(), PersistenceError> {
        mutations::seed::insert_company(&mut self.conn, company_id, name, vat_code)
    }

    /// Inserts a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_store(
        &mut self,
        store_id: &str,
        name: &str,
        company_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        mutations::seed::insert_store(&mut self.conn, store_id, name, company_id)
    }

    /// Inserts an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_order(
        &mut self,
        order_id: &str,
        store_id: Option<&str>,
        status: &str,
    ) -> Result<(), PersistenceError> {
        mutations::seed::insert_order(&mut self.conn, order_id, store_id, status)
    }

    /// Inserts an outbound shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_shipment(
        &mut self,
        shipment_id: &str,
        order_id: Option<&str>,
        awb_number: &str,
    ) -> Result<(), PersistenceError> {
        mutations::seed::insert_shipment(&mut self.conn, shipment_id, order_id, awb_number)
    }

    /// Inserts a scanned return.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_scanned_return(
        &mut self,
        scanned_return: &NewScannedReturn,
    ) -> Result<(), PersistenceError> {
        mutations::seed::insert_scanned_return(&mut self.conn, scanned_return)
    }

    /// Inserts an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<(), PersistenceError> {
        mutations::seed::insert_invoice(&mut self.conn, invoice)
    }
}
