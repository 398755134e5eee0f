// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the manifest guard.
//!
//! This crate turns requests into calls on the persistence layer, the core
//! decision functions and the invoicing client, and translates every lower
//! error into an [`ApiError`]. It has no HTTP knowledge.

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

mod auth;
mod error;
mod guard;
mod handlers;
mod operations;
mod pin;
mod policy;
mod request_response;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

pub use auth::{AuthenticatedActor, authenticate_stub};
pub use error::{ApiError, AuthError, translate_domain_error, translate_persistence_error};
pub use guard::{can_cancel, can_mark_paid, check_guard};
pub use handlers::{
    confirm_manifest, create_delivery_manifest, generate_return_manifest, get_manifest,
    list_audit_entries, list_manifests, process_manifest, record_item_outcome,
};
pub use operations::{cancel_invoice, collect_invoice, release_invoice_claim};
pub use pin::{PinCheck, is_pin_configured, pin_status, set_override_pin, verify_override_pin};
pub use policy::{DEFAULT_CLAIM_RELEASE_MINUTES, OverridePolicy, PinPolicyError};
pub use request_response::{
    AuditEntryResponse, CancelInvoiceRequest, CollectInvoiceRequest,
    CreateDeliveryManifestRequest, CreateDeliveryManifestResponse, DeliveryItemRequest,
    GenerateReturnManifestRequest, GenerateReturnManifestResponse, GuardCheckResponse,
    GuardedOperationResponse, ManifestDetailResponse, ManifestItemResponse, ManifestResponse,
    PinStatusResponse, RecordItemOutcomeRequest, ReleaseClaimRequest, ReleaseClaimResponse,
    SetPinRequest, SetPinResponse,
};
