// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Manifest generation, manifest administration and audit handlers.

use std::collections::HashSet;
use std::str::FromStr;

use manifest_guard_audit::{AuditEntry, EntityType};
use manifest_guard_domain::{
    AwbNumber, ItemOutcome, ManifestItemStatus, ManifestStatus, ManifestType, parse_document_date,
};
use manifest_guard_persistence::{
    GenerationOutcome, ManifestData, ManifestDetail, ManifestItemData, NewManifestItem,
    Persistence,
};
use time::Date;
use tracing::info;

use crate::auth::AuthenticatedActor;
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::request_response::{
    AuditEntryResponse, CreateDeliveryManifestRequest, CreateDeliveryManifestResponse,
    GenerateReturnManifestRequest, GenerateReturnManifestResponse, ManifestDetailResponse,
    ManifestItemResponse, ManifestResponse, RecordItemOutcomeRequest,
};

fn resolve_document_date(requested: Option<&str>, today: Date) -> Result<Date, ApiError> {
    requested
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or(Ok(today), |value| {
            parse_document_date(value).map_err(translate_domain_error)
        })
}

/// Runs one return manifest generation.
///
/// An empty run is not an error; the response reports `created: false`.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - Optional document date and return filter
/// * `authenticated_actor` - Who triggered the run
/// * `today` - Document date used when none is requested
///
/// # Errors
///
/// Returns an error if the document date is malformed or the run fails.
pub fn generate_return_manifest(
    persistence: &mut Persistence,
    request: &GenerateReturnManifestRequest,
    authenticated_actor: &AuthenticatedActor,
    today: Date,
) -> Result<GenerateReturnManifestResponse, ApiError> {
    let document_date: Date = resolve_document_date(request.document_date.as_deref(), today)?;

    let outcome: GenerationOutcome = persistence
        .generate_return_manifest(
            document_date,
            request.return_ids.as_deref(),
            &authenticated_actor.to_audit_actor(),
        )
        .map_err(translate_persistence_error)?;

    Ok(match outcome {
        GenerationOutcome::Created {
            manifest_id,
            item_count,
        } => GenerateReturnManifestResponse {
            created: true,
            manifest_id: Some(manifest_id),
            item_count,
            message: format!("Return manifest {manifest_id} created with {item_count} item(s)"),
        },
        GenerationOutcome::NothingNew => GenerateReturnManifestResponse {
            created: false,
            manifest_id: None,
            item_count: 0,
            message: String::from("No new returns available"),
        },
    })
}

/// Creates a draft delivery manifest from dispatched parcels.
///
/// # Errors
///
/// Returns an error if:
/// - the item list is empty, or repeats or contains a malformed AWB
/// - an AWB is already on an open delivery manifest (`Conflict`)
pub fn create_delivery_manifest(
    persistence: &mut Persistence,
    request: &CreateDeliveryManifestRequest,
    authenticated_actor: &AuthenticatedActor,
    today: Date,
) -> Result<CreateDeliveryManifestResponse, ApiError> {
    let document_date: Date = resolve_document_date(request.document_date.as_deref(), today)?;

    if request.items.is_empty() {
        return Err(ApiError::ValidationFailure {
            field: String::from("items"),
            message: String::from("A delivery manifest needs at least one item"),
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut items: Vec<NewManifestItem> = Vec::with_capacity(request.items.len());
    for item in &request.items {
        let awb: AwbNumber = AwbNumber::new(&item.awb_number).map_err(translate_domain_error)?;
        if !seen.insert(awb.value().to_string()) {
            return Err(ApiError::ValidationFailure {
                field: String::from("items"),
                message: format!("AWB '{}' appears more than once", awb.value()),
            });
        }
        items.push(NewManifestItem {
            awb_number: awb.value().to_string(),
            original_awb_number: None,
            order_id: item.order_id.clone(),
            invoice_id: item.invoice_id.clone(),
        });
    }

    let manifest_id: i64 = persistence
        .create_delivery_manifest(document_date, &items, &authenticated_actor.to_audit_actor())
        .map_err(translate_persistence_error)?;

    Ok(CreateDeliveryManifestResponse {
        manifest_id,
        item_count: items.len(),
    })
}

/// Retrieves a manifest with its items.
///
/// # Errors
///
/// Returns `NotFound` if no manifest has this id.
pub fn get_manifest(
    persistence: &mut Persistence,
    manifest_id: i64,
) -> Result<ManifestDetailResponse, ApiError> {
    let detail: ManifestDetail = persistence
        .get_manifest_detail(manifest_id)
        .map_err(translate_persistence_error)?;
    Ok(detail.into())
}

/// Lists manifests, newest first.
///
/// # Arguments
///
/// * `manifest_type` - `DELIVERY` or `RETURN`, all types when absent
/// * `status` - `DRAFT`, `CONFIRMED` or `PROCESSED`, all when absent
///
/// # Errors
///
/// Returns an error if a filter value is not recognised.
pub fn list_manifests(
    persistence: &mut Persistence,
    manifest_type: Option<&str>,
    status: Option<&str>,
) -> Result<Vec<ManifestResponse>, ApiError> {
    let manifest_type: Option<ManifestType> = manifest_type
        .map(ManifestType::from_str)
        .transpose()
        .map_err(translate_domain_error)?;
    let status: Option<ManifestStatus> = status
        .map(ManifestStatus::from_str)
        .transpose()
        .map_err(translate_domain_error)?;

    Ok(persistence
        .list_manifests(manifest_type, status)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(ManifestResponse::from)
        .collect())
}

fn transition_manifest(
    persistence: &mut Persistence,
    manifest_id: i64,
    target: ManifestStatus,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ManifestResponse, ApiError> {
    let current: ManifestData = persistence
        .get_manifest(manifest_id)
        .map_err(translate_persistence_error)?;

    current
        .status
        .validate_transition(target)
        .map_err(translate_domain_error)?;

    persistence
        .transition_manifest(
            manifest_id,
            current.status,
            target,
            &authenticated_actor.to_audit_actor(),
        )
        .map_err(translate_persistence_error)?;

    info!(
        manifest_id,
        status = target.as_str(),
        actor = %authenticated_actor.id,
        "Manifest status changed"
    );

    let updated: ManifestData = persistence
        .get_manifest(manifest_id)
        .map_err(translate_persistence_error)?;
    Ok(updated.into())
}

/// Confirms a draft manifest.
///
/// Once confirmed, the manifest proves the physical event for the guard.
///
/// # Errors
///
/// Returns `NotFound` for an unknown manifest and `Conflict` unless the
/// manifest is a draft.
pub fn confirm_manifest(
    persistence: &mut Persistence,
    manifest_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ManifestResponse, ApiError> {
    transition_manifest(
        persistence,
        manifest_id,
        ManifestStatus::Confirmed,
        authenticated_actor,
    )
}

/// Marks a confirmed manifest as processed, releasing its AWBs.
///
/// # Errors
///
/// Returns `NotFound` for an unknown manifest and `Conflict` unless the
/// manifest is confirmed.
pub fn process_manifest(
    persistence: &mut Persistence,
    manifest_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ManifestResponse, ApiError> {
    transition_manifest(
        persistence,
        manifest_id,
        ManifestStatus::Processed,
        authenticated_actor,
    )
}

/// Records the outcome of a pending manifest item.
///
/// # Errors
///
/// Returns an error if the status is not `PROCESSED` or `ERROR`, an `ERROR`
/// has no message, or the item is unknown or already resolved.
pub fn record_item_outcome(
    persistence: &mut Persistence,
    item_id: i64,
    request: &RecordItemOutcomeRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ManifestItemResponse, ApiError> {
    let status: ManifestItemStatus =
        ManifestItemStatus::from_str(request.status.trim()).map_err(translate_domain_error)?;
    let outcome: ItemOutcome = ItemOutcome::new(status, request.error_message.as_deref())
        .map_err(translate_domain_error)?;

    let current: ManifestItemData = persistence
        .get_manifest_item(item_id)
        .map_err(translate_persistence_error)?;
    outcome
        .validate_from(current.status)
        .map_err(translate_domain_error)?;

    persistence
        .record_item_outcome(item_id, &outcome, &authenticated_actor.to_audit_actor())
        .map_err(translate_persistence_error)?;

    Ok(persistence
        .get_manifest_item(item_id)
        .map_err(translate_persistence_error)?
        .into())
}

/// Lists audit entries in the order they were written.
///
/// # Errors
///
/// Returns an error if the entity type is not recognised or the trail
/// cannot be read.
pub fn list_audit_entries(
    persistence: &mut Persistence,
    entity_type: Option<&str>,
    entity_id: Option<&str>,
) -> Result<Vec<AuditEntryResponse>, ApiError> {
    let entity_type: Option<EntityType> = entity_type
        .map(EntityType::from_str)
        .transpose()
        .map_err(|message| ApiError::ValidationFailure {
            field: String::from("entityType"),
            message,
        })?;

    let entries: Vec<AuditEntry> = persistence
        .list_audit_entries(entity_type, entity_id)
        .map_err(translate_persistence_error)?;
    Ok(entries.into_iter().map(AuditEntryResponse::from).collect())
}
