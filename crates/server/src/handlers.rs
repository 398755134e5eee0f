// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Route handlers.
//!
//! Handlers authenticate the actor named in the body, call into the API
//! crate and wrap the result. No business rule lives here.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
};
use manifest_guard_api::{
    AuditEntryResponse, AuthenticatedActor, CancelInvoiceRequest, CollectInvoiceRequest,
    CreateDeliveryManifestRequest, CreateDeliveryManifestResponse, GenerateReturnManifestRequest,
    GenerateReturnManifestResponse, GuardCheckResponse, GuardedOperationResponse,
    ManifestDetailResponse, ManifestItemResponse, ManifestResponse, PinStatusResponse,
    RecordItemOutcomeRequest, ReleaseClaimRequest, ReleaseClaimResponse, SetPinRequest,
    SetPinResponse, authenticate_stub,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use crate::AppState;
use crate::error::HttpError;

/// A request body carrying the acting user next to the operation's fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest<T> {
    /// The actor ID performing this action.
    pub actor_id: String,
    #[serde(flatten)]
    pub request: T,
}

impl<T> ActorRequest<T> {
    fn authenticate(&self) -> Result<AuthenticatedActor, HttpError> {
        Ok(authenticate_stub(&self.actor_id)?)
    }
}

/// A body with nothing but the actor.
#[derive(Debug, Default, Deserialize)]
pub struct NoFields {}

/// Query parameters for listing manifests.
#[derive(Debug, Deserialize)]
pub struct ManifestListQuery {
    #[serde(rename = "type")]
    pub manifest_type: Option<String>,
    pub status: Option<String>,
}

/// Query parameters for reading the audit trail.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

/// Handler for GET `/invoices/{id}/guard/cancel`.
pub async fn handle_guard_cancel(
    AxumState(app_state): AxumState<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<GuardCheckResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::can_cancel(
        &mut persistence,
        &invoice_id,
    )?))
}

/// Handler for GET `/invoices/{id}/guard/collect`.
pub async fn handle_guard_collect(
    AxumState(app_state): AxumState<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<GuardCheckResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::can_mark_paid(
        &mut persistence,
        &invoice_id,
    )?))
}

/// Handler for POST `/invoices/{id}/cancel`.
///
/// Issues a storno at the invoicing provider when a confirmed return
/// manifest proves the return, or when the override PIN is supplied.
pub async fn handle_cancel_invoice(
    AxumState(app_state): AxumState<AppState>,
    Path(invoice_id): Path<String>,
    Json(req): Json<ActorRequest<CancelInvoiceRequest>>,
) -> Result<Json<GuardedOperationResponse>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        invoice_id = %invoice_id,
        with_pin = req.request.pin.is_some(),
        "Handling cancel_invoice request"
    );
    let actor: AuthenticatedActor = req.authenticate()?;

    let response: GuardedOperationResponse = manifest_guard_api::cancel_invoice(
        &app_state.persistence,
        &app_state.client,
        &app_state.policy,
        &invoice_id,
        &req.request,
        &actor,
        OffsetDateTime::now_utc(),
    )
    .await?;

    info!(
        invoice_id = %invoice_id,
        source = %response.source,
        "Invoice cancelled"
    );
    Ok(Json(response))
}

/// Handler for POST `/invoices/{id}/collect`.
pub async fn handle_collect_invoice(
    AxumState(app_state): AxumState<AppState>,
    Path(invoice_id): Path<String>,
    Json(req): Json<ActorRequest<CollectInvoiceRequest>>,
) -> Result<Json<GuardedOperationResponse>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        invoice_id = %invoice_id,
        with_pin = req.request.pin.is_some(),
        "Handling collect_invoice request"
    );
    let actor: AuthenticatedActor = req.authenticate()?;

    let response: GuardedOperationResponse = manifest_guard_api::collect_invoice(
        &app_state.persistence,
        &app_state.client,
        &app_state.policy,
        &invoice_id,
        &req.request,
        &actor,
        OffsetDateTime::now_utc(),
    )
    .await?;

    info!(
        invoice_id = %invoice_id,
        source = %response.source,
        "Invoice collected"
    );
    Ok(Json(response))
}

/// Handler for POST `/invoices/{id}/release-claim`.
///
/// Frees an invoice left held by an operation whose ledger outcome was never
/// recorded.
pub async fn handle_release_invoice_claim(
    AxumState(app_state): AxumState<AppState>,
    Path(invoice_id): Path<String>,
    Json(req): Json<ActorRequest<ReleaseClaimRequest>>,
) -> Result<Json<ReleaseClaimResponse>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        invoice_id = %invoice_id,
        "Handling release_invoice_claim request"
    );
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::release_invoice_claim(
        &mut persistence,
        &app_state.policy,
        &invoice_id,
        &req.request,
        &actor,
        OffsetDateTime::now_utc(),
    )?))
}

/// Handler for POST `/manifests/returns/generate`.
///
/// Answers 201 when a manifest was written and 200 when nothing new was
/// found.
pub async fn handle_generate_return_manifest(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ActorRequest<GenerateReturnManifestRequest>>,
) -> Result<(StatusCode, Json<GenerateReturnManifestResponse>), HttpError> {
    info!(actor_id = %req.actor_id, "Handling generate_return_manifest request");
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    let response: GenerateReturnManifestResponse = manifest_guard_api::generate_return_manifest(
        &mut persistence,
        &req.request,
        &actor,
        OffsetDateTime::now_utc().date(),
    )?;
    drop(persistence);

    let status: StatusCode = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

/// Handler for POST `/manifests/delivery`.
pub async fn handle_create_delivery_manifest(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ActorRequest<CreateDeliveryManifestRequest>>,
) -> Result<(StatusCode, Json<CreateDeliveryManifestResponse>), HttpError> {
    info!(
        actor_id = %req.actor_id,
        item_count = req.request.items.len(),
        "Handling create_delivery_manifest request"
    );
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateDeliveryManifestResponse = manifest_guard_api::create_delivery_manifest(
        &mut persistence,
        &req.request,
        &actor,
        OffsetDateTime::now_utc().date(),
    )?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET `/manifests`.
pub async fn handle_list_manifests(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ManifestListQuery>,
) -> Result<Json<Vec<ManifestResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::list_manifests(
        &mut persistence,
        query.manifest_type.as_deref(),
        query.status.as_deref(),
    )?))
}

/// Handler for GET `/manifests/{id}`.
pub async fn handle_get_manifest(
    AxumState(app_state): AxumState<AppState>,
    Path(manifest_id): Path<i64>,
) -> Result<Json<ManifestDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::get_manifest(
        &mut persistence,
        manifest_id,
    )?))
}

/// Handler for POST `/manifests/{id}/confirm`.
pub async fn handle_confirm_manifest(
    AxumState(app_state): AxumState<AppState>,
    Path(manifest_id): Path<i64>,
    Json(req): Json<ActorRequest<NoFields>>,
) -> Result<Json<ManifestResponse>, HttpError> {
    info!(actor_id = %req.actor_id, manifest_id, "Handling confirm_manifest request");
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::confirm_manifest(
        &mut persistence,
        manifest_id,
        &actor,
    )?))
}

/// Handler for POST `/manifests/{id}/process`.
pub async fn handle_process_manifest(
    AxumState(app_state): AxumState<AppState>,
    Path(manifest_id): Path<i64>,
    Json(req): Json<ActorRequest<NoFields>>,
) -> Result<Json<ManifestResponse>, HttpError> {
    info!(actor_id = %req.actor_id, manifest_id, "Handling process_manifest request");
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::process_manifest(
        &mut persistence,
        manifest_id,
        &actor,
    )?))
}

/// Handler for POST `/manifest-items/{id}/outcome`.
pub async fn handle_record_item_outcome(
    AxumState(app_state): AxumState<AppState>,
    Path(item_id): Path<i64>,
    Json(req): Json<ActorRequest<RecordItemOutcomeRequest>>,
) -> Result<Json<ManifestItemResponse>, HttpError> {
    info!(
        actor_id = %req.actor_id,
        item_id,
        status = %req.request.status,
        "Handling record_item_outcome request"
    );
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::record_item_outcome(
        &mut persistence,
        item_id,
        &req.request,
        &actor,
    )?))
}

/// Handler for GET `/override-pin`.
pub async fn handle_pin_status(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<PinStatusResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::pin_status(
        &mut persistence,
        OffsetDateTime::now_utc(),
    )?))
}

/// Handler for POST `/override-pin`.
pub async fn handle_set_pin(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ActorRequest<SetPinRequest>>,
) -> Result<Json<SetPinResponse>, HttpError> {
    info!(actor_id = %req.actor_id, "Handling set_override_pin request");
    let actor: AuthenticatedActor = req.authenticate()?;

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::set_override_pin(
        &mut persistence,
        &app_state.policy,
        &req.request,
        &actor,
        OffsetDateTime::now_utc(),
    )?))
}

/// Handler for GET `/audit`.
pub async fn handle_list_audit_entries(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntryResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(manifest_guard_api::list_audit_entries(
        &mut persistence,
        query.entity_type.as_deref(),
        query.entity_id.as_deref(),
    )?))
}
