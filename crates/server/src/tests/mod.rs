// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod error_mapping_tests;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use manifest_guard_api::OverridePolicy;
use manifest_guard_domain::{BillingCompany, CollectType, InvoiceStatus, PaymentStatus};
use manifest_guard_invoicing::{
    CollectOutcome, InvoicingClient, InvoicingError, StornoOutcome, UnconfiguredInvoicingClient,
};
use manifest_guard_persistence::{MIN_PIN_HASH_COST, NewInvoice, Persistence};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::{AppState, build_router};

/// Provider double that accepts every call.
#[derive(Debug, Default)]
pub struct AcceptingClient {
    pub calls: std::sync::Mutex<usize>,
}

#[async_trait]
impl InvoicingClient for AcceptingClient {
    async fn storno(
        &self,
        _company: &BillingCompany,
        _series: &str,
        _number: &str,
    ) -> Result<StornoOutcome, InvoicingError> {
        *self.calls.lock().unwrap() += 1;
        Ok(StornoOutcome {
            success: true,
            new_series: Some(String::from("STR")),
            new_number: Some(String::from("0007")),
            error: None,
        })
    }

    async fn collect(
        &self,
        _company: &BillingCompany,
        _series: &str,
        _number: &str,
        _collect_type: CollectType,
    ) -> Result<CollectOutcome, InvoicingError> {
        *self.calls.lock().unwrap() += 1;
        Ok(CollectOutcome {
            success: true,
            error: None,
        })
    }
}

/// Provider double whose acceptance can never be read.
#[derive(Debug, Default)]
pub struct GarbledClient;

#[async_trait]
impl InvoicingClient for GarbledClient {
    async fn storno(
        &self,
        _company: &BillingCompany,
        _series: &str,
        _number: &str,
    ) -> Result<StornoOutcome, InvoicingError> {
        Err(InvoicingError::UnreadableAcceptance(String::from(
            "expected value at line 1 column 1",
        )))
    }

    async fn collect(
        &self,
        _company: &BillingCompany,
        _series: &str,
        _number: &str,
        _collect_type: CollectType,
    ) -> Result<CollectOutcome, InvoicingError> {
        Err(InvoicingError::UnreadableAcceptance(String::from(
            "expected value at line 1 column 1",
        )))
    }
}

fn seeded_persistence() -> Persistence {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory persistence");
    persistence
        .insert_company("c1", "Acme Retail SRL", "RO123")
        .unwrap();
    persistence
        .insert_store("s1", "Main store", Some("c1"))
        .unwrap();
    persistence
        .insert_order("o1", Some("s1"), "processing")
        .unwrap();
    persistence
        .insert_invoice(&NewInvoice {
            invoice_id: String::from("i1"),
            order_id: Some(String::from("o1")),
            company_id: None,
            series: String::from("FCT"),
            number: String::from("1001"),
            status: InvoiceStatus::Issued,
            payment_status: PaymentStatus::Unpaid,
            created_at: String::from("2026-03-01T10:00:00Z"),
        })
        .unwrap();
    persistence
}

/// Helper to create test app state around the given provider double.
pub fn create_test_app_state(client: Arc<dyn InvoicingClient>) -> AppState {
    AppState {
        persistence: Arc::new(Mutex::new(seeded_persistence())),
        client,
        policy: OverridePolicy::new(3, 15, MIN_PIN_HASH_COST).unwrap(),
    }
}

pub fn create_unconfigured_app_state() -> AppState {
    create_test_app_state(Arc::new(UnconfiguredInvoicingClient))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request: Request<Body> = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

pub fn test_router(app_state: AppState) -> Router {
    build_router(app_state)
}
