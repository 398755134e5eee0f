// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use manifest_guard_audit::Actor;
use manifest_guard_domain::{
    BillingCompany, CollectType, InvoiceStatus, ManifestStatus, PaymentStatus,
    ScannedReturnStatus,
};
use manifest_guard_invoicing::{
    CollectOutcome, InvoicingClient, InvoicingError, StornoOutcome,
};
use manifest_guard_persistence::{
    GenerationOutcome, MIN_PIN_HASH_COST, NewInvoice, NewManifestItem, NewScannedReturn,
    Persistence,
};
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};
use tokio::sync::Notify;

use crate::{AuthenticatedActor, OverridePolicy, SetPinRequest, set_override_pin};

pub const TEST_PIN: &str = "482913";
pub const WRONG_PIN: &str = "000000";

pub fn create_test_actor() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("operator-1"))
}

pub fn test_policy() -> OverridePolicy {
    OverridePolicy::new(3, 15, MIN_PIN_HASH_COST).unwrap()
}

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-14 12:00 UTC)
}

pub fn test_today() -> Date {
    date!(2026 - 03 - 14)
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create persistence")
}

/// Seeds company `c1` (VAT `RO123`), store `s1` and an order in that store.
pub fn seed_order(persistence: &mut Persistence, order_id: &str) {
    if persistence.get_order_status(order_id).unwrap().is_some() {
        return;
    }
    let _ = persistence.insert_company("c1", "Acme Retail SRL", "RO123");
    let _ = persistence.insert_store("s1", "Main store", Some("c1"));
    persistence
        .insert_order(order_id, Some("s1"), "processing")
        .unwrap();
}

pub fn issued_invoice(invoice_id: &str, order_id: Option<&str>) -> NewInvoice {
    NewInvoice {
        invoice_id: invoice_id.to_string(),
        order_id: order_id.map(str::to_string),
        company_id: None,
        series: String::from("FCT"),
        number: format!("{invoice_id}-NR"),
        status: InvoiceStatus::Issued,
        payment_status: PaymentStatus::Unpaid,
        created_at: String::from("2026-03-01T10:00:00Z"),
    }
}

pub fn seed_invoice(persistence: &mut Persistence, invoice_id: &str, order_id: &str) {
    seed_order(persistence, order_id);
    persistence
        .insert_invoice(&issued_invoice(invoice_id, Some(order_id)))
        .unwrap();
}

/// Seeds a received return for `order_id` and generates a return manifest
/// holding it, optionally confirming the manifest.
pub fn return_manifest_for(
    persistence: &mut Persistence,
    order_id: &str,
    awb_number: &str,
    confirm: bool,
) -> i64 {
    seed_order(persistence, order_id);
    persistence
        .insert_scanned_return(&NewScannedReturn {
            return_id: format!("r-{awb_number}"),
            awb_number: awb_number.to_string(),
            status: ScannedReturnStatus::Received,
            order_id: Some(order_id.to_string()),
            original_shipment_id: None,
            scanned_at: String::from("2026-03-10T09:00:00Z"),
        })
        .unwrap();
    let actor = Actor::user("warehouse-1");
    let GenerationOutcome::Created { manifest_id, .. } = persistence
        .generate_return_manifest(test_today(), None, &actor)
        .unwrap()
    else {
        panic!("expected a return manifest");
    };
    if confirm {
        persistence
            .transition_manifest(
                manifest_id,
                ManifestStatus::Draft,
                ManifestStatus::Confirmed,
                &actor,
            )
            .unwrap();
    }
    manifest_id
}

/// Creates a delivery manifest carrying `invoice_id`, optionally confirmed.
pub fn delivery_manifest_for(
    persistence: &mut Persistence,
    invoice_id: &str,
    awb_number: &str,
    confirm: bool,
) -> i64 {
    let actor = Actor::user("dispatch-1");
    let manifest_id = persistence
        .create_delivery_manifest(
            test_today(),
            &[NewManifestItem {
                awb_number: awb_number.to_string(),
                original_awb_number: None,
                order_id: None,
                invoice_id: Some(invoice_id.to_string()),
            }],
            &actor,
        )
        .unwrap();
    if confirm {
        persistence
            .transition_manifest(
                manifest_id,
                ManifestStatus::Draft,
                ManifestStatus::Confirmed,
                &actor,
            )
            .unwrap();
    }
    manifest_id
}

pub fn configure_pin(persistence: &mut Persistence) {
    set_override_pin(
        persistence,
        &test_policy(),
        &SetPinRequest {
            new_pin: TEST_PIN.to_string(),
            current_pin: None,
        },
        &AuthenticatedActor::new(String::from("supervisor-1")),
        test_now(),
    )
    .unwrap();
}

/// A ledger call seen by the fake provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Storno {
        vat_code: String,
        series: String,
        number: String,
    },
    Collect {
        vat_code: String,
        series: String,
        number: String,
        collect_type: CollectType,
    },
}

#[derive(Debug, Clone)]
enum Behaviour {
    Succeed,
    Refuse(String),
    Unreachable,
    /// Accepts, but the answer cannot be read.
    Unreadable,
    /// Accepts once the gate is opened.
    Gated(Arc<Notify>),
}

/// Invoicing provider double that records every call.
#[derive(Debug)]
pub struct FakeInvoicingClient {
    behaviour: Behaviour,
    calls: Mutex<Vec<LedgerCall>>,
}

impl FakeInvoicingClient {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with(Behaviour::Succeed)
    }

    pub fn refusing(message: &str) -> Self {
        Self::with(Behaviour::Refuse(message.to_string()))
    }

    pub fn unreachable() -> Self {
        Self::with(Behaviour::Unreachable)
    }

    pub fn unreadable() -> Self {
        Self::with(Behaviour::Unreadable)
    }

    /// A provider that answers only after `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self::with(Behaviour::Gated(gate))
    }

    /// Shares this fake as the client operations take.
    pub fn shared(self: &Arc<Self>) -> Arc<dyn InvoicingClient> {
        Arc::clone(self) as Arc<dyn InvoicingClient>
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvoicingClient for FakeInvoicingClient {
    async fn storno(
        &self,
        company: &BillingCompany,
        series: &str,
        number: &str,
    ) -> Result<StornoOutcome, InvoicingError> {
        self.calls.lock().unwrap().push(LedgerCall::Storno {
            vat_code: company.vat_code.clone(),
            series: series.to_string(),
            number: number.to_string(),
        });
        if let Behaviour::Gated(gate) = &self.behaviour {
            gate.notified().await;
        }
        match &self.behaviour {
            Behaviour::Succeed | Behaviour::Gated(_) => Ok(StornoOutcome {
                success: true,
                new_series: Some(String::from("STR")),
                new_number: Some(String::from("0042")),
                error: None,
            }),
            Behaviour::Refuse(message) => Ok(StornoOutcome::failed(message.clone())),
            Behaviour::Unreachable => Err(InvoicingError::Transport(String::from(
                "connection refused",
            ))),
            Behaviour::Unreadable => Err(InvoicingError::UnreadableAcceptance(String::from(
                "expected value at line 1 column 1",
            ))),
        }
    }

    async fn collect(
        &self,
        company: &BillingCompany,
        series: &str,
        number: &str,
        collect_type: CollectType,
    ) -> Result<CollectOutcome, InvoicingError> {
        self.calls.lock().unwrap().push(LedgerCall::Collect {
            vat_code: company.vat_code.clone(),
            series: series.to_string(),
            number: number.to_string(),
            collect_type,
        });
        if let Behaviour::Gated(gate) = &self.behaviour {
            gate.notified().await;
        }
        match &self.behaviour {
            Behaviour::Succeed | Behaviour::Gated(_) => Ok(CollectOutcome {
                success: true,
                error: None,
            }),
            Behaviour::Refuse(message) => Ok(CollectOutcome::failed(message.clone())),
            Behaviour::Unreachable => Err(InvoicingError::Transport(String::from(
                "connection refused",
            ))),
            Behaviour::Unreadable => Err(InvoicingError::UnreadableAcceptance(String::from(
                "expected value at line 1 column 1",
            ))),
        }
    }
}
