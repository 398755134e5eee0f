// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use manifest_guard_audit::{AuditAction, AuditEntry, EntityType};
use manifest_guard_domain::{
    CollectType, GuardedOperation, InvoiceStatus, OperationSource, PaymentStatus,
};
use std::sync::Arc;

use manifest_guard_persistence::{InvoiceData, Persistence};
use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex, Notify};

use super::helpers::{
    FakeInvoicingClient, LedgerCall, TEST_PIN, WRONG_PIN, configure_pin, create_test_actor,
    create_test_persistence, delivery_manifest_for, issued_invoice, return_manifest_for,
    seed_invoice, test_now, test_policy,
};
use crate::{
    ApiError, AuthenticatedActor, CancelInvoiceRequest, CollectInvoiceRequest, GuardedOperationResponse,
    ReleaseClaimRequest, ReleaseClaimResponse, cancel_invoice, collect_invoice,
    release_invoice_claim,
};

fn seeded() -> Persistence {
    let mut persistence: Persistence = create_test_persistence();
    seed_invoice(&mut persistence, "i1", "o1");
    persistence
}

fn with_pin() -> Persistence {
    let mut persistence: Persistence = seeded();
    configure_pin(&mut persistence);
    persistence
}

fn pin_request(pin: &str, reason: &str) -> CancelInvoiceRequest {
    CancelInvoiceRequest {
        pin: Some(pin.to_string()),
        reason: Some(reason.to_string()),
    }
}

async fn invoice(persistence: &Mutex<Persistence>, invoice_id: &str) -> InvoiceData {
    persistence
        .lock()
        .await
        .get_invoice_context(invoice_id)
        .unwrap()
        .invoice
}

async fn invoice_audit(persistence: &Mutex<Persistence>, invoice_id: &str) -> Vec<AuditEntry> {
    persistence
        .lock()
        .await
        .list_audit_entries(Some(EntityType::Invoice), Some(invoice_id))
        .unwrap()
}

fn shared(persistence: Persistence) -> Arc<Mutex<Persistence>> {
    Arc::new(Mutex::new(persistence))
}

async fn release(
    persistence: &Mutex<Persistence>,
    reason: &str,
    now: OffsetDateTime,
) -> Result<ReleaseClaimResponse, ApiError> {
    release_invoice_claim(
        &mut *persistence.lock().await,
        &test_policy(),
        "i1",
        &ReleaseClaimRequest {
            reason: reason.to_string(),
        },
        &AuthenticatedActor::new(String::from("supervisor-1")),
        now,
    )
}

async fn cancel(
    persistence: &Arc<Mutex<Persistence>>,
    client: &Arc<FakeInvoicingClient>,
    request: &CancelInvoiceRequest,
) -> Result<GuardedOperationResponse, ApiError> {
    cancel_invoice(
        persistence,
        &client.shared(),
        &test_policy(),
        "i1",
        request,
        &create_test_actor(),
        test_now(),
    )
    .await
}

#[tokio::test]
async fn test_cancel_without_evidence_or_pin_is_blocked() {
    let persistence = shared(seeded());
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let result = cancel(&persistence, &client, &CancelInvoiceRequest::default()).await;

    match result {
        Err(ApiError::GuardBlocked {
            reason,
            draft_manifest_id,
        }) => {
            assert!(!reason.is_empty());
            assert_eq!(draft_manifest_id, None);
        }
        other => panic!("expected GuardBlocked, got {other:?}"),
    }
    assert!(client.calls().is_empty());
    assert_eq!(invoice(&persistence, "i1").await.status, InvoiceStatus::Issued);
    assert!(invoice_audit(&persistence, "i1").await.is_empty());
}

#[tokio::test]
async fn test_cancel_with_override_pin_after_block() {
    let persistence = shared(with_pin());
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let blocked = cancel(&persistence, &client, &CancelInvoiceRequest::default()).await;
    assert!(matches!(blocked, Err(ApiError::GuardBlocked { .. })));

    let response: GuardedOperationResponse = cancel(
        &persistence,
        &client,
        &pin_request(TEST_PIN, "Customer refused the parcel"),
    )
    .await
    .unwrap();

    assert!(response.success);
    assert_eq!(response.source, OperationSource::PinOverride);
    assert_eq!(response.manifest_id, None);
    assert_eq!(response.draft_manifest_id, None);
    assert_eq!(response.storno_series.as_deref(), Some("STR"));
    assert_eq!(response.storno_number.as_deref(), Some("0042"));

    assert_eq!(
        client.calls(),
        vec![LedgerCall::Storno {
            vat_code: String::from("RO123"),
            series: String::from("FCT"),
            number: String::from("i1-NR"),
        }]
    );

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.status, InvoiceStatus::Cancelled);
    assert_eq!(stored.cancellation_source, Some(OperationSource::PinOverride));
    assert_eq!(stored.storno_number.as_deref(), Some("0042"));
    assert_eq!(stored.pending_operation, None);
    assert_eq!(
        persistence.lock().await.get_order_status("o1").unwrap(),
        Some(String::from("cancelled"))
    );

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].entry_id, Some(response.audit_entry_id));
    assert_eq!(audit[0].actor.id, "operator-1");
    match &audit[0].action {
        AuditAction::CancelViaOverride {
            reason,
            draft_manifest_id,
            ..
        } => {
            assert_eq!(reason.as_deref(), Some("Customer refused the parcel"));
            assert_eq!(*draft_manifest_id, None);
        }
        other => panic!("unexpected audit action {other:?}"),
    }
}

#[tokio::test]
async fn test_override_audits_the_draft_manifest_without_linking_it() {
    let mut seeded: Persistence = with_pin();
    let draft_id: i64 = return_manifest_for(&mut seeded, "o1", "RET001", false);
    let persistence = shared(seeded);
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let blocked = cancel(&persistence, &client, &CancelInvoiceRequest::default()).await;
    assert!(matches!(
        blocked,
        Err(ApiError::GuardBlocked {
            draft_manifest_id: Some(id),
            ..
        }) if id == draft_id
    ));

    let response: GuardedOperationResponse =
        cancel(&persistence, &client, &pin_request(TEST_PIN, "   "))
            .await
            .unwrap();

    assert_eq!(response.source, OperationSource::PinOverride);
    assert_eq!(response.manifest_id, None);
    assert_eq!(response.draft_manifest_id, Some(draft_id));

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.status, InvoiceStatus::Cancelled);
    assert_eq!(stored.cancelled_from_manifest_id, None);

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert!(matches!(
        &audit[0].action,
        AuditAction::CancelViaOverride {
            draft_manifest_id: Some(id),
            reason: None,
            ..
        } if *id == draft_id
    ));
}

#[tokio::test]
async fn test_cancel_proven_by_confirmed_return_manifest() {
    let mut seeded: Persistence = seeded();
    let manifest_id: i64 = return_manifest_for(&mut seeded, "o1", "RET001", true);
    let persistence = shared(seeded);
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let response: GuardedOperationResponse =
        cancel(&persistence, &client, &CancelInvoiceRequest::default())
            .await
            .unwrap();

    assert_eq!(response.source, OperationSource::Manifest);
    assert_eq!(response.manifest_id, Some(manifest_id));

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.cancellation_source, Some(OperationSource::Manifest));
    assert_eq!(stored.cancelled_from_manifest_id, Some(manifest_id));

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action.name(), "cancel_via_manifest");
}

#[tokio::test]
async fn test_second_cancel_conflicts_without_ledger_call() {
    let mut seeded: Persistence = seeded();
    return_manifest_for(&mut seeded, "o1", "RET001", true);
    let persistence = shared(seeded);
    let client = Arc::new(FakeInvoicingClient::succeeding());

    cancel(&persistence, &client, &CancelInvoiceRequest::default())
        .await
        .unwrap();
    let second = cancel(&persistence, &client, &CancelInvoiceRequest::default()).await;

    assert!(matches!(second, Err(ApiError::Conflict { .. })));
    assert_eq!(client.calls().len(), 1);
    assert_eq!(invoice_audit(&persistence, "i1").await.len(), 1);
}

#[tokio::test]
async fn test_wrong_pin_changes_nothing() {
    let persistence = shared(with_pin());
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let result = cancel(&persistence, &client, &pin_request(WRONG_PIN, "damaged")).await;

    match result {
        Err(ApiError::InvalidOverride { message }) => {
            assert_eq!(message, "Invalid override PIN");
        }
        other => panic!("expected InvalidOverride, got {other:?}"),
    }
    assert!(client.calls().is_empty());

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.status, InvoiceStatus::Issued);
    assert_eq!(stored.pending_operation, None);

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert_eq!(
        audit[0].action,
        AuditAction::OverrideRejected {
            operation: GuardedOperation::Cancel,
            reason: Some(String::from("damaged")),
            failed_attempts: 1,
            locked_until: None,
        }
    );
}

#[tokio::test]
async fn test_repeated_failures_lock_the_override() {
    let persistence = shared(with_pin());
    let client = Arc::new(FakeInvoicingClient::succeeding());
    let request: CancelInvoiceRequest = pin_request(WRONG_PIN, "damaged");

    for _ in 0..2 {
        let result = cancel(&persistence, &client, &request).await;
        assert!(matches!(result, Err(ApiError::InvalidOverride { .. })));
    }

    match cancel(&persistence, &client, &request).await {
        Err(ApiError::InvalidOverride { message }) => assert_eq!(
            message,
            "Invalid override PIN; override locked until 2026-03-14T12:15:00Z"
        ),
        other => panic!("expected InvalidOverride, got {other:?}"),
    }

    let locked = cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")).await;
    assert_eq!(
        locked.unwrap_err(),
        ApiError::OverrideLockedOut {
            until: String::from("2026-03-14T12:15:00Z"),
        }
    );
    assert!(client.calls().is_empty());

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 4);
    assert_eq!(audit[3].action.name(), "override_locked_out");

    let after_lockout = cancel_invoice(
        &persistence,
        &client.shared(),
        &test_policy(),
        "i1",
        &pin_request(TEST_PIN, "damaged"),
        &create_test_actor(),
        test_now() + Duration::minutes(16),
    )
    .await
    .unwrap();
    assert_eq!(after_lockout.source, OperationSource::PinOverride);
}

#[tokio::test]
async fn test_pin_without_configured_credential_is_rejected() {
    let persistence = shared(seeded());
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let result = cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")).await;

    assert_eq!(
        result.unwrap_err(),
        ApiError::InvalidOverride {
            message: String::from("No override PIN is configured"),
        }
    );
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_ledger_refusal_releases_the_claim() {
    let persistence = shared(with_pin());
    let refusing = Arc::new(FakeInvoicingClient::refusing("Invoice already reversed"));

    let result = cancel(&persistence, &refusing, &pin_request(TEST_PIN, "damaged")).await;

    assert_eq!(
        result.unwrap_err(),
        ApiError::ExternalServiceFailure {
            message: String::from("Invoice already reversed"),
        }
    );
    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.status, InvoiceStatus::Issued);
    assert_eq!(stored.pending_operation, None);

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(
        audit[0].action,
        AuditAction::LedgerCallFailed {
            operation: GuardedOperation::Cancel,
            source: OperationSource::PinOverride,
            message: String::from("Invoice already reversed"),
        }
    );

    let succeeding = Arc::new(FakeInvoicingClient::succeeding());
    let retry = cancel(&persistence, &succeeding, &pin_request(TEST_PIN, "damaged")).await;
    assert!(retry.is_ok());
    assert_eq!(succeeding.calls().len(), 1);
}

#[tokio::test]
async fn test_unreachable_ledger_is_an_external_failure() {
    let persistence = shared(with_pin());
    let client = Arc::new(FakeInvoicingClient::unreachable());

    let result = cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")).await;

    match result {
        Err(ApiError::ExternalServiceFailure { message }) => {
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected ExternalServiceFailure, got {other:?}"),
    }
    assert_eq!(invoice(&persistence, "i1").await.pending_operation, None);
}

#[tokio::test]
async fn test_invoice_without_billing_company_is_rejected() {
    let mut seeded: Persistence = create_test_persistence();
    seeded.insert_invoice(&issued_invoice("i1", None)).unwrap();
    configure_pin(&mut seeded);
    let persistence = shared(seeded);
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let result = cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")).await;

    assert!(matches!(
        result,
        Err(ApiError::ValidationFailure { ref field, .. }) if field == "billingCompany"
    ));
    assert!(client.calls().is_empty());
    assert_eq!(invoice(&persistence, "i1").await.pending_operation, None);

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert_eq!(
        audit[0].action,
        AuditAction::OverrideAccepted {
            operation: GuardedOperation::Cancel,
            reason: Some(String::from("damaged")),
            draft_manifest_id: None,
        }
    );
}

#[tokio::test]
async fn test_unknown_invoice_is_not_found() {
    let persistence = shared(create_test_persistence());
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let result = cancel(&persistence, &client, &CancelInvoiceRequest::default()).await;

    assert!(matches!(result, Err(ApiError::NotFound { .. })));
}

#[tokio::test]
async fn test_collect_proven_by_confirmed_delivery_manifest() {
    let mut seeded: Persistence = seeded();
    let manifest_id: i64 = delivery_manifest_for(&mut seeded, "i1", "OUT001", true);
    let persistence = shared(seeded);
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let response: GuardedOperationResponse = collect_invoice(
        &persistence,
        &client.shared(),
        &test_policy(),
        "i1",
        &CollectInvoiceRequest::default(),
        &create_test_actor(),
        test_now(),
    )
    .await
    .unwrap();

    assert_eq!(response.source, OperationSource::Manifest);
    assert_eq!(response.manifest_id, Some(manifest_id));
    assert_eq!(response.storno_series, None);
    assert_eq!(
        client.calls(),
        vec![LedgerCall::Collect {
            vat_code: String::from("RO123"),
            series: String::from("FCT"),
            number: String::from("i1-NR"),
            collect_type: CollectType::CashOnDelivery,
        }]
    );

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.paid_from_manifest_id, Some(manifest_id));
    assert_eq!(stored.collect_type, Some(CollectType::CashOnDelivery));
    assert_eq!(
        persistence.lock().await.get_order_status("o1").unwrap(),
        Some(String::from("completed"))
    );

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action.name(), "collect_via_manifest");
}

#[tokio::test]
async fn test_collect_with_override_uses_requested_type() {
    let persistence = shared(with_pin());
    let client = Arc::new(FakeInvoicingClient::succeeding());

    let response: GuardedOperationResponse = collect_invoice(
        &persistence,
        &client.shared(),
        &test_policy(),
        "i1",
        &CollectInvoiceRequest {
            pin: Some(TEST_PIN.to_string()),
            reason: Some(String::from("Paid at the counter")),
            collect_type: Some(CollectType::Card),
        },
        &create_test_actor(),
        test_now(),
    )
    .await
    .unwrap();

    assert_eq!(response.source, OperationSource::PinOverride);
    assert_eq!(response.manifest_id, None);
    assert!(matches!(
        client.calls().as_slice(),
        [LedgerCall::Collect {
            collect_type: CollectType::Card,
            ..
        }]
    ));
    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.payment_source, Some(OperationSource::PinOverride));
    assert_eq!(stored.paid_from_manifest_id, None);
}

#[tokio::test]
async fn test_collect_on_cancelled_invoice_conflicts() {
    let mut seeded: Persistence = seeded();
    return_manifest_for(&mut seeded, "o1", "RET001", true);
    delivery_manifest_for(&mut seeded, "i1", "OUT001", true);
    let persistence = shared(seeded);
    let client = Arc::new(FakeInvoicingClient::succeeding());

    cancel(&persistence, &client, &CancelInvoiceRequest::default())
        .await
        .unwrap();
    let result = collect_invoice(
        &persistence,
        &client.shared(),
        &test_policy(),
        "i1",
        &CollectInvoiceRequest::default(),
        &create_test_actor(),
        test_now(),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Conflict { .. })));
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn test_dropped_request_still_completes_the_cancel() {
    let persistence = shared(with_pin());
    let gate = Arc::new(Notify::new());
    let client = Arc::new(FakeInvoicingClient::gated(Arc::clone(&gate)));

    let dropped = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")),
    )
    .await;
    assert!(dropped.is_err());

    for _ in 0..200 {
        if !client.calls().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(client.calls().len(), 1);
    assert_eq!(
        invoice(&persistence, "i1").await.pending_operation,
        Some(GuardedOperation::Cancel)
    );

    let concurrent = cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")).await;
    assert!(matches!(concurrent, Err(ApiError::Conflict { .. })));

    gate.notify_one();
    for _ in 0..200 {
        if invoice(&persistence, "i1").await.status == InvoiceStatus::Cancelled {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.status, InvoiceStatus::Cancelled);
    assert_eq!(stored.pending_operation, None);
    assert_eq!(stored.storno_number.as_deref(), Some("0042"));
    assert_eq!(client.calls().len(), 1);

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(
        audit.last().map(|entry| entry.action.name()),
        Some("cancel_via_override")
    );
}

#[tokio::test]
async fn test_unreadable_acceptance_keeps_the_invoice_held() {
    let persistence = shared(with_pin());
    let client = Arc::new(FakeInvoicingClient::unreadable());

    let result = cancel(&persistence, &client, &pin_request(TEST_PIN, "damaged")).await;

    match result {
        Err(ApiError::ExternalServiceFailure { message }) => {
            assert!(message.contains("unreadable"));
            assert!(message.contains("held"));
        }
        other => panic!("expected ExternalServiceFailure, got {other:?}"),
    }

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.status, InvoiceStatus::Issued);
    assert_eq!(stored.pending_operation, Some(GuardedOperation::Cancel));

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.len(), 1);
    assert!(matches!(
        &audit[0].action,
        AuditAction::LedgerOutcomeUnknown {
            operation: GuardedOperation::Cancel,
            source: OperationSource::PinOverride,
            ..
        }
    ));

    let succeeding = Arc::new(FakeInvoicingClient::succeeding());
    let retry = cancel(&persistence, &succeeding, &pin_request(TEST_PIN, "damaged")).await;
    assert!(matches!(retry, Err(ApiError::Conflict { .. })));
    assert!(succeeding.calls().is_empty());
    assert_eq!(
        invoice_audit(&persistence, "i1").await[1].action.name(),
        "override_accepted"
    );
}

#[tokio::test]
async fn test_held_invoice_is_released_only_after_the_delay() {
    let persistence = shared(with_pin());
    let unreadable = Arc::new(FakeInvoicingClient::unreadable());
    let _ = cancel(&persistence, &unreadable, &pin_request(TEST_PIN, "damaged")).await;
    let pending_since: Option<String> = invoice(&persistence, "i1").await.pending_since;
    assert!(pending_since.is_some());

    let blank = release(&persistence, "  ", OffsetDateTime::now_utc()).await;
    assert!(matches!(
        blank,
        Err(ApiError::ValidationFailure { ref field, .. }) if field == "reason"
    ));

    let early = release(
        &persistence,
        "Checked the provider, no storno issued",
        OffsetDateTime::now_utc(),
    )
    .await;
    assert!(matches!(early, Err(ApiError::Conflict { .. })));

    let released: ReleaseClaimResponse = release(
        &persistence,
        "Checked the provider, no storno issued",
        OffsetDateTime::now_utc() + Duration::minutes(11),
    )
    .await
    .unwrap();
    assert_eq!(released.released_operation, GuardedOperation::Cancel);
    assert_eq!(Some(released.pending_since), pending_since);

    let stored: InvoiceData = invoice(&persistence, "i1").await;
    assert_eq!(stored.pending_operation, None);
    assert_eq!(stored.pending_since, None);

    let audit: Vec<AuditEntry> = invoice_audit(&persistence, "i1").await;
    assert_eq!(audit.last().and_then(|entry| entry.entry_id), Some(released.audit_entry_id));
    assert_eq!(
        audit.last().map(|entry| entry.actor.id.as_str()),
        Some("supervisor-1")
    );

    let again = release(
        &persistence,
        "Checked the provider, no storno issued",
        OffsetDateTime::now_utc() + Duration::minutes(11),
    )
    .await;
    assert!(matches!(again, Err(ApiError::Conflict { .. })));

    let succeeding = Arc::new(FakeInvoicingClient::succeeding());
    let retry = cancel(&persistence, &succeeding, &pin_request(TEST_PIN, "damaged")).await;
    assert!(retry.is_ok());
    assert_eq!(succeeding.calls().len(), 1);
}
