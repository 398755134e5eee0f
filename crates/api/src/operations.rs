// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Guarded invoice operations.
//!
//! Cancelling an invoice and marking it as collected both follow the same
//! sequence:
//!
//! 1. load the invoice and check its state
//! 2. ask the guard; without manifest evidence an override PIN is required
//! 3. resolve the billing company
//! 4. claim the invoice so no concurrent request can reach the ledger
//! 5. call the external ledger without holding the database
//! 6. on refusal release the claim; on success write the invoice, its order
//!    and the audit entry in one transaction
//!
//! The sequence runs on its own task. A caller that goes away mid-call does
//! not cancel it, so the claim is always either completed or released once
//! the ledger answers. When the ledger answer cannot be read the claim is
//! kept, and a supervisor releases it with [`release_invoice_claim`] after
//! checking the provider.

use std::sync::Arc;

use manifest_guard::GuardDecision;
use manifest_guard_audit::{AuditAction, AuditEntry, EntityType};
use manifest_guard_domain::{
    BillingCompany, CollectType, GuardedOperation, OperationSource, resolve_billing_company,
};
use manifest_guard_invoicing::{InvoicingClient, InvoicingError};
use manifest_guard_persistence::{
    CancelCompletion, CollectCompletion, InvoiceContext, InvoiceData, Persistence,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::auth::AuthenticatedActor;
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::guard::evaluate_guard;
use crate::pin::{PinCheck, rejection_message, verify_override_pin};
use crate::policy::OverridePolicy;
use crate::request_response::{
    CancelInvoiceRequest, CollectInvoiceRequest, GuardedOperationResponse, ReleaseClaimRequest,
    ReleaseClaimResponse,
};

/// What allowed an operation to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    /// A confirmed or processed manifest of the matching type.
    Manifest { manifest_id: i64 },
    /// The override PIN; the draft manifest is recorded when one existed.
    Override { draft_manifest_id: Option<i64> },
}

impl Authority {
    const fn source(self) -> OperationSource {
        match self {
            Self::Manifest { .. } => OperationSource::Manifest,
            Self::Override { .. } => OperationSource::PinOverride,
        }
    }

    /// The manifest that proved the operation. Overrides have none, even
    /// when a draft manifest listed the invoice.
    const fn proving_manifest_id(self) -> Option<i64> {
        match self {
            Self::Manifest { manifest_id } => Some(manifest_id),
            Self::Override { .. } => None,
        }
    }

    const fn draft_manifest_id(self) -> Option<i64> {
        match self {
            Self::Manifest { .. } => None,
            Self::Override { draft_manifest_id } => draft_manifest_id,
        }
    }
}

/// The ledger call a guarded operation makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerRequest {
    Storno,
    Collect(CollectType),
}

impl LedgerRequest {
    const fn operation(self) -> GuardedOperation {
        match self {
            Self::Storno => GuardedOperation::Cancel,
            Self::Collect(_) => GuardedOperation::Collect,
        }
    }
}

/// How the ledger answered.
enum LedgerAnswer {
    Accepted {
        storno_series: Option<String>,
        storno_number: Option<String>,
    },
    /// Nothing changed at the provider.
    Refused(String),
    /// The provider may have applied the request.
    Unknown(String),
}

impl From<InvoicingError> for LedgerAnswer {
    fn from(err: InvoicingError) -> Self {
        if err.outcome_unknown() {
            Self::Unknown(err.to_string())
        } else {
            Self::Refused(err.to_string())
        }
    }
}

/// A claimed invoice that may be sent to the ledger.
struct Authorization {
    invoice: InvoiceData,
    company: BillingCompany,
    authority: Authority,
}

/// One request for a guarded operation, owned so it can outlive the caller.
struct GuardedTask {
    persistence: Arc<Mutex<Persistence>>,
    client: Arc<dyn InvoicingClient>,
    policy: OverridePolicy,
    invoice_id: String,
    request: LedgerRequest,
    pin: Option<String>,
    reason: Option<String>,
    actor: AuthenticatedActor,
    now: OffsetDateTime,
}

fn record_audit(persistence: &mut Persistence, entry: &AuditEntry) -> Result<(), ApiError> {
    persistence
        .append_audit_entry(entry)
        .map(|_| ())
        .map_err(translate_persistence_error)
}

impl GuardedTask {
    const fn operation(&self) -> GuardedOperation {
        self.request.operation()
    }

    fn reason(&self) -> Option<String> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string)
    }

    fn audit(&self, action: AuditAction) -> AuditEntry {
        AuditEntry::new(
            self.actor.to_audit_actor(),
            action,
            EntityType::Invoice,
            self.invoice_id.clone(),
        )
    }

    /// Runs the task on the runtime and waits for it.
    async fn spawn(self) -> Result<GuardedOperationResponse, ApiError> {
        tokio::spawn(self.run())
            .await
            .map_err(|e| ApiError::Internal {
                message: format!("Guarded operation task failed: {e}"),
            })?
    }

    async fn run(self) -> Result<GuardedOperationResponse, ApiError> {
        let authorization: Authorization = {
            let mut persistence = self.persistence.lock().await;
            self.authorize(&mut persistence)?
        };

        match self.call_ledger(&authorization).await {
            LedgerAnswer::Accepted {
                storno_series,
                storno_number,
            } => {
                self.complete(&authorization, storno_series, storno_number)
                    .await
            }
            LedgerAnswer::Refused(message) => Err(self.abort(&authorization, message).await),
            LedgerAnswer::Unknown(message) => Err(self.hold(&authorization, message).await),
        }
    }

    /// Settles the override path: verifies the PIN and audits the attempt.
    fn authorize_override(
        &self,
        persistence: &mut Persistence,
        guard_reason: String,
        draft_manifest_id: Option<i64>,
    ) -> Result<Authority, ApiError> {
        let invoice_id: &str = &self.invoice_id;
        let Some(pin) = self.pin.as_deref() else {
            info!(
                invoice_id,
                operation = self.operation().as_str(),
                "Guarded operation blocked"
            );
            return Err(ApiError::GuardBlocked {
                reason: guard_reason,
                draft_manifest_id,
            });
        };

        match verify_override_pin(persistence, &self.policy, pin, self.now)? {
            PinCheck::Valid => {
                info!(
                    invoice_id,
                    operation = self.operation().as_str(),
                    actor = %self.actor.id,
                    "Override PIN accepted"
                );
                Ok(Authority::Override { draft_manifest_id })
            }
            PinCheck::Invalid {
                failed_attempts,
                locked_until,
            } => {
                let message: String =
                    rejection_message("Invalid override PIN", locked_until.as_deref());
                record_audit(
                    persistence,
                    &self.audit(AuditAction::OverrideRejected {
                        operation: self.operation(),
                        reason: self.reason(),
                        failed_attempts,
                        locked_until,
                    }),
                )?;
                warn!(
                    invoice_id,
                    operation = self.operation().as_str(),
                    failed_attempts,
                    "Override PIN rejected"
                );
                Err(ApiError::InvalidOverride { message })
            }
            PinCheck::LockedOut { until } => {
                record_audit(
                    persistence,
                    &self.audit(AuditAction::OverrideLockedOut {
                        operation: self.operation(),
                        locked_until: until.clone(),
                    }),
                )?;
                Err(ApiError::OverrideLockedOut { until })
            }
            PinCheck::NotConfigured => {
                record_audit(
                    persistence,
                    &self.audit(AuditAction::OverrideRejected {
                        operation: self.operation(),
                        reason: self.reason(),
                        failed_attempts: 0,
                        locked_until: None,
                    }),
                )?;
                Err(ApiError::InvalidOverride {
                    message: String::from("No override PIN is configured"),
                })
            }
        }
    }

    /// Runs every check that precedes the ledger call and claims the invoice.
    ///
    /// A valid PIN is audited by the entry that ends the operation. When the
    /// operation stops before the ledger call, `OverrideAccepted` is that
    /// entry.
    fn authorize(&self, persistence: &mut Persistence) -> Result<Authorization, ApiError> {
        let invoice_id: &str = &self.invoice_id;
        let context: InvoiceContext = persistence
            .get_invoice_context(invoice_id)
            .map_err(translate_persistence_error)?;

        self.operation()
            .check_preconditions(
                invoice_id,
                context.invoice.status,
                context.invoice.payment_status,
            )
            .map_err(translate_domain_error)?;

        let authority: Authority =
            match evaluate_guard(persistence, &context, self.operation())? {
                GuardDecision::Allowed { manifest_id } => Authority::Manifest { manifest_id },
                GuardDecision::RequiresOverride {
                    reason,
                    draft_manifest_id,
                } => self.authorize_override(persistence, reason, draft_manifest_id)?,
            };

        match self.claim(persistence, context.invoice_company, context.store_company) {
            Ok(company) => Ok(Authorization {
                invoice: context.invoice,
                company,
                authority,
            }),
            Err(e) => {
                if let Authority::Override { draft_manifest_id } = authority {
                    record_audit(
                        persistence,
                        &self.audit(AuditAction::OverrideAccepted {
                            operation: self.operation(),
                            reason: self.reason(),
                            draft_manifest_id,
                        }),
                    )?;
                }
                Err(e)
            }
        }
    }

    /// Resolves the billing company and takes the invoice claim.
    fn claim(
        &self,
        persistence: &mut Persistence,
        invoice_company: Option<BillingCompany>,
        store_company: Option<BillingCompany>,
    ) -> Result<BillingCompany, ApiError> {
        let invoice_id: &str = &self.invoice_id;
        let company: BillingCompany = resolve_billing_company(invoice_company, store_company)
            .ok_or_else(|| ApiError::ValidationFailure {
                field: String::from("billingCompany"),
                message: format!(
                    "Invoice '{invoice_id}' has no company and its order's store has none either"
                ),
            })?;

        persistence
            .claim_invoice(invoice_id, self.operation())
            .map_err(translate_persistence_error)?;
        Ok(company)
    }

    async fn call_ledger(&self, authorization: &Authorization) -> LedgerAnswer {
        let company: &BillingCompany = &authorization.company;
        let invoice: &InvoiceData = &authorization.invoice;

        match self.request {
            LedgerRequest::Storno => {
                match self
                    .client
                    .storno(company, &invoice.series, &invoice.number)
                    .await
                {
                    Ok(outcome) if outcome.success => LedgerAnswer::Accepted {
                        storno_series: outcome.new_series,
                        storno_number: outcome.new_number,
                    },
                    Ok(outcome) => LedgerAnswer::Refused(
                        outcome
                            .error
                            .unwrap_or_else(|| String::from("Storno refused by provider")),
                    ),
                    Err(e) => e.into(),
                }
            }
            LedgerRequest::Collect(collect_type) => {
                match self
                    .client
                    .collect(company, &invoice.series, &invoice.number, collect_type)
                    .await
                {
                    Ok(outcome) if outcome.success => LedgerAnswer::Accepted {
                        storno_series: None,
                        storno_number: None,
                    },
                    Ok(outcome) => LedgerAnswer::Refused(
                        outcome
                            .error
                            .unwrap_or_else(|| String::from("Collection refused by provider")),
                    ),
                    Err(e) => e.into(),
                }
            }
        }
    }

    /// Releases the claim after a refused ledger call and audits the failure.
    async fn abort(&self, authorization: &Authorization, message: String) -> ApiError {
        let invoice_id: &str = &self.invoice_id;
        let mut persistence = self.persistence.lock().await;

        if let Err(e) = persistence.release_invoice_claim(invoice_id, self.operation()) {
            error!(invoice_id, error = %e, "Failed to release invoice claim");
        }

        let audit: AuditEntry = self.audit(AuditAction::LedgerCallFailed {
            operation: self.operation(),
            source: authorization.authority.source(),
            message: message.clone(),
        });
        if let Err(e) = persistence.append_audit_entry(&audit) {
            error!(invoice_id, error = %e, "Failed to audit ledger failure");
        }

        warn!(
            invoice_id,
            operation = self.operation().as_str(),
            %message,
            "Ledger call failed"
        );
        ApiError::ExternalServiceFailure { message }
    }

    /// Keeps the claim after an answer that could not be read and audits it.
    async fn hold(&self, authorization: &Authorization, message: String) -> ApiError {
        let invoice_id: &str = &self.invoice_id;

        let audit: AuditEntry = self.audit(AuditAction::LedgerOutcomeUnknown {
            operation: self.operation(),
            source: authorization.authority.source(),
            message: message.clone(),
        });
        if let Err(e) = self.persistence.lock().await.append_audit_entry(&audit) {
            error!(invoice_id, error = %e, "Failed to audit unknown ledger outcome");
        }

        error!(
            invoice_id,
            operation = self.operation().as_str(),
            %message,
            "Ledger outcome unknown; invoice stays claimed until reconciled"
        );
        ApiError::ExternalServiceFailure {
            message: format!(
                "{message}; invoice '{invoice_id}' is held until it is reconciled with the provider"
            ),
        }
    }

    /// Writes the final state after the ledger accepted the call.
    async fn complete(
        &self,
        authorization: &Authorization,
        storno_series: Option<String>,
        storno_number: Option<String>,
    ) -> Result<GuardedOperationResponse, ApiError> {
        let invoice_id: &str = &self.invoice_id;
        let invoice: &InvoiceData = &authorization.invoice;
        let authority: Authority = authorization.authority;
        let reason: Option<String> = self.reason();

        let written = match self.request {
            LedgerRequest::Storno => {
                let action: AuditAction = match authority {
                    Authority::Manifest { manifest_id } => AuditAction::CancelViaManifest {
                        series: invoice.series.clone(),
                        number: invoice.number.clone(),
                        storno_series: storno_series.clone(),
                        storno_number: storno_number.clone(),
                        manifest_id,
                        reason,
                    },
                    Authority::Override { draft_manifest_id } => AuditAction::CancelViaOverride {
                        series: invoice.series.clone(),
                        number: invoice.number.clone(),
                        storno_series: storno_series.clone(),
                        storno_number: storno_number.clone(),
                        draft_manifest_id,
                        reason,
                    },
                };
                let completion: CancelCompletion = CancelCompletion {
                    invoice_id: invoice.invoice_id.clone(),
                    order_id: invoice.order_id.clone(),
                    source: authority.source(),
                    manifest_id: authority.proving_manifest_id(),
                    storno_series: storno_series.clone(),
                    storno_number: storno_number.clone(),
                };
                self.persistence
                    .lock()
                    .await
                    .complete_cancel(&completion, &self.audit(action))
            }
            LedgerRequest::Collect(collect_type) => {
                let action: AuditAction = match authority {
                    Authority::Manifest { manifest_id } => AuditAction::CollectViaManifest {
                        series: invoice.series.clone(),
                        number: invoice.number.clone(),
                        collect_type,
                        manifest_id,
                        reason,
                    },
                    Authority::Override { draft_manifest_id } => {
                        AuditAction::CollectViaOverride {
                            series: invoice.series.clone(),
                            number: invoice.number.clone(),
                            collect_type,
                            draft_manifest_id,
                            reason,
                        }
                    }
                };
                let completion: CollectCompletion = CollectCompletion {
                    invoice_id: invoice.invoice_id.clone(),
                    order_id: invoice.order_id.clone(),
                    source: authority.source(),
                    manifest_id: authority.proving_manifest_id(),
                    collect_type,
                };
                self.persistence
                    .lock()
                    .await
                    .complete_collect(&completion, &self.audit(action))
            }
        };

        let audit_entry_id: i64 = written.map_err(|e| {
            error!(
                invoice_id,
                operation = self.operation().as_str(),
                storno_series = storno_series.as_deref(),
                storno_number = storno_number.as_deref(),
                error = %e,
                "Ledger accepted the call but local state could not be written"
            );
            translate_persistence_error(e)
        })?;

        info!(
            invoice_id,
            operation = self.operation().as_str(),
            source = %authority.source(),
            "Guarded operation completed"
        );
        Ok(GuardedOperationResponse {
            success: true,
            invoice_id: invoice.invoice_id.clone(),
            source: authority.source(),
            manifest_id: authority.proving_manifest_id(),
            draft_manifest_id: authority.draft_manifest_id(),
            storno_series,
            storno_number,
            audit_entry_id,
        })
    }
}

/// Cancels an invoice through a storno at the invoicing provider.
///
/// # Arguments
///
/// * `persistence` - The shared persistence layer
/// * `client` - The invoicing provider
/// * `policy` - Override PIN limits
/// * `invoice_id` - The invoice to cancel
/// * `request` - Optional override PIN and reason
/// * `authenticated_actor` - Who is cancelling
/// * `now` - The current time
///
/// # Errors
///
/// Returns an error if:
/// - the invoice does not exist (`NotFound`)
/// - it is already cancelled or held by another request (`Conflict`)
/// - no manifest proves the return and no PIN was given (`GuardBlocked`)
/// - the PIN is wrong or locked (`InvalidOverride`, `OverrideLockedOut`)
/// - the provider refuses, cannot be reached or answers unreadably
///   (`ExternalServiceFailure`)
pub async fn cancel_invoice(
    persistence: &Arc<Mutex<Persistence>>,
    client: &Arc<dyn InvoicingClient>,
    policy: &OverridePolicy,
    invoice_id: &str,
    request: &CancelInvoiceRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<GuardedOperationResponse, ApiError> {
    GuardedTask {
        persistence: Arc::clone(persistence),
        client: Arc::clone(client),
        policy: *policy,
        invoice_id: invoice_id.to_string(),
        request: LedgerRequest::Storno,
        pin: request.pin.clone(),
        reason: request.reason.clone(),
        actor: authenticated_actor.clone(),
        now,
    }
    .spawn()
    .await
}

/// Marks an invoice as collected at the invoicing provider.
///
/// # Arguments
///
/// * `persistence` - The shared persistence layer
/// * `client` - The invoicing provider
/// * `policy` - Override PIN limits
/// * `invoice_id` - The invoice to collect
/// * `request` - Optional override PIN, reason and collect type
/// * `authenticated_actor` - Who is collecting
/// * `now` - The current time
///
/// # Errors
///
/// Returns an error if:
/// - the invoice does not exist (`NotFound`)
/// - it is cancelled, already paid or held by another request (`Conflict`)
/// - no manifest proves the delivery and no PIN was given (`GuardBlocked`)
/// - the PIN is wrong or locked (`InvalidOverride`, `OverrideLockedOut`)
/// - the provider refuses, cannot be reached or answers unreadably
///   (`ExternalServiceFailure`)
pub async fn collect_invoice(
    persistence: &Arc<Mutex<Persistence>>,
    client: &Arc<dyn InvoicingClient>,
    policy: &OverridePolicy,
    invoice_id: &str,
    request: &CollectInvoiceRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<GuardedOperationResponse, ApiError> {
    GuardedTask {
        persistence: Arc::clone(persistence),
        client: Arc::clone(client),
        policy: *policy,
        invoice_id: invoice_id.to_string(),
        request: LedgerRequest::Collect(request.collect_type.unwrap_or_default()),
        pin: request.pin.clone(),
        reason: request.reason.clone(),
        actor: authenticated_actor.clone(),
        now,
    }
    .spawn()
    .await
}

/// Releases a claim left on an invoice by an operation whose ledger outcome
/// was never recorded.
///
/// The claim must have been held for at least the policy's release delay,
/// which is longer than any ledger call may take.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - Supplies the release delay
/// * `invoice_id` - The held invoice
/// * `request` - What the supervisor checked at the provider
/// * `authenticated_actor` - Who is releasing
/// * `now` - The current time
///
/// # Errors
///
/// Returns an error if:
/// - the reason is blank (`ValidationFailure`)
/// - the invoice does not exist (`NotFound`)
/// - the invoice is not held, or was claimed too recently (`Conflict`)
pub fn release_invoice_claim(
    persistence: &mut Persistence,
    policy: &OverridePolicy,
    invoice_id: &str,
    request: &ReleaseClaimRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<ReleaseClaimResponse, ApiError> {
    let reason: &str = request.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::ValidationFailure {
            field: String::from("reason"),
            message: String::from("A reason is required to release a held invoice"),
        });
    }

    let invoice: InvoiceData = persistence
        .get_invoice_context(invoice_id)
        .map_err(translate_persistence_error)?
        .invoice;
    let (Some(operation), Some(pending_since)) = (invoice.pending_operation, invoice.pending_since)
    else {
        return Err(ApiError::Conflict {
            message: format!("Invoice '{invoice_id}' is not held by any operation"),
        });
    };

    let claimed_at: OffsetDateTime =
        OffsetDateTime::parse(&pending_since, &Rfc3339).map_err(|e| ApiError::Internal {
            message: format!("Stored claim time could not be read: {e}"),
        })?;
    let releasable_at: OffsetDateTime = claimed_at + policy.claim_release_after;
    if now < releasable_at {
        let releasable_at: String =
            releasable_at
                .format(&Rfc3339)
                .map_err(|e| ApiError::Internal {
                    message: format!("Failed to format timestamp: {e}"),
                })?;
        return Err(ApiError::Conflict {
            message: format!(
                "Invoice '{invoice_id}' has been held since {pending_since} and cannot be released before {releasable_at}"
            ),
        });
    }

    let audit: AuditEntry = AuditEntry::new(
        authenticated_actor.to_audit_actor(),
        AuditAction::InvoiceClaimReleased {
            operation,
            pending_since: pending_since.clone(),
            reason: reason.to_string(),
        },
        EntityType::Invoice,
        invoice_id.to_string(),
    );
    let audit_entry_id: i64 = persistence
        .release_held_invoice(invoice_id, &pending_since, &audit)
        .map_err(translate_persistence_error)?;

    warn!(
        invoice_id,
        operation = operation.as_str(),
        %pending_since,
        actor = %authenticated_actor.id,
        "Held invoice released"
    );
    Ok(ReleaseClaimResponse {
        invoice_id: invoice_id.to_string(),
        released_operation: operation,
        pending_since,
        audit_entry_id,
    })
}
