// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use async_trait::async_trait;
use manifest_guard_domain::{BillingCompany, CollectType};
use tracing::warn;

use crate::error::InvoicingError;

/// Result of a storno request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StornoOutcome {
    pub success: bool,
    /// Series of the reversal document.
    pub new_series: Option<String>,
    /// Number of the reversal document.
    pub new_number: Option<String>,
    /// The provider's message when `success` is false.
    pub error: Option<String>,
}

impl StornoOutcome {
    /// A refused storno carrying the provider's message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Result of a collection request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl CollectOutcome {
    /// A refused collection carrying the provider's message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// The ledger operations the guard depends on.
///
/// Implementations address the provider's ledger by the billing company's
/// VAT code and the invoice's series and number.
#[async_trait]
pub trait InvoicingClient: Send + Sync {
    /// Reverses an issued invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not be reached, or accepted
    /// the request with an answer that could not be read.
    async fn storno(
        &self,
        company: &BillingCompany,
        series: &str,
        number: &str,
    ) -> Result<StornoOutcome, InvoicingError>;

    /// Records an invoice as collected.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not be reached, or accepted
    /// the request with an answer that could not be read.
    async fn collect(
        &self,
        company: &BillingCompany,
        series: &str,
        number: &str,
        collect_type: CollectType,
    ) -> Result<CollectOutcome, InvoicingError>;
}

/// Client used when no provider endpoint is configured.
///
/// Every call fails, so guarded operations can never mutate local state
/// without a ledger behind them.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredInvoicingClient;

#[async_trait]
impl InvoicingClient for UnconfiguredInvoicingClient {
    async fn storno(
        &self,
        _company: &BillingCompany,
        series: &str,
        number: &str,
    ) -> Result<StornoOutcome, InvoicingError> {
        warn!(series, number, "Storno requested without an invoicing provider");
        Err(InvoicingError::NotConfigured)
    }

    async fn collect(
        &self,
        _company: &BillingCompany,
        series: &str,
        number: &str,
        _collect_type: CollectType,
    ) -> Result<CollectOutcome, InvoicingError> {
        warn!(series, number, "Collection requested without an invoicing provider");
        Err(InvoicingError::NotConfigured)
    }
}
