// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP adapter for the invoicing provider's REST API.

use std::time::Duration;

use async_trait::async_trait;
use manifest_guard_domain::{BillingCompany, CollectType};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::client::{CollectOutcome, InvoicingClient, StornoOutcome};
use crate::error::InvoicingError;

/// Request timeout used unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the provider.
#[derive(Clone)]
pub struct InvoicingConfig {
    /// Base URL, without the endpoint path.
    pub base_url: String,
    /// Account used for basic authentication.
    pub user: String,
    /// API token used as the basic-auth password.
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for InvoicingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoicingConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StornoRequest<'a> {
    company_vat_code: &'a str,
    series_name: &'a str,
    number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceReference<'a> {
    series_name: &'a str,
    number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest<'a> {
    company_vat_code: &'a str,
    #[serde(rename = "type")]
    payment_type: &'static str,
    use_invoice_details: bool,
    invoices_list: Vec<InvoiceReference<'a>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
    #[serde(default)]
    error_text: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    series_name: Option<String>,
    #[serde(default)]
    number: Option<String>,
}

impl ProviderResponse {
    fn refusal(&self) -> Option<&str> {
        self.error_text.as_deref().filter(|text| !text.trim().is_empty())
    }
}

/// The payment type label the provider expects for each collection kind.
const fn payment_type(collect_type: CollectType) -> &'static str {
    match collect_type {
        CollectType::Card => "Card",
        CollectType::Cash => "Chitanta",
        CollectType::CashOnDelivery => "Ramburs",
        CollectType::BankTransfer => "Ordin de plata",
    }
}

/// Invoicing client backed by the provider's HTTP API.
#[derive(Clone)]
pub struct HttpInvoicingClient {
    base_url: String,
    user: String,
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpInvoicingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInvoicingClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl HttpInvoicingClient {
    /// Builds a client for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns `InvoicingError::Client` if the HTTP client cannot be built.
    pub fn new(config: InvoicingConfig) -> Result<Self, InvoicingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InvoicingError::Client(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user: config.user,
            token: config.token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Sends a JSON request and reads the provider's answer.
    ///
    /// A non-2xx status becomes `Ok(Err(message))`. A 2xx whose body cannot
    /// be read is `UnreadableAcceptance`, since the provider acted on it.
    async fn post<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Result<ProviderResponse, String>, InvoicingError> {
        let response = self
            .client
            .post(self.url(path))
            .basic_auth(&self.user, Some(&self.token))
            .json(body)
            .send()
            .await
            .map_err(|e| InvoicingError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if status.is_success() => {
                error!(
                    path,
                    %status,
                    error = %e,
                    "Provider accepted the request but the answer was lost"
                );
                return Err(InvoicingError::UnreadableAcceptance(e.to_string()));
            }
            Err(e) => return Err(InvoicingError::Transport(e.to_string())),
        };

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Ok(ProviderResponse::default()));
            }
            return serde_json::from_slice::<ProviderResponse>(&bytes)
                .map(Ok)
                .map_err(|e| {
                    error!(
                        path,
                        %status,
                        error = %e,
                        "Provider accepted the request with an unreadable answer"
                    );
                    InvoicingError::UnreadableAcceptance(e.to_string())
                });
        }

        let message: String = serde_json::from_slice::<ProviderResponse>(&bytes)
            .ok()
            .and_then(|body| body.refusal().map(str::to_string).or(body.message))
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());
        warn!(path, %status, "Invoicing provider returned an error status");

        if message.is_empty() {
            Ok(Err(format!("provider returned {status}")))
        } else {
            Ok(Err(format!("provider returned {status}: {message}")))
        }
    }
}

#[async_trait]
impl InvoicingClient for HttpInvoicingClient {
    async fn storno(
        &self,
        company: &BillingCompany,
        series: &str,
        number: &str,
    ) -> Result<StornoOutcome, InvoicingError> {
        debug!(series, number, company = %company.company_id, "Requesting storno");
        let request = StornoRequest {
            company_vat_code: &company.vat_code,
            series_name: series,
            number,
        };

        match self.post("invoice/reverse", &request).await? {
            Err(message) => Ok(StornoOutcome::failed(message)),
            Ok(body) => {
                if let Some(refusal) = body.refusal() {
                    warn!(series, number, refusal, "Storno refused by provider");
                    return Ok(StornoOutcome::failed(refusal));
                }
                info!(
                    series,
                    number,
                    storno_series = body.series_name.as_deref(),
                    storno_number = body.number.as_deref(),
                    "Storno issued"
                );
                Ok(StornoOutcome {
                    success: true,
                    new_series: body.series_name,
                    new_number: body.number,
                    error: None,
                })
            }
        }
    }

    async fn collect(
        &self,
        company: &BillingCompany,
        series: &str,
        number: &str,
        collect_type: CollectType,
    ) -> Result<CollectOutcome, InvoicingError> {
        debug!(
            series,
            number,
            collect_type = collect_type.as_str(),
            "Requesting collection"
        );
        let request = PaymentRequest {
            company_vat_code: &company.vat_code,
            payment_type: payment_type(collect_type),
            use_invoice_details: true,
            invoices_list: vec![InvoiceReference {
                series_name: series,
                number,
            }],
        };

        match self.post("payment", &request).await? {
            Err(message) => Ok(CollectOutcome::failed(message)),
            Ok(body) => {
                if let Some(refusal) = body.refusal() {
                    warn!(series, number, refusal, "Collection refused by provider");
                    return Ok(CollectOutcome::failed(refusal));
                }
                info!(series, number, "Collection recorded");
                Ok(CollectOutcome {
                    success: true,
                    error: None,
                })
            }
        }
    }
}
