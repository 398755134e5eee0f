// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.


use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use manifest_guard_domain::BillingCompany;
use serde_json::Value;

use crate::{HttpInvoicingClient, InvoicingConfig};

/// A request as seen by the fake provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: &'static str,
    pub authorization: Option<String>,
    pub body: Value,
}

pub type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

/// Starts a fake provider answering every call to `path` with `status` and
/// `body`, recording what it receives.
pub async fn spawn_provider(path: &'static str, status: StatusCode, body: Value) -> (String, Recorder) {
    let recorder: Recorder = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&recorder);

    let app = Router::new().route(
        path,
        post(move |headers: HeaderMap, axum::Json(received): axum::Json<Value>| {
            let seen = Arc::clone(&seen);
            let body = body.clone();
            async move {
                seen.lock().unwrap().push(RecordedRequest {
                    path,
                    authorization: headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: received,
                });
                (status, axum::Json(body))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), recorder)
}

/// Starts a fake provider answering `path` with a plain-text body.
pub async fn spawn_text_provider(path: &'static str, status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route(path, post(move || async move { (status, body) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}")
}

pub fn client_for(base_url: &str) -> HttpInvoicingClient {
    HttpInvoicingClient::new(InvoicingConfig {
        base_url: base_url.to_string(),
        user: String::from("ledger@acme.test"),
        token: String::from("api-token"),
        timeout: Duration::from_secs(5),
    })
    .expect("client")
}

pub fn acme() -> BillingCompany {
    BillingCompany {
        company_id: String::from("c1"),
        name: String::from("Acme Retail SRL"),
        vat_code: String::from("RO123"),
    }
}
