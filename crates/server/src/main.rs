// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod error;
mod handlers;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use manifest_guard_api::{DEFAULT_CLAIM_RELEASE_MINUTES, OverridePolicy};
use manifest_guard_invoicing::{
    HttpInvoicingClient, InvoicingClient, InvoicingConfig, InvoicingError,
    UnconfiguredInvoicingClient,
};
use manifest_guard_persistence::{DEFAULT_PIN_HASH_COST, Persistence};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::handlers::{
    handle_cancel_invoice, handle_collect_invoice, handle_confirm_manifest,
    handle_create_delivery_manifest, handle_generate_return_manifest, handle_get_manifest,
    handle_guard_cancel, handle_guard_collect, handle_list_audit_entries, handle_list_manifests,
    handle_pin_status, handle_process_manifest, handle_record_item_outcome,
    handle_release_invoice_claim, handle_set_pin,
};

/// Manifest Guard Server - gates invoice cancellation and collection on
/// courier manifest evidence
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "MANIFEST_GUARD_DATABASE")]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, env = "MANIFEST_GUARD_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to bind the server to
    #[arg(short, long, env = "MANIFEST_GUARD_PORT", default_value_t = 3000)]
    port: u16,

    /// Base URL of the invoicing provider. Ledger calls fail when absent.
    #[arg(long, env = "INVOICING_URL")]
    invoicing_url: Option<String>,

    /// Invoicing provider account
    #[arg(long, env = "INVOICING_USER", default_value = "")]
    invoicing_user: String,

    /// Invoicing provider API token
    #[arg(long, env = "INVOICING_TOKEN", default_value = "", hide_env_values = true)]
    invoicing_token: String,

    /// Timeout for a single invoicing provider call, in seconds
    #[arg(long, env = "INVOICING_TIMEOUT_SECS", default_value_t = 30)]
    invoicing_timeout_secs: u64,

    /// Consecutive wrong override PINs before the override locks
    #[arg(long, env = "PIN_MAX_ATTEMPTS", default_value_t = 5)]
    pin_max_attempts: u32,

    /// How long the override stays locked, in minutes
    #[arg(long, env = "PIN_LOCKOUT_MINUTES", default_value_t = 15)]
    pin_lockout_minutes: u32,

    /// How long an invoice with an unknown ledger outcome stays held before
    /// a supervisor may release it, in minutes
    #[arg(long, env = "CLAIM_RELEASE_MINUTES", default_value_t = DEFAULT_CLAIM_RELEASE_MINUTES)]
    claim_release_minutes: u32,
}

/// Application state shared across handlers.
///
/// The persistence layer sits behind an async mutex; guarded operations
/// release it while the invoicing provider is called.
#[derive(Clone)]
pub struct AppState {
    pub persistence: Arc<Mutex<Persistence>>,
    pub client: Arc<dyn InvoicingClient>,
    pub policy: OverridePolicy,
}

fn build_invoicing_client(args: &Args) -> Result<Arc<dyn InvoicingClient>, InvoicingError> {
    let Some(base_url) = &args.invoicing_url else {
        warn!("No invoicing provider configured; guarded operations will be refused");
        return Ok(Arc::new(UnconfiguredInvoicingClient));
    };

    let config: InvoicingConfig = InvoicingConfig {
        base_url: base_url.clone(),
        user: args.invoicing_user.clone(),
        token: args.invoicing_token.clone(),
        timeout: Duration::from_secs(args.invoicing_timeout_secs),
    };
    info!(?config, "Using invoicing provider");
    Ok(Arc::new(HttpInvoicingClient::new(config)?))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/invoices/{id}/guard/cancel", get(handle_guard_cancel))
        .route("/invoices/{id}/guard/collect", get(handle_guard_collect))
        .route("/invoices/{id}/cancel", post(handle_cancel_invoice))
        .route("/invoices/{id}/collect", post(handle_collect_invoice))
        .route(
            "/invoices/{id}/release-claim",
            post(handle_release_invoice_claim),
        )
        .route(
            "/manifests/returns/generate",
            post(handle_generate_return_manifest),
        )
        .route("/manifests/delivery", post(handle_create_delivery_manifest))
        .route("/manifests", get(handle_list_manifests))
        .route("/manifests/{id}", get(handle_get_manifest))
        .route("/manifests/{id}/confirm", post(handle_confirm_manifest))
        .route("/manifests/{id}/process", post(handle_process_manifest))
        .route(
            "/manifest-items/{id}/outcome",
            post(handle_record_item_outcome),
        )
        .route("/override-pin", get(handle_pin_status).post(handle_set_pin))
        .route("/audit", get(handle_list_audit_entries))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Manifest Guard Server");

    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let policy: OverridePolicy = OverridePolicy::new(
        args.pin_max_attempts,
        args.pin_lockout_minutes,
        DEFAULT_PIN_HASH_COST,
    )?
    .with_claim_release_minutes(args.claim_release_minutes)?;
    info!(
        max_attempts = policy.max_attempts,
        lockout_minutes = args.pin_lockout_minutes,
        claim_release_minutes = args.claim_release_minutes,
        "Override PIN policy loaded"
    );

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        client: build_invoicing_client(&args)?,
        policy,
    };

    let app: Router = build_router(app_state);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
