// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Contract and HTTP adapter for the external invoicing ledger.
//!
//! The guard never owns invoice numbering or reversal documents. It asks the
//! provider to issue a storno or record a collection and only mutates local
//! state once the provider reports success.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod client;
mod error;
mod http;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

pub use client::{CollectOutcome, InvoicingClient, StornoOutcome, UnconfiguredInvoicingClient};
pub use error::InvoicingError;
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpInvoicingClient, InvoicingConfig};
