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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod billing;
mod error;
mod invoice;
mod manifest;
mod pin;
mod scanned_return;
mod types;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

pub use billing::{BillingCompany, resolve_billing_company};
pub use error::DomainError;
pub use invoice::{CollectType, GuardedOperation, InvoiceStatus, OperationSource, PaymentStatus};
pub use manifest::{ItemOutcome, ManifestItemStatus, ManifestStatus, ManifestType};
pub use pin::Pin;
pub use scanned_return::ScannedReturnStatus;
pub use types::{AwbNumber, parse_document_date};
