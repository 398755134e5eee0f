// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Failures talking to the invoicing provider.
///
/// A provider that answers and refuses the request is not an error here; it
/// is reported through an unsuccessful outcome.
#[derive(Debug, Error)]
pub enum InvoicingError {
    /// No provider endpoint was configured.
    #[error("invoicing provider not configured")]
    NotConfigured,
    /// The HTTP client could not be built.
    #[error("failed to build invoicing client: {0}")]
    Client(String),
    /// The request never produced a response.
    #[error("invoicing request failed: {0}")]
    Transport(String),
    /// The provider accepted the request but its answer could not be read.
    /// The ledger may or may not have changed.
    #[error("invoicing provider accepted the request but its answer was unreadable: {0}")]
    UnreadableAcceptance(String),
}

impl InvoicingError {
    /// True when the provider may have applied the request despite the error.
    #[must_use]
    pub const fn outcome_unknown(&self) -> bool {
        matches!(self, Self::UnreadableAcceptance(_))
    }
}
