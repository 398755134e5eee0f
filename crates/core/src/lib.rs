// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pure decision logic for the manifest guard.
//!
//! Nothing in this crate touches storage. The persistence layer loads the
//! rows, these functions decide, and the persistence layer writes the result.
//! Keeping the algorithms here makes them testable without a database and
//! guarantees the guard is recomputed from whatever state it is handed.

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

mod generator;
mod guard;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

pub use generator::{
    GenerationPlan, ManifestItemPlan, ManifestPlan, OriginalShipment, ResolvedReturn,
    ScannedReturnRecord, orders_to_resolve, plan_return_manifest, resolve_return,
};
pub use guard::{EvidenceMatch, GuardDecision, ManifestEvidence, decide};
