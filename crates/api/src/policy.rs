// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Override PIN policy.
//!
//! This module holds the brute-force limits applied to the shared override
//! PIN, how long an invoice claim must be held before a supervisor may
//! release it, and the errors raised when a PIN change is malformed.

use manifest_guard_persistence::{DEFAULT_PIN_HASH_COST, MIN_PIN_HASH_COST};
use thiserror::Error;
use time::Duration;

/// Highest bcrypt cost the hashing library accepts.
const MAX_PIN_HASH_COST: u32 = 31;

/// Minutes a claim must be held before it can be released by hand. Longer
/// than the invoicing request timeout.
pub const DEFAULT_CLAIM_RELEASE_MINUTES: u32 = 10;

/// Override PIN policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PinPolicyError {
    /// Replacing an existing PIN requires the current one.
    #[error("The current PIN is required to replace the override PIN")]
    CurrentPinRequired,

    /// The attempt limit must allow at least one attempt.
    #[error("Maximum failed attempts must be at least 1")]
    InvalidMaxAttempts,

    /// The lockout must last a positive amount of time.
    #[error("Lockout duration must be positive")]
    InvalidLockout,

    /// A held claim must age before it can be released.
    #[error("Claim release delay must be positive")]
    InvalidClaimRelease,

    /// The bcrypt cost is outside what the hashing library accepts.
    #[error("PIN hash cost must be between {min} and {max} (got {cost})")]
    InvalidHashCost { cost: u32, min: u32, max: u32 },
}

/// Brute-force limits for the override PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverridePolicy {
    /// Consecutive failures that trigger a lockout.
    pub max_attempts: u32,
    /// How long a lockout lasts.
    pub lockout: Duration,
    /// bcrypt cost used when the PIN is set.
    pub hash_cost: u32,
    /// How long an invoice claim must be held before it can be released.
    pub claim_release_after: Duration,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::minutes(15),
            hash_cost: DEFAULT_PIN_HASH_COST,
            claim_release_after: Duration::minutes(i64::from(DEFAULT_CLAIM_RELEASE_MINUTES)),
        }
    }
}

impl OverridePolicy {
    /// Builds a policy, rejecting limits that would disable the lockout or
    /// that the hashing library cannot honour.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Consecutive failures before a lockout
    /// * `lockout_minutes` - Lockout length in minutes
    /// * `hash_cost` - bcrypt cost factor
    ///
    /// # Errors
    ///
    /// Returns a `PinPolicyError` if any limit is out of range.
    pub fn new(
        max_attempts: u32,
        lockout_minutes: u32,
        hash_cost: u32,
    ) -> Result<Self, PinPolicyError> {
        if max_attempts == 0 {
            return Err(PinPolicyError::InvalidMaxAttempts);
        }
        if lockout_minutes == 0 {
            return Err(PinPolicyError::InvalidLockout);
        }
        if !(MIN_PIN_HASH_COST..=MAX_PIN_HASH_COST).contains(&hash_cost) {
            return Err(PinPolicyError::InvalidHashCost {
                cost: hash_cost,
                min: MIN_PIN_HASH_COST,
                max: MAX_PIN_HASH_COST,
            });
        }

        Ok(Self {
            max_attempts,
            lockout: Duration::minutes(i64::from(lockout_minutes)),
            hash_cost,
            claim_release_after: Duration::minutes(i64::from(DEFAULT_CLAIM_RELEASE_MINUTES)),
        })
    }

    /// Sets how long a claim must be held before it can be released.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClaimRelease` if `minutes` is zero.
    pub fn with_claim_release_minutes(self, minutes: u32) -> Result<Self, PinPolicyError> {
        if minutes == 0 {
            return Err(PinPolicyError::InvalidClaimRelease);
        }
        Ok(Self {
            claim_release_after: Duration::minutes(i64::from(minutes)),
            ..self
        })
    }
}
