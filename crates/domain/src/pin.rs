// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The supervisor override PIN.

use crate::error::DomainError;

/// Number of digits in an override PIN.
pub const PIN_LENGTH: usize = 6;

/// A syntactically valid override PIN: exactly six ASCII digits.
///
/// The value is never printed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Parses a candidate PIN.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPin` unless the input is exactly six digits.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value.len() != PIN_LENGTH {
            return Err(DomainError::InvalidPin(format!(
                "PIN must be exactly {PIN_LENGTH} digits"
            )));
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidPin(String::from(
                "PIN must contain digits only",
            )));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the digits.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pin(******)")
    }
}
