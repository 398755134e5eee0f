// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

/// A courier air waybill number identifying one physical parcel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwbNumber {
    /// The number, trimmed and uppercased.
    value: String,
}

impl AwbNumber {
    /// Creates a new `AwbNumber`.
    ///
    /// Surrounding whitespace is removed and letters are uppercased so the
    /// same parcel scanned by different devices compares equal.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is empty or contains anything other
    /// than ASCII letters, digits or dashes.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidAwbNumber(String::from(
                "AWB number cannot be empty",
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(DomainError::InvalidAwbNumber(format!(
                "'{trimmed}' contains characters other than letters, digits or '-'"
            )));
        }
        Ok(Self {
            value: trimmed.to_uppercase(),
        })
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Parses an ISO `YYYY-MM-DD` manifest document date.
///
/// # Errors
///
/// Returns `DomainError::InvalidDocumentDate` if the input is not a valid date.
pub fn parse_document_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::InvalidDocumentDate {
            value: value.to_string(),
            error: e.to_string(),
        }
    })
}
