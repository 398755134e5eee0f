// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::date;

use crate::{AwbNumber, DomainError, Pin, ScannedReturnStatus, parse_document_date};

#[test]
fn test_pin_accepts_six_digits() {
    let pin: Pin = Pin::parse("042917").expect("valid pin");

    assert_eq!(pin.expose(), "042917");
}

#[test]
fn test_pin_rejects_wrong_length_and_non_digits() {
    assert!(matches!(Pin::parse("12345"), Err(DomainError::InvalidPin(_))));
    assert!(matches!(
        Pin::parse("1234567"),
        Err(DomainError::InvalidPin(_))
    ));
    assert!(matches!(Pin::parse("12a456"), Err(DomainError::InvalidPin(_))));
    assert!(matches!(Pin::parse("１２３４５６"), Err(DomainError::InvalidPin(_))));
}

#[test]
fn test_pin_debug_is_redacted() {
    let pin: Pin = Pin::parse("123456").expect("valid pin");

    assert!(!format!("{pin:?}").contains("123456"));
}

#[test]
fn test_awb_number_is_normalized() {
    let awb: AwbNumber = AwbNumber::new("  ret001 ").expect("valid awb");

    assert_eq!(awb.value(), "RET001");
    assert_eq!(awb, AwbNumber::new("RET001").expect("valid awb"));
}

#[test]
fn test_awb_number_rejects_empty_and_symbols() {
    assert!(AwbNumber::new("   ").is_err());
    assert!(AwbNumber::new("RET 001").is_err());
    assert!(AwbNumber::new("RET/001").is_err());
}

#[test]
fn test_document_date_parsing() {
    assert_eq!(parse_document_date("2026-03-14"), Ok(date!(2026 - 03 - 14)));
    assert!(matches!(
        parse_document_date("14.03.2026"),
        Err(DomainError::InvalidDocumentDate { .. })
    ));
}

#[test]
fn test_received_states() {
    assert!(ScannedReturnStatus::Received.is_received_at_warehouse());
    assert!(ScannedReturnStatus::ReceivedDamaged.is_received_at_warehouse());
    assert!(!ScannedReturnStatus::Scanned.is_received_at_warehouse());
    assert!(!ScannedReturnStatus::Rejected.is_received_at_warehouse());
}
