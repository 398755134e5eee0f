// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod audit_tests;
mod initialization_tests;

use manifest_guard_audit::Actor;
use manifest_guard_domain::{InvoiceStatus, PaymentStatus, ScannedReturnStatus};
use time::Date;
use time::macros::date;

use crate::{NewInvoice, NewScannedReturn, Persistence};

pub fn create_test_actor() -> Actor {
    Actor::user("operator-1")
}

pub fn create_test_date() -> Date {
    date!(2026 - 03 - 14)
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create persistence")
}

/// Seeds company `c1`, store `s1` owned by it, and an order placed in `s1`.
pub fn seed_order(persistence: &mut Persistence, order_id: &str) {
    if persistence
        .get_order_status(order_id)
        .expect("order lookup")
        .is_some()
    {
        return;
    }
    let _ = persistence.insert_company("c1", "Acme Retail SRL", "RO123");
    let _ = persistence.insert_store("s1", "Main store", Some("c1"));
    persistence
        .insert_order(order_id, Some("s1"), "processing")
        .expect("Failed to insert order");
}

pub fn new_invoice(invoice_id: &str, order_id: &str, created_at: &str) -> NewInvoice {
    NewInvoice {
        invoice_id: invoice_id.to_string(),
        order_id: Some(order_id.to_string()),
        company_id: None,
        series: String::from("FCT"),
        number: format!("{invoice_id}-NR"),
        status: InvoiceStatus::Issued,
        payment_status: PaymentStatus::Unpaid,
        created_at: created_at.to_string(),
    }
}

pub fn seed_invoice(persistence: &mut Persistence, invoice_id: &str, order_id: &str) {
    seed_order(persistence, order_id);
    persistence
        .insert_invoice(&new_invoice(invoice_id, order_id, "2026-03-01T10:00:00Z"))
        .expect("Failed to insert invoice");
}

/// Seeds a received return linked directly to `order_id`.
pub fn seed_direct_return(
    persistence: &mut Persistence,
    return_id: &str,
    awb_number: &str,
    order_id: &str,
    scanned_at: &str,
) {
    seed_order(persistence, order_id);
    persistence
        .insert_scanned_return(&NewScannedReturn {
            return_id: return_id.to_string(),
            awb_number: awb_number.to_string(),
            status: ScannedReturnStatus::Received,
            order_id: Some(order_id.to_string()),
            original_shipment_id: None,
            scanned_at: scanned_at.to_string(),
        })
        .expect("Failed to insert scanned return");
}
