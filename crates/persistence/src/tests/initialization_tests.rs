// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{create_test_persistence, seed_order};
use crate::{NewScannedReturn, PersistenceError};
use manifest_guard_domain::ScannedReturnStatus;

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first = create_test_persistence();
    let mut second = create_test_persistence();

    seed_order(&mut first, "o1");

    assert!(first.get_order_status("o1").unwrap().is_some());
    assert!(second.get_order_status("o1").unwrap().is_none());
}

#[test]
fn test_foreign_keys_are_enforced() {
    let mut persistence = create_test_persistence();

    assert!(persistence.verify_foreign_key_enforcement().is_ok());

    let result = persistence.insert_scanned_return(&NewScannedReturn {
        return_id: String::from("r1"),
        awb_number: String::from("RET001"),
        status: ScannedReturnStatus::Received,
        order_id: Some(String::from("missing-order")),
        original_shipment_id: None,
        scanned_at: String::from("2026-03-10T09:00:00Z"),
    });

    assert!(matches!(result, Err(PersistenceError::DatabaseError(_))));
}

#[test]
fn test_file_database_is_created_and_reopened() {
    let path = std::env::temp_dir().join(format!(
        "manifest_guard_init_{}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    {
        let mut persistence = crate::Persistence::new_with_file(&path).unwrap();
        seed_order(&mut persistence, "o1");
    }

    let mut reopened = crate::Persistence::new_with_file(&path).unwrap();
    assert_eq!(
        reopened.get_order_status("o1").unwrap().as_deref(),
        Some("processing")
    );

    drop(reopened);
    let _ = std::fs::remove_file(&path);
}
