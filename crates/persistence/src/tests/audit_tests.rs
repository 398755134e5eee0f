// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use manifest_guard_audit::{Actor, AuditAction, AuditEntry, EntityType};
use manifest_guard_domain::{GuardedOperation, OperationSource};

use super::create_test_persistence;

fn rejected(invoice_id: &str, failed_attempts: u32) -> AuditEntry {
    AuditEntry::new(
        Actor::user("cashier-7"),
        AuditAction::OverrideRejected {
            operation: GuardedOperation::Cancel,
            reason: Some(String::from("customer at counter")),
            failed_attempts,
            locked_until: None,
        },
        EntityType::Invoice,
        invoice_id.to_string(),
    )
}

#[test]
fn test_entries_round_trip_with_metadata() {
    let mut persistence = create_test_persistence();
    let entry = AuditEntry::new(
        Actor::user("cashier-7"),
        AuditAction::LedgerCallFailed {
            operation: GuardedOperation::Collect,
            source: OperationSource::Manifest,
            message: String::from("provider timeout"),
        },
        EntityType::Invoice,
        String::from("i1"),
    );

    let entry_id = persistence.append_audit_entry(&entry).unwrap();
    let stored = persistence.list_audit_entries(None, None).unwrap();

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].entry_id, Some(entry_id));
    assert_eq!(stored[0].actor, entry.actor);
    assert_eq!(stored[0].action, entry.action);
    assert_eq!(stored[0].entity_type, EntityType::Invoice);
    assert_eq!(stored[0].entity_id, "i1");
    assert!(stored[0].created_at.is_some());
}

#[test]
fn test_entries_are_listed_in_write_order() {
    let mut persistence = create_test_persistence();
    for attempt in 1..=3 {
        persistence
            .append_audit_entry(&rejected("i1", attempt))
            .unwrap();
    }

    let attempts: Vec<u32> = persistence
        .list_audit_entries(None, None)
        .unwrap()
        .into_iter()
        .filter_map(|entry| match entry.action {
            AuditAction::OverrideRejected {
                failed_attempts, ..
            } => Some(failed_attempts),
            _ => None,
        })
        .collect();

    assert_eq!(attempts, vec![1, 2, 3]);
}

#[test]
fn test_entries_filter_by_entity() {
    let mut persistence = create_test_persistence();
    persistence.append_audit_entry(&rejected("i1", 1)).unwrap();
    persistence.append_audit_entry(&rejected("i2", 1)).unwrap();
    persistence
        .append_audit_entry(&AuditEntry::new(
            Actor::user("cashier-7"),
            AuditAction::ManifestConfirmed,
            EntityType::Manifest,
            String::from("i1"),
        ))
        .unwrap();

    assert_eq!(
        persistence
            .list_audit_entries(Some(EntityType::Invoice), None)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        persistence
            .list_audit_entries(None, Some("i1"))
            .unwrap()
            .len(),
        2
    );
    let only = persistence
        .list_audit_entries(Some(EntityType::Invoice), Some("i2"))
        .unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].entity_id, "i2");
}
