//! Identifier tests

use core_kernel::{BeneficiaryId, EntryId, ScheduleId, UserId};
use uuid::Uuid;

#[test]
fn test_ids_are_unique() {
    assert_ne!(UserId::new(), UserId::new());
    assert_ne!(EntryId::new(), EntryId::new());
}

#[test]
fn test_display_prefixes() {
    assert!(UserId::new().to_string().starts_with("USR-"));
    assert!(EntryId::new().to_string().starts_with("TXN-"));
    assert!(ScheduleId::new().to_string().starts_with("SCH-"));
    assert!(BeneficiaryId::new().to_string().starts_with("BEN-"));
}

#[test]
fn test_roundtrip_with_prefix() {
    let id = ScheduleId::new();
    let parsed: ScheduleId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn test_parse_bare_uuid() {
    let uuid = Uuid::new_v4();
    let parsed: UserId = uuid.to_string().parse().unwrap();
    assert_eq!(*parsed.as_uuid(), uuid);
}

#[test]
fn test_v7_ids_carry_version() {
    let id = EntryId::new_v7();
    assert_eq!(id.as_uuid().get_version_num(), 7);
}
