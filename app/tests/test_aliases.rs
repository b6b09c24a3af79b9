//! FILENAME: tests/test_aliases.rs
//! Integration tests for KOD alias management.

mod common;

use common::{qty, TestHarness};
use stockbook_lib::AppError;

#[test]
fn test_unmapped_value_resolves_to_nothing() {
    let harness = TestHarness::with_stock();
    assert_eq!(harness.session.resolve_alias("anything"), None);
    assert!(harness.session.list_aliases().unwrap().is_empty());
}

#[test]
fn test_created_alias_resolves_case_insensitively() {
    let mut harness = TestHarness::with_stock();
    let entry = harness.session.create_alias(" A1 ", " Alpha One ").unwrap();

    assert_eq!(entry.canonical_code, "A1");
    assert_eq!(entry.alternative_value, "Alpha One");
    assert_eq!(harness.session.resolve_alias("ALPHA ONE"), Some("A1".to_string()));
}

#[test]
fn test_alias_code_takes_stored_spelling() {
    let mut harness = TestHarness::with_stock();
    let entry = harness.session.create_alias("a1", "alpha lower").unwrap();
    assert_eq!(entry.canonical_code, "A1");

    harness.stage_upload(&[("alpha lower", qty(2.0))]);
    let summary = harness.session.apply_upload().unwrap();

    assert_eq!(summary.inserted, 0);
    assert_eq!(harness.quantity_of("A1"), Some(7.0));
    assert_eq!(harness.row_count(), 3);
}

#[test]
fn test_conflict_keeps_original_until_replaced() {
    let mut harness = TestHarness::with_stock();
    harness.session.create_alias("A1", "shared").unwrap();

    let err = harness.session.create_alias("B2", "SHARED").unwrap_err();
    match err {
        AppError::AliasConflict {
            existing_code,
            requested_code,
            ..
        } => {
            assert_eq!(existing_code, "A1");
            assert_eq!(requested_code, "B2");
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(harness.session.resolve_alias("shared"), Some("A1".to_string()));

    harness.session.replace_alias("B2", "SHARED").unwrap();
    assert_eq!(harness.session.resolve_alias("shared"), Some("B2".to_string()));
    assert_eq!(harness.session.list_aliases().unwrap().len(), 1);
}

#[test]
fn test_same_mapping_twice_creates_no_duplicate() {
    let mut harness = TestHarness::with_stock();
    let first = harness.session.create_alias("A1", "alpha").unwrap();
    let second = harness.session.create_alias("A1", "ALPHA").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(harness.session.list_aliases().unwrap().len(), 1);
}

#[test]
fn test_blank_fields_rejected() {
    let mut harness = TestHarness::with_stock();
    assert!(matches!(harness.session.create_alias(" ", "alpha"), Err(AppError::Validation(_))));
    assert!(matches!(harness.session.create_alias("A1", ""), Err(AppError::Validation(_))));
    assert!(matches!(harness.session.replace_alias("", "x"), Err(AppError::Validation(_))));
}

#[test]
fn test_one_code_many_aliases_listed_newest_first() {
    let mut harness = TestHarness::with_stock();
    harness.session.create_alias("A1", "first").unwrap();
    harness.session.create_alias("A1", "second").unwrap();
    harness.session.create_alias("A1", "third").unwrap();

    let values: Vec<String> = harness
        .session
        .list_aliases()
        .unwrap()
        .into_iter()
        .map(|e| e.alternative_value)
        .collect();
    assert_eq!(values, vec!["third", "second", "first"]);
}

#[test]
fn test_delete_alias() {
    let mut harness = TestHarness::with_stock();
    let entry = harness.session.create_alias("A1", "alpha").unwrap();

    let removed = harness.session.delete_alias(entry.id).unwrap();

    assert_eq!(removed.alternative_value, "alpha");
    assert_eq!(harness.session.resolve_alias("alpha"), None);
    assert!(matches!(harness.session.delete_alias(entry.id), Err(AppError::Validation(_))));
}

#[test]
fn test_aliases_survive_reopen() {
    let mut harness = TestHarness::with_stock();
    harness.session.create_alias("C3", "c-three").unwrap();

    harness.reopen();

    assert_eq!(harness.session.resolve_alias("C-THREE"), Some("C3".to_string()));
}

#[test]
fn test_code_catalog_with_labels() {
    let harness = TestHarness::with_stock();

    let all = harness.session.code_catalog("").unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].code, "A1");
    assert_eq!(all[0].label, "0805");

    let hits = harness.session.code_catalog("sot").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].code, "B2");
}
