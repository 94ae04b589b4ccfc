// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use paytrack::db::{open_or_init, SqliteStore};
use paytrack::error::{LedgerError, StorageError};
use paytrack::ledger::Ledger;
use paytrack::models::{
    Kind, OccurrenceOverride, OverrideAction, OverridePatch, Recurrence, TemplateDraft,
    TemplateId, YearMonth,
};
use paytrack::store::{MemoryStore, TemplateStore};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn rent() -> TemplateDraft {
    let mut draft = TemplateDraft::new(
        Kind::Withdrawal,
        Decimal::new(125050, 2),
        d(2024, 1, 31),
        Recurrence::Monthly,
    );
    draft.payee = Some("Landlord".into());
    draft.end_date = Some(d(2024, 12, 31));
    draft
}

#[test]
fn templates_round_trip() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.save_template(&rent()).unwrap();
    let loaded = store.load_templates().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, id);
    assert_eq!(loaded[0].to_draft(), rent());

    let mut changed = loaded[0].clone();
    changed.amount = Decimal::new(1300, 0);
    changed.end_date = None;
    assert!(store.update_template(&changed).unwrap());
    assert_eq!(store.load_templates().unwrap()[0], changed);

    changed.id = TemplateId(77);
    assert!(!store.update_template(&changed).unwrap());
}

#[test]
fn templates_load_in_insertion_order() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let later = TemplateDraft::new(Kind::Deposit, Decimal::ONE, d(2024, 6, 1), Recurrence::Once);
    let a = store.save_template(&later).unwrap();
    let b = store.save_template(&rent()).unwrap();
    let ids: Vec<TemplateId> = store.load_templates().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn overrides_upsert_per_occurrence() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.save_template(&rent()).unwrap();

    let patch = OverridePatch {
        amount: Some(Decimal::new(1300, 0)),
        kind: Some(Kind::Deposit),
        description: Some("refund".into()),
        effective_date: Some(d(2024, 3, 1)),
        ..Default::default()
    };
    let modified = OccurrenceOverride::modified(id, d(2024, 2, 29), patch);
    store.save_override(&modified).unwrap();
    assert_eq!(store.load_overrides().unwrap(), vec![modified]);

    let deleted = OccurrenceOverride::deleted(id, d(2024, 2, 29));
    store.save_override(&deleted).unwrap();
    let loaded = store.load_overrides().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].action, OverrideAction::Deleted);

    assert!(store.delete_override(id, d(2024, 2, 29)).unwrap());
    assert!(!store.delete_override(id, d(2024, 2, 29)).unwrap());
}

#[test]
fn deleting_a_template_cascades() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.save_template(&rent()).unwrap();
    let other = store.save_template(&rent()).unwrap();
    store
        .save_override(&OccurrenceOverride::deleted(id, d(2024, 3, 31)))
        .unwrap();
    store
        .save_override(&OccurrenceOverride::deleted(other, d(2024, 3, 31)))
        .unwrap();

    assert!(store.delete_template(id).unwrap());
    assert!(!store.delete_template(id).unwrap());
    let left = store.load_overrides().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].template_id, other);
}

#[test]
fn overrides_need_an_existing_template() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let err = store
        .save_override(&OccurrenceOverride::deleted(TemplateId(5), d(2024, 1, 1)))
        .unwrap_err();
    assert!(matches!(err, StorageError::Sqlite(_)));
}

#[test]
fn orphans_left_by_unchecked_writes_are_purged() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.save_template(&rent()).unwrap();
    store.connection().execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    store
        .save_override(&OccurrenceOverride::deleted(TemplateId(99), d(2024, 1, 1)))
        .unwrap();
    store
        .save_override(&OccurrenceOverride::deleted(id, d(2024, 1, 31)))
        .unwrap();
    assert_eq!(store.purge_orphan_overrides().unwrap(), 1);
    assert_eq!(store.load_overrides().unwrap().len(), 1);
}

#[test]
fn closings_are_kept_per_month() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.load_closing(ym(2024, 1)).unwrap(), None);
    store.save_closing(ym(2024, 1), Decimal::new(300, 0)).unwrap();
    store.save_closing(ym(2024, 3), Decimal::new(-125, 1)).unwrap();
    store.save_closing(ym(2024, 1), Decimal::new(310, 0)).unwrap();

    assert_eq!(store.load_closing(ym(2024, 1)).unwrap(), Some(Decimal::new(310, 0)));
    assert_eq!(
        store.latest_closing_before(ym(2024, 3)).unwrap(),
        Some((ym(2024, 1), Decimal::new(310, 0)))
    );
    assert_eq!(
        store.latest_closing_before(ym(2024, 6)).unwrap(),
        Some((ym(2024, 3), Decimal::new(-125, 1)))
    );

    store.invalidate_closings_from(ym(2024, 2)).unwrap();
    assert_eq!(store.load_closing(ym(2024, 3)).unwrap(), None);
    assert!(store.load_closing(ym(2024, 1)).unwrap().is_some());
}

#[test]
fn opening_balance_defaults_to_zero() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.opening_balance().unwrap(), Decimal::ZERO);
    store.set_opening_balance(Decimal::new(-4250, 2)).unwrap();
    store.set_opening_balance(Decimal::new(1000, 2)).unwrap();
    assert_eq!(store.opening_balance().unwrap(), Decimal::new(1000, 2));
}

#[test]
fn corrupt_rows_surface_as_errors() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.save_template(&rent()).unwrap();
    store
        .connection()
        .execute("UPDATE templates SET amount='lots'", [])
        .unwrap();
    let err = store.load_templates().unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { column: "amount", .. }));

    let mut ledger = Ledger::new(store);
    let err = ledger.get_month_view(ym(2024, 1)).unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));
}

#[test]
fn sqlite_and_memory_stores_agree() {
    let drafts = vec![
        TemplateDraft::new(Kind::Deposit, Decimal::new(2000, 0), d(2024, 1, 1), Recurrence::Biweekly),
        rent(),
        TemplateDraft::new(Kind::Withdrawal, Decimal::new(45, 0), d(2024, 2, 14), Recurrence::Once),
    ];
    let mut sqlite = Ledger::new(SqliteStore::open_in_memory().unwrap());
    let mut memory = Ledger::new(MemoryStore::new());
    sqlite.add_transactions(drafts.clone()).unwrap();
    memory.add_transactions(drafts).unwrap();

    let patch = OverridePatch {
        amount: Some(Decimal::new(2100, 0)),
        ..Default::default()
    };
    sqlite
        .edit_instance(TemplateId(1), d(2024, 1, 29), patch.clone())
        .unwrap();
    memory.edit_instance(TemplateId(1), d(2024, 1, 29), patch).unwrap();
    sqlite.delete_instance(TemplateId(2), d(2024, 2, 29)).unwrap();
    memory.delete_instance(TemplateId(2), d(2024, 2, 29)).unwrap();

    for m in [3, 1, 2] {
        assert_eq!(
            sqlite.get_month_view(ym(2024, m)).unwrap(),
            memory.get_month_view(ym(2024, m)).unwrap()
        );
    }
}

#[test]
fn file_database_persists_between_opens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("paytrack.sqlite");
    {
        let mut ledger = Ledger::new(open_or_init(Some(path.as_path())).unwrap());
        ledger.add_transaction(rent()).unwrap();
        ledger.set_opening_balance(Decimal::new(5000, 0)).unwrap();
        ledger.get_month_view(ym(2024, 2)).unwrap();
    }
    let mut ledger = Ledger::new(open_or_init(Some(path.as_path())).unwrap());
    assert_eq!(ledger.templates().unwrap().len(), 1);
    assert_eq!(
        ledger.store().load_closing(ym(2024, 1)).unwrap(),
        Some(Decimal::new(374950, 2))
    );
    let feb = ledger.get_month_view(ym(2024, 2)).unwrap();
    assert_eq!(feb.monthly_balance.closing_balance, Decimal::new(249900, 2));
}

#[test]
fn batch_insert_is_all_or_nothing() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_payee BEFORE INSERT ON templates
             WHEN NEW.payee = 'Nobody'
             BEGIN SELECT RAISE(ABORT, 'payee rejected'); END;",
        )
        .unwrap();

    let mut rejected = rent();
    rejected.payee = Some("Nobody".into());
    let err = store.save_templates(&[rent(), rejected]).unwrap_err();
    assert!(matches!(err, StorageError::Sqlite(_)));
    assert!(store.load_templates().unwrap().is_empty());

    let ids = store.save_templates(&[rent(), rent()]).unwrap();
    let stored: Vec<TemplateId> = store.load_templates().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, stored);
}

#[test]
fn failed_batch_through_the_ledger_keeps_balances() {
    let mut ledger = Ledger::new(SqliteStore::open_in_memory().unwrap());
    ledger.add_transaction(rent()).unwrap();
    ledger.get_month_view(ym(2024, 2)).unwrap();

    let store = ledger.into_inner();
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_payee BEFORE INSERT ON templates
             WHEN NEW.payee = 'Nobody'
             BEGIN SELECT RAISE(ABORT, 'payee rejected'); END;",
        )
        .unwrap();
    let mut ledger = Ledger::new(store);

    let mut rejected = TemplateDraft::new(Kind::Deposit, Decimal::new(10, 0), d(2024, 1, 2), Recurrence::Once);
    rejected.payee = Some("Nobody".into());
    let accepted = TemplateDraft::new(Kind::Deposit, Decimal::new(10, 0), d(2024, 1, 1), Recurrence::Once);
    let err = ledger.add_transactions(vec![accepted, rejected]).unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));
    assert_eq!(ledger.templates().unwrap().len(), 1);

    let feb = ledger.get_month_view(ym(2024, 2)).unwrap();
    assert_eq!(feb.monthly_balance.opening_balance, Decimal::new(-125050, 2));
}

#[test]
fn memory_batch_ids_follow_draft_order() {
    let mut store = MemoryStore::new();
    let first = store.save_template(&rent()).unwrap();
    let ids = store.save_templates(&[rent(), rent()]).unwrap();
    assert_eq!(first, TemplateId(1));
    assert_eq!(ids, vec![TemplateId(2), TemplateId(3)]);
    assert_eq!(store.load_templates().unwrap().len(), 3);
    assert!(store.save_templates(&[]).unwrap().is_empty());
}
