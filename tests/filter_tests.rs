// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use paytrack::filter::InstanceFilter;
use paytrack::models::{Kind, Recurrence, TemplateId, TransactionInstance};
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample() -> Vec<TransactionInstance> {
    let base = TransactionInstance {
        template_id: TemplateId(1),
        occurrence_date: d(2024, 3, 1),
        effective_date: d(2024, 3, 1),
        kind: Kind::Deposit,
        amount: Decimal::new(2000, 0),
        description: Some("March salary".into()),
        category: Some("Income".into()),
        payee: Some("ACME Corp".into()),
        recurrence: Recurrence::Monthly,
        is_override: false,
    };
    let rent = TransactionInstance {
        template_id: TemplateId(2),
        occurrence_date: d(2024, 3, 31),
        effective_date: d(2024, 3, 31),
        kind: Kind::Withdrawal,
        amount: Decimal::new(1250, 0),
        description: None,
        category: Some("Housing".into()),
        payee: Some("Landlord".into()),
        ..base.clone()
    };
    let coffee = TransactionInstance {
        template_id: TemplateId(3),
        occurrence_date: d(2024, 3, 12),
        effective_date: d(2024, 3, 12),
        kind: Kind::Withdrawal,
        amount: Decimal::new(450, 2),
        description: Some("coffee".into()),
        category: None,
        payee: None,
        recurrence: Recurrence::Once,
        is_override: false,
    };
    vec![base, rent, coffee]
}

fn ids(instances: Vec<TransactionInstance>) -> Vec<i64> {
    instances.iter().map(|i| i.template_id.0).collect()
}

#[test]
fn empty_filter_keeps_everything() {
    assert_eq!(ids(InstanceFilter::new().apply(sample())), vec![1, 2, 3]);
    assert_eq!(ids(InstanceFilter::new().text("   ").apply(sample())), vec![1, 2, 3]);
}

#[test]
fn text_searches_every_label_case_insensitively() {
    assert_eq!(ids(InstanceFilter::new().text("acme").apply(sample())), vec![1]);
    assert_eq!(ids(InstanceFilter::new().text(" HOUSING ").apply(sample())), vec![2]);
    assert_eq!(ids(InstanceFilter::new().text("Coffee").apply(sample())), vec![3]);
    assert!(InstanceFilter::new().text("nothing").apply(sample()).is_empty());
}

#[test]
fn criteria_combine() {
    let f = InstanceFilter::new()
        .kind(Kind::Withdrawal)
        .amount_between(Some(Decimal::new(10, 0)), None);
    assert_eq!(ids(f.apply(sample())), vec![2]);

    let f = InstanceFilter::new().amount_between(None, Decimal::new(2000, 0).into());
    assert_eq!(ids(f.apply(sample())), vec![1, 2, 3]);

    let f = InstanceFilter::new().dates_between(Some(d(2024, 3, 2)), Some(d(2024, 3, 30)));
    assert_eq!(ids(f.apply(sample())), vec![3]);
}
