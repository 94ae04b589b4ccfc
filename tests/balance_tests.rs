// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use paytrack::balance::{aggregate, day_periods, month_period, net_change, week_periods};
use paytrack::error::ValidationError;
use paytrack::models::{Kind, Period, Recurrence, TemplateId, TransactionInstance, YearMonth};
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn instance(date: NaiveDate, kind: Kind, amount: i64) -> TransactionInstance {
    TransactionInstance {
        template_id: TemplateId(1),
        occurrence_date: date,
        effective_date: date,
        kind,
        amount: Decimal::new(amount, 0),
        description: None,
        category: None,
        payee: None,
        recurrence: Recurrence::Once,
        is_override: false,
    }
}

#[test]
fn january_closes_at_300_and_february_opens_there() {
    let jan = YearMonth::new(2024, 1).unwrap();
    let instances = vec![
        instance(d(2024, 1, 5), Kind::Deposit, 500),
        instance(d(2024, 1, 20), Kind::Withdrawal, 200),
    ];
    let months = [month_period(jan), month_period(jan.succ())];
    let snaps = aggregate(&instances, Decimal::ZERO, &months).unwrap();
    assert_eq!(snaps[0].closing_balance, Decimal::new(300, 0));
    assert_eq!(snaps[0].net_change, Decimal::new(300, 0));
    assert_eq!(snaps[1].opening_balance, Decimal::new(300, 0));
    assert_eq!(snaps[1].closing_balance, Decimal::new(300, 0));
}

#[test]
fn carryover_holds_for_every_granularity() {
    let month = YearMonth::new(2024, 3).unwrap();
    let instances = vec![
        instance(d(2024, 3, 1), Kind::Deposit, 1200),
        instance(d(2024, 3, 4), Kind::Withdrawal, 75),
        instance(d(2024, 3, 4), Kind::Withdrawal, 25),
        instance(d(2024, 3, 17), Kind::Deposit, 40),
        instance(d(2024, 3, 31), Kind::Withdrawal, 900),
    ];
    let start = Decimal::new(-50, 0);
    for periods in [
        day_periods(month.first_day(), month.last_day()),
        week_periods(month),
        vec![month_period(month)],
    ] {
        let snaps = aggregate(&instances, start, &periods).unwrap();
        assert_eq!(snaps.len(), periods.len());
        assert_eq!(snaps[0].opening_balance, start);
        for s in &snaps {
            assert_eq!(s.closing_balance, s.opening_balance + s.net_change);
        }
        for pair in snaps.windows(2) {
            assert_eq!(pair[1].opening_balance, pair[0].closing_balance);
        }
        assert_eq!(
            snaps.last().unwrap().closing_balance,
            start + net_change(&instances)
        );
    }
}

#[test]
fn partial_first_week_is_expected() {
    let month = YearMonth::new(2024, 3).unwrap();
    let instances = vec![instance(d(2024, 3, 2), Kind::Deposit, 10)];
    let snaps = aggregate(&instances, Decimal::ZERO, &week_periods(month)).unwrap();
    assert_eq!(
        snaps[0].period,
        Period::Week { start: d(2024, 3, 1), end: d(2024, 3, 3) }
    );
    assert_eq!(snaps[0].net_change, Decimal::new(10, 0));
    assert!(snaps[1..].iter().all(|s| s.net_change.is_zero()));
}

#[test]
fn instances_outside_the_periods_are_ignored() {
    let month = YearMonth::new(2024, 3).unwrap();
    let instances = vec![
        instance(d(2024, 2, 29), Kind::Deposit, 10),
        instance(d(2024, 3, 10), Kind::Deposit, 5),
        instance(d(2024, 4, 1), Kind::Deposit, 10),
    ];
    let snaps = aggregate(&instances, Decimal::ZERO, &[month_period(month)]).unwrap();
    assert_eq!(snaps[0].closing_balance, Decimal::new(5, 0));
}

#[test]
fn aggregation_is_deterministic() {
    let month = YearMonth::new(2024, 2).unwrap();
    let instances = vec![
        instance(d(2024, 2, 29), Kind::Deposit, 1000),
        instance(d(2024, 2, 1), Kind::Withdrawal, 3),
    ];
    let periods = week_periods(month);
    let a = aggregate(&instances, Decimal::ONE, &periods).unwrap();
    let b = aggregate(&instances, Decimal::ONE, &periods).unwrap();
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}

#[test]
fn overlapping_periods_are_rejected() {
    let periods = vec![
        Period::Week { start: d(2024, 3, 1), end: d(2024, 3, 7) },
        Period::Week { start: d(2024, 3, 7), end: d(2024, 3, 14) },
    ];
    let err = aggregate(&[], Decimal::ZERO, &periods).unwrap_err();
    assert_eq!(err, ValidationError::UnorderedPeriods);

    let reversed = vec![
        Period::Day { date: d(2024, 3, 2) },
        Period::Day { date: d(2024, 3, 1) },
    ];
    assert!(aggregate(&[], Decimal::ZERO, &reversed).is_err());
}
