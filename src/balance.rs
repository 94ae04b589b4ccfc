// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::models::{BalanceSnapshot, Period, TransactionInstance, YearMonth};

/// Snapshots for `periods`, opening with `starting_balance`.
///
/// Each period opens with the previous period's closing balance; the values are
/// produced by a single scan, never recomputed per period.
pub fn aggregate(
    instances: &[TransactionInstance],
    starting_balance: Decimal,
    periods: &[Period],
) -> Result<Vec<BalanceSnapshot>, ValidationError> {
    let inverted = periods.iter().any(|p| p.start() > p.end());
    let overlapping = periods.windows(2).any(|pair| pair[1].start() <= pair[0].end());
    if inverted || overlapping {
        return Err(ValidationError::UnorderedPeriods);
    }

    let daily = daily_totals(instances);
    let snapshots = periods
        .iter()
        .scan(starting_balance, |balance, period| {
            let net_change: Decimal = daily.range(period.start()..=period.end()).map(|(_, v)| *v).sum();
            let opening_balance = *balance;
            *balance += net_change;
            Some(BalanceSnapshot {
                period: *period,
                opening_balance,
                net_change,
                closing_balance: *balance,
            })
        })
        .collect();
    Ok(snapshots)
}

pub fn net_change(instances: &[TransactionInstance]) -> Decimal {
    instances.iter().map(TransactionInstance::signed_amount).sum()
}

fn daily_totals(instances: &[TransactionInstance]) -> BTreeMap<NaiveDate, Decimal> {
    let mut totals = BTreeMap::new();
    for instance in instances {
        *totals.entry(instance.effective_date).or_insert(Decimal::ZERO) += instance.signed_amount();
    }
    totals
}

pub fn day_periods(start: NaiveDate, end: NaiveDate) -> Vec<Period> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| Period::Day { date })
        .collect()
}

/// Monday-to-Sunday weeks clipped to the month. The first week starts on the 1st
/// and the last one ends on the month's last day, so either may be partial.
pub fn week_periods(month: YearMonth) -> Vec<Period> {
    let last = month.last_day();
    let mut weeks = Vec::new();
    let mut start = month.first_day();
    while start <= last {
        let end = week_end(start).min(last);
        weeks.push(Period::Week { start, end });
        match end.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }
    weeks
}

pub fn month_period(month: YearMonth) -> Period {
    Period::Month { month }
}

/// The Sunday closing the week that contains `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    let ahead = 6 - date.weekday().num_days_from_monday();
    date.checked_add_days(Days::new(u64::from(ahead))).unwrap_or(date)
}

/// The Monday opening the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let behind = date.weekday().num_days_from_monday();
    date.checked_sub_days(Days::new(u64::from(behind))).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weeks_cover_the_month_without_gaps() {
        // March 2024 starts on a Friday and ends on a Sunday
        let weeks = week_periods(YearMonth::new(2024, 3).unwrap());
        assert_eq!(weeks.first(), Some(&Period::Week { start: d(2024, 3, 1), end: d(2024, 3, 3) }));
        assert_eq!(weeks.last(), Some(&Period::Week { start: d(2024, 3, 25), end: d(2024, 3, 31) }));
        assert_eq!(weeks.len(), 5);
        for pair in weeks.windows(2) {
            assert_eq!(pair[0].end().succ_opt().unwrap(), pair[1].start());
        }
    }

    #[test]
    fn week_edges() {
        assert_eq!(week_start(d(2024, 3, 1)), d(2024, 2, 26));
        assert_eq!(week_end(d(2024, 3, 1)), d(2024, 3, 3));
        assert_eq!(week_end(d(2024, 3, 3)), d(2024, 3, 3));
        assert_eq!(week_start(d(2024, 3, 4)), d(2024, 3, 4));
    }
}
