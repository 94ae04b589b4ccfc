// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use crate::commands::transactions::selected_month;
use crate::ledger::{Ledger, LedgerOptions, MonthView};
use crate::store::TemplateStore;
use crate::utils::{fmt_money, fmt_signed, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;

pub fn handle<S: TemplateStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    let month = selected_month(m)?;
    ledger.set_options(LedgerOptions {
        pad_weeks: m.get_flag("pad"),
    });
    let view = ledger.get_month_view(month)?;
    if !maybe_print_json(m.get_flag("json"), false, &view)? {
        print_view(&view);
    }
    Ok(())
}

pub fn day_rows(view: &MonthView) -> Vec<Vec<String>> {
    let mut per_day: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    for i in &view.instances {
        let label = i
            .payee
            .clone()
            .or_else(|| i.description.clone())
            .unwrap_or_else(|| i.kind.to_string());
        let marker = if i.is_override { "*" } else { "" };
        per_day
            .entry(i.effective_date)
            .or_default()
            .push(format!("{}{} {}", label, marker, fmt_signed(&i.signed_amount())));
    }
    let closing_by_day: BTreeMap<NaiveDate, String> = view
        .daily_balances
        .iter()
        .map(|s| (s.period.start(), fmt_money(&s.closing_balance)))
        .collect();

    view.display_start
        .iter_days()
        .take_while(|d| *d <= view.display_end)
        .map(|d| {
            vec![
                d.format("%a %d %b").to_string(),
                per_day.remove(&d).map(|v| v.join(", ")).unwrap_or_default(),
                closing_by_day.get(&d).cloned().unwrap_or_default(),
            ]
        })
        .collect()
}

fn print_view(view: &MonthView) {
    println!("{}", view.month);
    println!(
        "{}",
        pretty_table(&["Day", "Transactions", "Balance"], day_rows(view))
    );

    let weeks: Vec<Vec<String>> = view
        .weekly_balances
        .iter()
        .map(|s| {
            vec![
                s.period.label(),
                fmt_money(&s.opening_balance),
                fmt_money(&s.closing_balance),
                fmt_signed(&s.net_change),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Week", "Starting Balance", "Ending Balance", "Net Change"], weeks)
    );

    let m = &view.monthly_balance;
    println!(
        "{}",
        pretty_table(
            &["Month", "Opening", "Net Change", "Closing"],
            vec![vec![
                m.period.label(),
                fmt_money(&m.opening_balance),
                fmt_signed(&m.net_change),
                fmt_money(&m.closing_balance),
            ]],
        )
    );
}
