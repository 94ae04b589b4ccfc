// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::filter::InstanceFilter;
use crate::ledger::{DeleteOutcome, Ledger};
use crate::models::{OverridePatch, TemplateDraft, YearMonth};
use crate::store::TemplateStore;
use crate::utils::{
    fmt_money, maybe_print_json, non_empty, parse_date, parse_decimal, parse_kind, parse_month,
    parse_recurrence, parse_template_id, pretty_table,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;

pub fn handle<S: TemplateStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("add-batch", sub)) => add_batch(ledger, sub)?,
        Some(("update", sub)) => update(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => rm(ledger, sub)?,
        Some(("restore", sub)) => restore(ledger, sub)?,
        Some(("drop", sub)) => drop_template(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn required<'a>(sub: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    match sub.get_one::<String>(name) {
        Some(v) => Ok(v),
        None => bail!("Missing --{}", name),
    }
}

pub fn draft_from_args(sub: &clap::ArgMatches) -> Result<TemplateDraft> {
    let anchor_date = parse_date(required(sub, "date")?)?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let kind = parse_kind(required(sub, "kind")?)?;
    let recurrence = parse_recurrence(required(sub, "recurrence")?)?;
    let end_date = match sub.get_one::<String>("until") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    Ok(TemplateDraft {
        kind,
        amount,
        description: non_empty(sub.get_one::<String>("description")),
        category: non_empty(sub.get_one::<String>("category")),
        payee: non_empty(sub.get_one::<String>("payee")),
        anchor_date,
        recurrence,
        end_date,
    })
}

fn add<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let draft = draft_from_args(sub)?;
    let t = ledger.add_transaction(draft)?;
    println!(
        "Recorded {} {} on {} ({}, template {})",
        t.kind,
        fmt_money(&t.amount),
        t.anchor_date,
        t.recurrence,
        t.id
    );
    Ok(())
}

/// Reads one template per non-empty line. A bad line rejects the whole file.
pub fn read_drafts(path: &str) -> Result<Vec<TemplateDraft>> {
    let text = fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    let mut drafts = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let draft: TemplateDraft = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid transaction", path, n + 1))?;
        drafts.push(draft);
    }
    Ok(drafts)
}

fn add_batch<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let drafts = read_drafts(required(sub, "file")?)?;
    let saved = ledger.add_transactions(drafts)?;
    println!("Recorded {} transactions", saved.len());
    Ok(())
}

fn update<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_template_id(required(sub, "id")?)?;
    let mut t = ledger.template(id)?;
    if let Some(s) = sub.get_one::<String>("date") {
        t.anchor_date = parse_date(s)?;
    }
    if let Some(s) = sub.get_one::<String>("amount") {
        t.amount = parse_decimal(s)?;
    }
    if let Some(s) = sub.get_one::<String>("kind") {
        t.kind = parse_kind(s)?;
    }
    if let Some(s) = sub.get_one::<String>("recurrence") {
        t.recurrence = parse_recurrence(s)?;
    }
    if let Some(s) = sub.get_one::<String>("until") {
        t.end_date = Some(parse_date(s)?);
    }
    if sub.get_flag("no_until") {
        t.end_date = None;
    }
    if let Some(v) = sub.get_one::<String>("description") {
        t.description = non_empty(Some(v));
    }
    if let Some(v) = sub.get_one::<String>("category") {
        t.category = non_empty(Some(v));
    }
    if let Some(v) = sub.get_one::<String>("payee") {
        t.payee = non_empty(Some(v));
    }
    ledger.update_template(t)?;
    println!("Updated template {}", id);
    Ok(())
}

pub fn patch_from_args(sub: &clap::ArgMatches) -> Result<OverridePatch> {
    let amount = match sub.get_one::<String>("amount") {
        Some(s) => Some(parse_decimal(s)?),
        None => None,
    };
    let kind = match sub.get_one::<String>("kind") {
        Some(s) => Some(parse_kind(s)?),
        None => None,
    };
    let effective_date = match sub.get_one::<String>("move_to") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let patch = OverridePatch {
        amount,
        kind,
        description: non_empty(sub.get_one::<String>("description")),
        category: non_empty(sub.get_one::<String>("category")),
        payee: non_empty(sub.get_one::<String>("payee")),
        effective_date,
    };
    if patch.is_empty() {
        bail!("Nothing to change: pass at least one of --amount, --kind, --description, --category, --payee, --move-to");
    }
    Ok(patch)
}

fn edit<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_template_id(required(sub, "id")?)?;
    let date = parse_date(required(sub, "date")?)?;
    let patch = patch_from_args(sub)?;
    let instance = ledger.edit_instance(id, date, patch)?;
    println!(
        "Occurrence {} of template {} is now {} {} on {}",
        date,
        id,
        instance.kind,
        fmt_money(&instance.amount),
        instance.effective_date
    );
    Ok(())
}

fn rm<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_template_id(required(sub, "id")?)?;
    let date = parse_date(required(sub, "date")?)?;
    match ledger.delete_instance(id, date)? {
        DeleteOutcome::OccurrenceDeleted => {
            println!("Deleted occurrence {} of template {}", date, id)
        }
        DeleteOutcome::TemplateDeleted => println!("Deleted transaction {}", id),
    }
    Ok(())
}

fn restore<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_template_id(required(sub, "id")?)?;
    let date = parse_date(required(sub, "date")?)?;
    if ledger.restore_instance(id, date)? {
        println!("Restored occurrence {} of template {}", date, id);
    } else {
        println!("Occurrence {} of template {} was not modified", date, id);
    }
    Ok(())
}

fn drop_template<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_template_id(required(sub, "id")?)?;
    ledger.delete_template(id)?;
    println!("Deleted template {} and all of its occurrences", id);
    Ok(())
}

fn list<S: TemplateStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(ledger, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.template.to_string(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.payee.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.recurrence.clone(),
                    if r.edited { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Date", "Template", "Kind", "Amount", "Payee", "Category", "Description",
                    "Repeats", "Edited",
                ],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub occurrence: String,
    pub template: i64,
    pub kind: String,
    pub amount: String,
    pub payee: String,
    pub category: String,
    pub description: String,
    pub recurrence: String,
    pub edited: bool,
}

pub fn selected_month(sub: &clap::ArgMatches) -> Result<YearMonth> {
    match sub.get_one::<String>("month") {
        Some(s) => parse_month(s),
        None => Ok(YearMonth::of(chrono::Local::now().date_naive())),
    }
}

pub fn query_rows<S: TemplateStore>(
    ledger: &mut Ledger<S>,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let month = selected_month(sub)?;
    let mut filter = InstanceFilter::new();
    if let Some(text) = sub.get_one::<String>("search") {
        filter = filter.text(text.as_str());
    }
    if let Some(kind) = sub.get_one::<String>("kind") {
        filter = filter.kind(parse_kind(kind)?);
    }
    let min = match sub.get_one::<String>("min") {
        Some(s) => Some(parse_decimal(s)?),
        None => None,
    };
    let max = match sub.get_one::<String>("max") {
        Some(s) => Some(parse_decimal(s)?),
        None => None,
    };
    filter = filter.amount_between(min, max);

    let instances = ledger.instances_between(month.first_day(), month.last_day())?;
    let data = filter
        .apply(instances)
        .into_iter()
        .map(|i| TransactionRow {
            date: i.effective_date.to_string(),
            occurrence: i.occurrence_date.to_string(),
            template: i.template_id.0,
            kind: i.kind.to_string(),
            amount: fmt_money(&i.amount),
            payee: i.payee.unwrap_or_default(),
            category: i.category.unwrap_or_default(),
            description: i.description.unwrap_or_default(),
            recurrence: i.recurrence.to_string(),
            edited: i.is_override,
        })
        .collect();
    Ok(data)
}
