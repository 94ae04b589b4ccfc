// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::models::{Kind, Recurrence, TemplateId, YearMonth};

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<YearMonth> {
    let s = s.trim();
    s.parse::<YearMonth>()
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let s = s.trim();
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_kind(s: &str) -> Result<Kind> {
    Ok(s.parse::<Kind>()?)
}

pub fn parse_recurrence(s: &str) -> Result<Recurrence> {
    Ok(s.parse::<Recurrence>()?)
}

pub fn parse_template_id(s: &str) -> Result<TemplateId> {
    let id = s
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid template id '{}'", s.trim()))?;
    Ok(TemplateId(id))
}

/// Trimmed, non-empty text or `None`.
pub fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn fmt_signed(d: &Decimal) -> String {
    if d.is_sign_negative() && !d.is_zero() {
        fmt_money(d)
    } else {
        format!("+{}", fmt_money(d))
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsers_trim_input() {
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(parse_month(" 2024-02 ").unwrap(), YearMonth::new(2024, 2).unwrap());
        assert_eq!(parse_decimal(" 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_template_id(" 7 ").unwrap(), TemplateId(7));
    }

    #[test]
    fn parse_date_rejects_impossible_dates() {
        let err = parse_date("2023-02-29").unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn signed_formatting() {
        assert_eq!(fmt_signed(&Decimal::new(300, 0)), "+300.00");
        assert_eq!(fmt_signed(&Decimal::new(-2005, 1)), "-200.50");
        assert_eq!(fmt_signed(&Decimal::ZERO), "+0.00");
    }
}
