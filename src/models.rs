// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub i64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Deposit,
    Withdrawal,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Deposit => "deposit",
            Kind::Withdrawal => "withdrawal",
        }
    }

    /// Signed contribution of `amount` to a balance.
    pub fn sign(&self, amount: Decimal) -> Decimal {
        match self {
            Kind::Deposit => amount,
            Kind::Withdrawal => -amount,
        }
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" | "dep" | "in" => Ok(Kind::Deposit),
            "withdrawal" | "wd" | "out" => Ok(Kind::Withdrawal),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// A single occurrence on the anchor date.
    Once,
    Weekly,
    Biweekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Once => "once",
            Recurrence::Weekly => "weekly",
            Recurrence::Biweekly => "biweekly",
            Recurrence::Monthly => "monthly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::Once)
    }
}

impl FromStr for Recurrence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "once" | "none" | "" => Ok(Recurrence::Once),
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            other => Err(ValidationError::UnknownRecurrence(other.to_string())),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub kind: Kind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub anchor_date: NaiveDate,
    pub recurrence: Recurrence,
    pub end_date: Option<NaiveDate>,
}

impl TemplateDraft {
    pub fn new(kind: Kind, amount: Decimal, anchor_date: NaiveDate, recurrence: Recurrence) -> Self {
        Self {
            kind,
            amount,
            description: None,
            category: None,
            payee: None,
            anchor_date,
            recurrence,
            end_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_amount(self.amount)?;
        if let Some(end_date) = self.end_date {
            if end_date < self.anchor_date {
                return Err(ValidationError::EndBeforeAnchor {
                    anchor_date: self.anchor_date,
                    end_date,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTemplate {
    pub id: TemplateId,
    pub kind: Kind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub anchor_date: NaiveDate,
    pub recurrence: Recurrence,
    pub end_date: Option<NaiveDate>,
}

impl TransactionTemplate {
    pub fn from_draft(id: TemplateId, draft: TemplateDraft) -> Self {
        Self {
            id,
            kind: draft.kind,
            amount: draft.amount,
            description: draft.description,
            category: draft.category,
            payee: draft.payee,
            anchor_date: draft.anchor_date,
            recurrence: draft.recurrence,
            end_date: draft.end_date,
        }
    }

    pub fn to_draft(&self) -> TemplateDraft {
        TemplateDraft {
            kind: self.kind,
            amount: self.amount,
            description: self.description.clone(),
            category: self.category.clone(),
            payee: self.payee.clone(),
            anchor_date: self.anchor_date,
            recurrence: self.recurrence,
            end_date: self.end_date,
        }
    }
}

pub fn validate_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(())
}

/// Replacement values for one occurrence. `None` keeps the template's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverridePatch {
    pub amount: Option<Decimal>,
    pub kind: Option<Kind>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub effective_date: Option<NaiveDate>,
}

impl OverridePatch {
    pub fn is_empty(&self) -> bool {
        *self == OverridePatch::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.amount {
            Some(amount) => validate_amount(amount),
            None => Ok(()),
        }
    }

    /// Layers `newer` over `self`; fields set in `newer` win.
    pub fn merged_with(self, newer: OverridePatch) -> OverridePatch {
        OverridePatch {
            amount: newer.amount.or(self.amount),
            kind: newer.kind.or(self.kind),
            description: newer.description.or(self.description),
            category: newer.category.or(self.category),
            payee: newer.payee.or(self.payee),
            effective_date: newer.effective_date.or(self.effective_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OverrideAction {
    Modified(OverridePatch),
    Deleted,
}

impl OverrideAction {
    pub fn status(&self) -> &'static str {
        match self {
            OverrideAction::Modified(_) => "modified",
            OverrideAction::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceOverride {
    pub template_id: TemplateId,
    pub occurrence_date: NaiveDate,
    pub action: OverrideAction,
}

impl OccurrenceOverride {
    pub fn modified(template_id: TemplateId, occurrence_date: NaiveDate, patch: OverridePatch) -> Self {
        Self {
            template_id,
            occurrence_date,
            action: OverrideAction::Modified(patch),
        }
    }

    pub fn deleted(template_id: TemplateId, occurrence_date: NaiveDate) -> Self {
        Self {
            template_id,
            occurrence_date,
            action: OverrideAction::Deleted,
        }
    }

    /// Date the occurrence is shown on once the override is applied.
    pub fn effective_date(&self) -> NaiveDate {
        match &self.action {
            OverrideAction::Modified(patch) => patch.effective_date.unwrap_or(self.occurrence_date),
            OverrideAction::Deleted => self.occurrence_date,
        }
    }
}

/// A concrete, displayable transaction. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInstance {
    pub template_id: TemplateId,
    pub occurrence_date: NaiveDate,
    pub effective_date: NaiveDate,
    pub kind: Kind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub recurrence: Recurrence,
    pub is_override: bool,
}

impl TransactionInstance {
    pub fn signed_amount(&self) -> Decimal {
        self.kind.sign(self.amount)
    }
}

/// A calendar month, always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    first_day: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=9999).contains(&year) {
            return Err(ValidationError::InvalidMonth(format!("{year}-{month:02}")));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| ValidationError::InvalidMonth(format!("{year:04}-{month:02}")))
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.succ().first_day.pred_opt().unwrap_or(self.first_day)
    }

    pub fn succ(&self) -> Self {
        Self {
            first_day: self
                .first_day
                .checked_add_months(Months::new(1))
                .unwrap_or(self.first_day),
        }
    }

    pub fn pred(&self) -> Self {
        Self {
            first_day: self
                .first_day
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.first_day),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        YearMonth::of(date) == *self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ValidationError::InvalidMonth(s.to_string());
        let (y, m) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum Period {
    Day { date: NaiveDate },
    /// Inclusive range; may be shorter than seven days at a month edge.
    Week { start: NaiveDate, end: NaiveDate },
    Month { month: YearMonth },
}

impl Period {
    pub fn start(&self) -> NaiveDate {
        match self {
            Period::Day { date } => *date,
            Period::Week { start, .. } => *start,
            Period::Month { month } => month.first_day(),
        }
    }

    pub fn end(&self) -> NaiveDate {
        match self {
            Period::Day { date } => *date,
            Period::Week { end, .. } => *end,
            Period::Month { month } => month.last_day(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Period::Day { date } => date.to_string(),
            Period::Week { start, end } => {
                let iso = start.iso_week();
                format!(
                    "{}-W{:02} ({} - {})",
                    iso.year(),
                    iso.week(),
                    start.format("%b %d"),
                    end.format("%b %d")
                )
            }
            Period::Month { month } => month.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub period: Period,
    pub opening_balance: Decimal,
    pub net_change: Decimal,
    pub closing_balance: Decimal,
}
