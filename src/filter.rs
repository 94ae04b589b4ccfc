// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Kind, TransactionInstance};

/// Criteria for narrowing a list of resolved instances. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceFilter {
    pub text: Option<String>,
    pub kind: Option<Kind>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl InstanceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive match against description, category and payee.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = (!text.trim().is_empty()).then(|| text.trim().to_lowercase());
        self
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn amount_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn dates_between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn matches(&self, instance: &TransactionInstance) -> bool {
        if let Some(needle) = &self.text {
            let hit = [&instance.description, &instance.category, &instance.payee]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        if self.kind.is_some_and(|k| k != instance.kind) {
            return false;
        }
        if self.min_amount.is_some_and(|min| instance.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| instance.amount > max) {
            return false;
        }
        if self.start_date.is_some_and(|d| instance.effective_date < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| instance.effective_date > d) {
            return false;
        }
        true
    }

    pub fn apply(&self, instances: Vec<TransactionInstance>) -> Vec<TransactionInstance> {
        instances.into_iter().filter(|i| self.matches(i)).collect()
    }
}
