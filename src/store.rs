// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::StorageError;
use crate::models::{OccurrenceOverride, TemplateDraft, TemplateId, TransactionTemplate, YearMonth};

/// Persistence the ledger runs on. Every call either fully succeeds or leaves the
/// store untouched.
pub trait TemplateStore {
    /// All templates in insertion order.
    fn load_templates(&self) -> Result<Vec<TransactionTemplate>, StorageError>;
    fn load_overrides(&self) -> Result<Vec<OccurrenceOverride>, StorageError>;
    fn save_template(&mut self, draft: &TemplateDraft) -> Result<TemplateId, StorageError>;
    /// Stores every draft or none of them. Ids come back in draft order.
    fn save_templates(&mut self, drafts: &[TemplateDraft]) -> Result<Vec<TemplateId>, StorageError>;
    fn update_template(&mut self, template: &TransactionTemplate) -> Result<bool, StorageError>;
    /// Removes the template and every override that points at it.
    fn delete_template(&mut self, id: TemplateId) -> Result<bool, StorageError>;
    /// Inserts or replaces the override for `(template_id, occurrence_date)`.
    fn save_override(&mut self, o: &OccurrenceOverride) -> Result<(), StorageError>;
    fn delete_override(
        &mut self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> Result<bool, StorageError>;
    fn purge_orphan_overrides(&mut self) -> Result<usize, StorageError>;

    fn load_closing(&self, month: YearMonth) -> Result<Option<Decimal>, StorageError>;
    fn latest_closing_before(
        &self,
        month: YearMonth,
    ) -> Result<Option<(YearMonth, Decimal)>, StorageError>;
    fn save_closing(&mut self, month: YearMonth, closing: Decimal) -> Result<(), StorageError>;
    /// Forgets persisted closings for `month` and everything after it.
    fn invalidate_closings_from(&mut self, month: YearMonth) -> Result<(), StorageError>;

    fn opening_balance(&self) -> Result<Decimal, StorageError>;
    fn set_opening_balance(&mut self, amount: Decimal) -> Result<(), StorageError>;
}

/// Store kept entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    next_id: i64,
    templates: BTreeMap<TemplateId, TransactionTemplate>,
    overrides: BTreeMap<(TemplateId, NaiveDate), OccurrenceOverride>,
    closings: BTreeMap<YearMonth, Decimal>,
    opening_balance: Decimal,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persisted closings, for inspection.
    pub fn closings(&self) -> &BTreeMap<YearMonth, Decimal> {
        &self.closings
    }
}

impl TemplateStore for MemoryStore {
    fn load_templates(&self) -> Result<Vec<TransactionTemplate>, StorageError> {
        Ok(self.templates.values().cloned().collect())
    }

    fn load_overrides(&self) -> Result<Vec<OccurrenceOverride>, StorageError> {
        Ok(self.overrides.values().cloned().collect())
    }

    fn save_template(&mut self, draft: &TemplateDraft) -> Result<TemplateId, StorageError> {
        self.next_id += 1;
        let id = TemplateId(self.next_id);
        self.templates
            .insert(id, TransactionTemplate::from_draft(id, draft.clone()));
        Ok(id)
    }

    fn save_templates(&mut self, drafts: &[TemplateDraft]) -> Result<Vec<TemplateId>, StorageError> {
        let mut next_id = self.next_id;
        let staged: Vec<TransactionTemplate> = drafts
            .iter()
            .map(|draft| {
                next_id += 1;
                TransactionTemplate::from_draft(TemplateId(next_id), draft.clone())
            })
            .collect();

        self.next_id = next_id;
        let ids = staged.iter().map(|t| t.id).collect();
        self.templates.extend(staged.into_iter().map(|t| (t.id, t)));
        Ok(ids)
    }

    fn update_template(&mut self, template: &TransactionTemplate) -> Result<bool, StorageError> {
        match self.templates.get_mut(&template.id) {
            Some(slot) => {
                *slot = template.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_template(&mut self, id: TemplateId) -> Result<bool, StorageError> {
        let removed = self.templates.remove(&id).is_some();
        self.overrides.retain(|(template_id, _), _| *template_id != id);
        Ok(removed)
    }

    fn save_override(&mut self, o: &OccurrenceOverride) -> Result<(), StorageError> {
        self.overrides
            .insert((o.template_id, o.occurrence_date), o.clone());
        Ok(())
    }

    fn delete_override(
        &mut self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> Result<bool, StorageError> {
        Ok(self
            .overrides
            .remove(&(template_id, occurrence_date))
            .is_some())
    }

    fn purge_orphan_overrides(&mut self) -> Result<usize, StorageError> {
        let before = self.overrides.len();
        let templates = &self.templates;
        self.overrides
            .retain(|(template_id, _), _| templates.contains_key(template_id));
        Ok(before - self.overrides.len())
    }

    fn load_closing(&self, month: YearMonth) -> Result<Option<Decimal>, StorageError> {
        Ok(self.closings.get(&month).copied())
    }

    fn latest_closing_before(
        &self,
        month: YearMonth,
    ) -> Result<Option<(YearMonth, Decimal)>, StorageError> {
        Ok(self
            .closings
            .range(..month)
            .next_back()
            .map(|(m, v)| (*m, *v)))
    }

    fn save_closing(&mut self, month: YearMonth, closing: Decimal) -> Result<(), StorageError> {
        self.closings.insert(month, closing);
        Ok(())
    }

    fn invalidate_closings_from(&mut self, month: YearMonth) -> Result<(), StorageError> {
        self.closings.retain(|m, _| *m < month);
        Ok(())
    }

    fn opening_balance(&self) -> Result<Decimal, StorageError> {
        Ok(self.opening_balance)
    }

    fn set_opening_balance(&mut self, amount: Decimal) -> Result<(), StorageError> {
        self.opening_balance = amount;
        Ok(())
    }
}
