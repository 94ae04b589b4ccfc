// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The entry point front ends talk to.
//!
//! Instances are recomputed from the store on every query. The only thing kept
//! between calls is the per-month closing balance, which the store persists.
//! Every mutation invalidates closings from the earliest month it can touch
//! before it writes, so a write that fails halfway never leaves stale closings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::balance::{aggregate, day_periods, month_period, net_change, week_end, week_periods, week_start};
use crate::error::{LedgerResult, ValidationError};
use crate::models::{
    BalanceSnapshot, OccurrenceOverride, OverrideAction, OverridePatch, TemplateDraft, TemplateId,
    TransactionInstance, TransactionTemplate, YearMonth,
};
use crate::recurrence::template_generates;
use crate::resolver::{materialize, resolve};
use crate::store::TemplateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Extend the instance list of a month view to whole Monday-Sunday weeks.
    pub pad_weeks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub month: YearMonth,
    pub display_start: NaiveDate,
    pub display_end: NaiveDate,
    /// Instances between `display_start` and `display_end`.
    pub instances: Vec<TransactionInstance>,
    pub daily_balances: Vec<BalanceSnapshot>,
    pub weekly_balances: Vec<BalanceSnapshot>,
    pub monthly_balance: BalanceSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A recurring occurrence was masked by a deleted override.
    OccurrenceDeleted,
    /// The template was one-off and has been removed.
    TemplateDeleted,
}

pub struct Ledger<S> {
    store: S,
    options: LedgerOptions,
}

impl<S: TemplateStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, LedgerOptions::default())
    }

    pub fn with_options(store: S, options: LedgerOptions) -> Self {
        Self { store, options }
    }

    pub fn set_options(&mut self, options: LedgerOptions) {
        self.options = options;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn templates(&self) -> LedgerResult<Vec<TransactionTemplate>> {
        Ok(self.store.load_templates()?)
    }

    pub fn get_month_view(&mut self, month: YearMonth) -> LedgerResult<MonthView> {
        let templates = self.store.load_templates()?;
        let overrides = self.store.load_overrides()?;

        let (first, last) = (month.first_day(), month.last_day());
        let (display_start, display_end) = if self.options.pad_weeks {
            (week_start(first), week_end(last))
        } else {
            (first, last)
        };
        let instances = resolve(&templates, &overrides, display_start, display_end)?;
        let opening = self.opening_for(month, &templates, &overrides)?;

        let daily_balances = aggregate(&instances, opening, &day_periods(first, last))?;
        let weekly_balances = aggregate(&instances, opening, &week_periods(month))?;

        let in_month: Vec<TransactionInstance> = instances
            .iter()
            .filter(|i| month.contains(i.effective_date))
            .cloned()
            .collect();
        let net = net_change(&in_month);
        let monthly_balance = BalanceSnapshot {
            period: month_period(month),
            opening_balance: opening,
            net_change: net,
            closing_balance: opening + net,
        };
        self.store.save_closing(month, monthly_balance.closing_balance)?;

        debug!(
            "Month view {} with {} instances, closing {}",
            month,
            instances.len(),
            monthly_balance.closing_balance
        );
        Ok(MonthView {
            month,
            display_start,
            display_end,
            instances,
            daily_balances,
            weekly_balances,
            monthly_balance,
        })
    }

    pub fn instances_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<TransactionInstance>> {
        let templates = self.store.load_templates()?;
        let overrides = self.store.load_overrides()?;
        Ok(resolve(&templates, &overrides, start, end)?)
    }

    /// Balance at the end of `date`.
    pub fn balance_on(&mut self, date: NaiveDate) -> LedgerResult<Decimal> {
        let templates = self.store.load_templates()?;
        let overrides = self.store.load_overrides()?;
        let month = YearMonth::of(date);
        let opening = self.opening_for(month, &templates, &overrides)?;
        let so_far = resolve(&templates, &overrides, month.first_day(), date)?;
        Ok(opening + net_change(&so_far))
    }

    /// Closing balance of the month before `month`, walking forward from the last
    /// persisted closing when needed.
    fn opening_for(
        &mut self,
        month: YearMonth,
        templates: &[TransactionTemplate],
        overrides: &[OccurrenceOverride],
    ) -> LedgerResult<Decimal> {
        if let Some(closing) = self.store.load_closing(month.pred())? {
            return Ok(closing);
        }
        let opening = self.store.opening_balance()?;
        let Some(epoch) = epoch(templates, overrides) else {
            return Ok(opening);
        };
        let epoch_month = YearMonth::of(epoch);
        if month <= epoch_month {
            return Ok(opening);
        }

        let (mut cursor, mut balance) = match self.store.latest_closing_before(month)? {
            Some((closed, closing)) => (closed.succ().max(epoch_month), closing),
            None => (epoch_month, opening),
        };
        debug!("Carrying balance forward from {} to {}", cursor, month);
        while cursor < month {
            let instances = resolve(templates, overrides, cursor.first_day(), cursor.last_day())?;
            balance += net_change(&instances);
            self.store.save_closing(cursor, balance)?;
            cursor = cursor.succ();
        }
        Ok(balance)
    }

    pub fn add_transaction(&mut self, draft: TemplateDraft) -> LedgerResult<TransactionTemplate> {
        draft.validate()?;
        self.invalidate_from(draft.anchor_date)?;
        let id = self.store.save_template(&draft)?;
        info!(
            "Added {} template [{}] {} {} on {}",
            draft.recurrence, id, draft.kind, draft.amount, draft.anchor_date
        );
        Ok(TransactionTemplate::from_draft(id, draft))
    }

    /// Stores several templates at once. Either every draft is stored or none is.
    pub fn add_transactions(
        &mut self,
        drafts: Vec<TemplateDraft>,
    ) -> LedgerResult<Vec<TransactionTemplate>> {
        for draft in &drafts {
            draft.validate()?;
        }
        let Some(earliest) = drafts.iter().map(|d| d.anchor_date).min() else {
            return Ok(Vec::new());
        };
        self.invalidate_from(earliest)?;
        let ids = self.store.save_templates(&drafts)?;
        let saved: Vec<TransactionTemplate> = ids
            .into_iter()
            .zip(drafts)
            .map(|(id, draft)| TransactionTemplate::from_draft(id, draft))
            .collect();
        info!("Added {} templates", saved.len());
        Ok(saved)
    }

    /// Replaces a whole series. Existing overrides keep their occurrence keys.
    pub fn update_template(&mut self, template: TransactionTemplate) -> LedgerResult<()> {
        template.to_draft().validate()?;
        let current = self.template(template.id)?;
        let overrides = self.store.load_overrides()?;
        let earliest = earliest_for_template(&current, &overrides).min(template.anchor_date);
        self.invalidate_from(earliest)?;
        self.store.update_template(&template)?;
        info!("Updated template [{}]", template.id);
        Ok(())
    }

    pub fn delete_template(&mut self, id: TemplateId) -> LedgerResult<()> {
        let current = self.template(id)?;
        let overrides = self.store.load_overrides()?;
        let earliest = earliest_for_template(&current, &overrides);
        self.invalidate_from(earliest)?;
        self.store.delete_template(id)?;
        info!("Deleted template [{}]", id);
        Ok(())
    }

    /// Edits one occurrence. A previous edit of the same occurrence is kept for the
    /// fields `patch` leaves unset.
    pub fn edit_instance(
        &mut self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
        patch: OverridePatch,
    ) -> LedgerResult<TransactionInstance> {
        patch.validate()?;
        let template = self.occurrence_template(template_id, occurrence_date)?;
        let existing = self.find_override(template_id, occurrence_date)?;

        let merged = match existing.as_ref().map(|o| &o.action) {
            Some(OverrideAction::Modified(old)) => old.clone().merged_with(patch),
            Some(OverrideAction::Deleted) | None => patch,
        };
        let o = OccurrenceOverride::modified(template_id, occurrence_date, merged);

        let mut earliest = occurrence_date.min(o.effective_date());
        if let Some(old) = &existing {
            earliest = earliest.min(old.effective_date());
        }
        self.invalidate_from(earliest)?;
        self.store.save_override(&o)?;
        info!("Edited occurrence [{}]:[{}]", template_id, occurrence_date);

        materialize(&template, occurrence_date, Some(&o)).ok_or(
            ValidationError::NoSuchOccurrence {
                template_id,
                occurrence_date,
            }
            .into(),
        )
    }

    /// Deletes one occurrence. Deleting the only occurrence of a one-off template
    /// deletes the template.
    pub fn delete_instance(
        &mut self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> LedgerResult<DeleteOutcome> {
        let template = self.occurrence_template(template_id, occurrence_date)?;
        if !template.recurrence.is_recurring() {
            self.delete_template(template_id)?;
            return Ok(DeleteOutcome::TemplateDeleted);
        }
        let existing = self.find_override(template_id, occurrence_date)?;
        let earliest = existing
            .map(|o| o.effective_date().min(occurrence_date))
            .unwrap_or(occurrence_date);
        self.invalidate_from(earliest)?;
        self.store
            .save_override(&OccurrenceOverride::deleted(template_id, occurrence_date))?;
        info!("Deleted occurrence [{}]:[{}]", template_id, occurrence_date);
        Ok(DeleteOutcome::OccurrenceDeleted)
    }

    /// Drops any edit or deletion of one occurrence.
    pub fn restore_instance(
        &mut self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> LedgerResult<bool> {
        let Some(existing) = self.find_override(template_id, occurrence_date)? else {
            return Ok(false);
        };
        self.invalidate_from(existing.effective_date().min(occurrence_date))?;
        let removed = self.store.delete_override(template_id, occurrence_date)?;
        info!("Restored occurrence [{}]:[{}]", template_id, occurrence_date);
        Ok(removed)
    }

    pub fn opening_balance(&self) -> LedgerResult<Decimal> {
        Ok(self.store.opening_balance()?)
    }

    pub fn set_opening_balance(&mut self, amount: Decimal) -> LedgerResult<()> {
        self.store.invalidate_closings_from(YearMonth::new(1, 1)?)?;
        self.store.set_opening_balance(amount)?;
        info!("Opening balance set to {}", amount);
        Ok(())
    }

    /// Removes overrides whose template no longer exists.
    pub fn purge_orphans(&mut self) -> LedgerResult<usize> {
        let removed = self.store.purge_orphan_overrides()?;
        if removed > 0 {
            info!("Purged {} orphan overrides", removed);
        }
        Ok(removed)
    }

    pub fn template(&self, id: TemplateId) -> LedgerResult<TransactionTemplate> {
        self.store
            .load_templates()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTemplate(id).into())
    }

    fn occurrence_template(
        &self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> LedgerResult<TransactionTemplate> {
        let template = self.template(template_id)?;
        if !template_generates(&template, occurrence_date) {
            return Err(ValidationError::NoSuchOccurrence {
                template_id,
                occurrence_date,
            }
            .into());
        }
        Ok(template)
    }

    fn find_override(
        &self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> LedgerResult<Option<OccurrenceOverride>> {
        Ok(self
            .store
            .load_overrides()?
            .into_iter()
            .find(|o| o.template_id == template_id && o.occurrence_date == occurrence_date))
    }

    fn invalidate_from(&mut self, date: NaiveDate) -> LedgerResult<()> {
        let month = YearMonth::of(date);
        debug!("Invalidating closings from {}", month);
        self.store.invalidate_closings_from(month)?;
        Ok(())
    }
}

/// Earliest date any instance can have.
fn epoch(templates: &[TransactionTemplate], overrides: &[OccurrenceOverride]) -> Option<NaiveDate> {
    let anchors = templates.iter().map(|t| t.anchor_date);
    let moved = overrides.iter().map(OccurrenceOverride::effective_date);
    anchors.chain(moved).min()
}

/// Earliest date an instance of `template` currently occupies.
fn earliest_for_template(template: &TransactionTemplate, overrides: &[OccurrenceOverride]) -> NaiveDate {
    overrides
        .iter()
        .filter(|o| o.template_id == template.id)
        .map(OccurrenceOverride::effective_date)
        .fold(template.anchor_date, NaiveDate::min)
}
