// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns templates plus per-occurrence overrides into concrete instances.
//!
//! An instance belongs to a range when its *effective* date is inside it. An
//! occurrence moved out of the range is dropped, and an occurrence from outside
//! the range that an override moves into it is picked up. Every instance therefore
//! lands in exactly one month.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{
    OccurrenceOverride, OverrideAction, OverridePatch, TemplateId, TransactionInstance,
    TransactionTemplate,
};
use crate::recurrence::{expand, template_generates};

pub fn resolve(
    templates: &[TransactionTemplate],
    overrides: &[OccurrenceOverride],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Vec<TransactionInstance>, ValidationError> {
    if range_start > range_end {
        return Err(ValidationError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }

    let positions: HashMap<TemplateId, usize> = templates
        .iter()
        .enumerate()
        .map(|(pos, t)| (t.id, pos))
        .collect();

    let mut by_key: HashMap<(TemplateId, NaiveDate), &OccurrenceOverride> = HashMap::new();
    for o in overrides {
        if positions.contains_key(&o.template_id) {
            by_key.insert((o.template_id, o.occurrence_date), o);
        } else {
            debug!(
                "Skipping orphan override [{}]:[{}]",
                o.template_id, o.occurrence_date
            );
        }
    }

    let in_range = |date: NaiveDate| date >= range_start && date <= range_end;
    let mut resolved: Vec<(usize, TransactionInstance)> = Vec::new();

    for (pos, template) in templates.iter().enumerate() {
        for occurrence_date in expand(template, range_start, range_end)? {
            let found = by_key.get(&(template.id, occurrence_date)).copied();
            if let Some(instance) = materialize(template, occurrence_date, found) {
                if in_range(instance.effective_date) {
                    resolved.push((pos, instance));
                }
            }
        }
    }

    // Occurrences outside the range that were moved into it.
    for o in by_key.values() {
        let OverrideAction::Modified(patch) = &o.action else {
            continue;
        };
        let Some(effective_date) = patch.effective_date else {
            continue;
        };
        if in_range(o.occurrence_date) || !in_range(effective_date) {
            continue;
        }
        let Some(&pos) = positions.get(&o.template_id) else {
            continue;
        };
        let template = &templates[pos];
        if !template_generates(template, o.occurrence_date) {
            debug!(
                "Skipping stale override [{}]:[{}], template no longer fires on that date",
                o.template_id, o.occurrence_date
            );
            continue;
        }
        if let Some(instance) = materialize(template, o.occurrence_date, Some(o)) {
            resolved.push((pos, instance));
        }
    }

    resolved.sort_by(|(pos_a, a), (pos_b, b)| {
        a.effective_date
            .cmp(&b.effective_date)
            .then(pos_a.cmp(pos_b))
            .then(a.occurrence_date.cmp(&b.occurrence_date))
    });
    Ok(resolved.into_iter().map(|(_, instance)| instance).collect())
}

/// Applies an optional override to one occurrence. Returns `None` for a deleted occurrence.
pub fn materialize(
    template: &TransactionTemplate,
    occurrence_date: NaiveDate,
    found: Option<&OccurrenceOverride>,
) -> Option<TransactionInstance> {
    let base = TransactionInstance {
        template_id: template.id,
        occurrence_date,
        effective_date: occurrence_date,
        kind: template.kind,
        amount: template.amount,
        description: template.description.clone(),
        category: template.category.clone(),
        payee: template.payee.clone(),
        recurrence: template.recurrence,
        is_override: false,
    };
    match found.map(|o| &o.action) {
        None => Some(base),
        Some(OverrideAction::Deleted) => None,
        Some(OverrideAction::Modified(patch)) => Some(apply_patch(base, patch)),
    }
}

fn apply_patch(base: TransactionInstance, patch: &OverridePatch) -> TransactionInstance {
    TransactionInstance {
        effective_date: patch.effective_date.unwrap_or(base.effective_date),
        kind: patch.kind.unwrap_or(base.kind),
        amount: patch.amount.unwrap_or(base.amount),
        description: patch.description.clone().or(base.description),
        category: patch.category.clone().or(base.category),
        payee: patch.payee.clone().or(base.payee),
        is_override: true,
        ..base
    }
}
