// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Occurrence dates generated by a template's recurrence rule.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::ValidationError;
use crate::models::{Recurrence, TransactionTemplate};

/// Lazily yields the occurrence dates of a template inside `[range_start, range_end]`,
/// also bounded by the template's `end_date`.
///
/// Each date is computed from the anchor and an occurrence index, never from the
/// previous date, so a monthly rule anchored on the 31st goes Jan 31, Feb 29, Mar 31.
pub fn expand(
    template: &TransactionTemplate,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Occurrences, ValidationError> {
    if range_start > range_end {
        return Err(ValidationError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }
    let upper = match template.end_date {
        Some(end_date) => end_date.min(range_end),
        None => range_end,
    };
    let first = first_index_from(template.anchor_date, template.recurrence, range_start);
    Ok(Occurrences {
        anchor: template.anchor_date,
        recurrence: template.recurrence,
        next: Some(first),
        upper,
    })
}

/// True when `date` is one of the template's occurrences.
pub fn template_generates(template: &TransactionTemplate, date: NaiveDate) -> bool {
    match expand(template, date, date) {
        Ok(mut occurrences) => occurrences.next() == Some(date),
        Err(_) => false,
    }
}

#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: NaiveDate,
    recurrence: Recurrence,
    next: Option<u32>,
    upper: NaiveDate,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let index = self.next?;
        let date = nth_occurrence(self.anchor, self.recurrence, index).filter(|d| *d <= self.upper);
        self.next = match date {
            Some(_) if self.recurrence.is_recurring() => index.checked_add(1),
            _ => None,
        };
        date
    }
}

fn step_days(recurrence: Recurrence) -> Option<u64> {
    match recurrence {
        Recurrence::Weekly => Some(7),
        Recurrence::Biweekly => Some(14),
        Recurrence::Once | Recurrence::Monthly => None,
    }
}

fn nth_occurrence(anchor: NaiveDate, recurrence: Recurrence, index: u32) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Once => (index == 0).then_some(anchor),
        // chrono clamps to the last valid day of the target month
        Recurrence::Monthly => anchor.checked_add_months(Months::new(index)),
        Recurrence::Weekly | Recurrence::Biweekly => {
            let step = step_days(recurrence)?;
            anchor.checked_add_days(Days::new(step * u64::from(index)))
        }
    }
}

/// Index of the first occurrence on or after `start`.
fn first_index_from(anchor: NaiveDate, recurrence: Recurrence, start: NaiveDate) -> u32 {
    if start <= anchor {
        return 0;
    }
    match recurrence {
        Recurrence::Once => 1,
        Recurrence::Weekly | Recurrence::Biweekly => {
            let step = step_days(recurrence).unwrap_or(7) as i64;
            let days = (start - anchor).num_days();
            u32::try_from((days + step - 1) / step).unwrap_or(u32::MAX)
        }
        Recurrence::Monthly => {
            let months = (start.year() - anchor.year()) * 12 + start.month() as i32
                - anchor.month() as i32;
            let mut index = u32::try_from(months).unwrap_or(0);
            if nth_occurrence(anchor, recurrence, index).is_some_and(|d| d < start) {
                index = index.saturating_add(1);
            }
            index
        }
    }
}
