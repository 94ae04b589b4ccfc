// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TemplateId;

/// Input rejected before it reaches the store or the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),
    #[error("End date {end_date} is before anchor date {anchor_date}")]
    EndBeforeAnchor {
        anchor_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Unknown recurrence '{0}', expected once, weekly, biweekly or monthly")]
    UnknownRecurrence(String),
    #[error("Unknown transaction kind '{0}', expected deposit or withdrawal")]
    UnknownKind(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("Balance periods must be chronological and must not overlap")]
    UnorderedPeriods,
    #[error("Template [{0}] does not exist")]
    UnknownTemplate(TemplateId),
    #[error("Template [{template_id}] has no occurrence on {occurrence_date}")]
    NoSuchOccurrence {
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Storage error: corrupt value '{value}' in column {column}")]
    Corrupt { column: &'static str, value: String },
}

impl StorageError {
    pub fn corrupt(column: &'static str, value: impl Into<String>) -> Self {
        Self::Corrupt {
            column,
            value: value.into(),
        }
    }
}

/// Everything the ledger facade can fail with.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
