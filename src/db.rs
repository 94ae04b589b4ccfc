// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::models::{
    Kind, OccurrenceOverride, OverrideAction, OverridePatch, Recurrence, TemplateDraft,
    TemplateId, TransactionTemplate, YearMonth,
};
use crate::store::TemplateStore;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Paytrack", "paytrack"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("paytrack.sqlite"))
}

/// Opens the database at `path`, or at the platform data dir when `None`.
pub fn open_or_init(path: Option<&Path>) -> Result<SqliteStore> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    let store = SqliteStore::from_connection(conn)
        .with_context(|| format!("Initialize schema at {}", path.display()))?;
    Ok(store)
}

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS templates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK(kind IN ('deposit','withdrawal')),
        amount TEXT NOT NULL,
        description TEXT,
        category TEXT,
        payee TEXT,
        anchor_date TEXT NOT NULL,
        recurrence TEXT NOT NULL CHECK(recurrence IN ('once','weekly','biweekly','monthly')),
        end_date TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_templates_anchor ON templates(anchor_date);

    -- one row per edited or deleted occurrence
    CREATE TABLE IF NOT EXISTS overrides(
        template_id INTEGER NOT NULL,
        occurrence_date TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('modified','deleted')),
        amount TEXT,
        kind TEXT,
        description TEXT,
        category TEXT,
        payee TEXT,
        effective_date TEXT,
        PRIMARY KEY(template_id, occurrence_date),
        FOREIGN KEY(template_id) REFERENCES templates(id) ON DELETE CASCADE
    );

    -- closing balance per month, YYYY-MM
    CREATE TABLE IF NOT EXISTS month_closings(
        month TEXT PRIMARY KEY,
        closing TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn parse_date(column: &'static str, s: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StorageError::corrupt(column, s))
}

fn parse_opt_date(column: &'static str, s: Option<String>) -> Result<Option<NaiveDate>, StorageError> {
    s.map(|v| parse_date(column, &v)).transpose()
}

fn parse_amount(column: &'static str, s: &str) -> Result<Decimal, StorageError> {
    s.parse::<Decimal>()
        .map_err(|_| StorageError::corrupt(column, s))
}

fn parse_kind(s: &str) -> Result<Kind, StorageError> {
    s.parse::<Kind>().map_err(|_| StorageError::corrupt("kind", s))
}

fn template_from_row(r: &Row<'_>) -> Result<TransactionTemplate, StorageError> {
    let kind: String = r.get(1)?;
    let amount: String = r.get(2)?;
    let anchor: String = r.get(6)?;
    let recurrence: String = r.get(7)?;
    let end: Option<String> = r.get(8)?;
    Ok(TransactionTemplate {
        id: TemplateId(r.get(0)?),
        kind: parse_kind(&kind)?,
        amount: parse_amount("amount", &amount)?,
        description: r.get(3)?,
        category: r.get(4)?,
        payee: r.get(5)?,
        anchor_date: parse_date("anchor_date", &anchor)?,
        recurrence: recurrence
            .parse::<Recurrence>()
            .map_err(|_| StorageError::corrupt("recurrence", recurrence.as_str()))?,
        end_date: parse_opt_date("end_date", end)?,
    })
}

fn override_from_row(r: &Row<'_>) -> Result<OccurrenceOverride, StorageError> {
    let template_id = TemplateId(r.get(0)?);
    let occurrence: String = r.get(1)?;
    let occurrence_date = parse_date("occurrence_date", &occurrence)?;
    let status: String = r.get(2)?;
    let action = match status.as_str() {
        "deleted" => OverrideAction::Deleted,
        "modified" => {
            let amount: Option<String> = r.get(3)?;
            let kind: Option<String> = r.get(4)?;
            let effective: Option<String> = r.get(8)?;
            OverrideAction::Modified(OverridePatch {
                amount: amount.map(|a| parse_amount("amount", &a)).transpose()?,
                kind: kind.map(|k| parse_kind(&k)).transpose()?,
                description: r.get(5)?,
                category: r.get(6)?,
                payee: r.get(7)?,
                effective_date: parse_opt_date("effective_date", effective)?,
            })
        }
        other => return Err(StorageError::corrupt("status", other)),
    };
    Ok(OccurrenceOverride {
        template_id,
        occurrence_date,
        action,
    })
}

fn insert_template(conn: &Connection, draft: &TemplateDraft) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO templates(kind, amount, description, category, payee, anchor_date, recurrence, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            draft.kind.as_str(),
            draft.amount.to_string(),
            draft.description,
            draft.category,
            draft.payee,
            draft.anchor_date.to_string(),
            draft.recurrence.as_str(),
            draft.end_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

impl TemplateStore for SqliteStore {
    fn load_templates(&self) -> Result<Vec<TransactionTemplate>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, amount, description, category, payee, anchor_date, recurrence, end_date
             FROM templates ORDER BY id",
        )?;
        let mut rows = stmt.query([])?;
        let mut data = Vec::new();
        while let Some(r) = rows.next()? {
            data.push(template_from_row(r)?);
        }
        Ok(data)
    }

    fn load_overrides(&self) -> Result<Vec<OccurrenceOverride>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT template_id, occurrence_date, status, amount, kind, description, category, payee, effective_date
             FROM overrides ORDER BY template_id, occurrence_date",
        )?;
        let mut rows = stmt.query([])?;
        let mut data = Vec::new();
        while let Some(r) = rows.next()? {
            data.push(override_from_row(r)?);
        }
        Ok(data)
    }

    fn save_template(&mut self, draft: &TemplateDraft) -> Result<TemplateId, StorageError> {
        insert_template(&self.conn, draft)?;
        Ok(TemplateId(self.conn.last_insert_rowid()))
    }

    fn save_templates(&mut self, drafts: &[TemplateDraft]) -> Result<Vec<TemplateId>, StorageError> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            insert_template(&tx, draft)?;
            ids.push(TemplateId(tx.last_insert_rowid()));
        }
        tx.commit()?;
        Ok(ids)
    }

    fn update_template(&mut self, t: &TransactionTemplate) -> Result<bool, StorageError> {
        let changed = self.conn.execute(
            "UPDATE templates SET kind=?2, amount=?3, description=?4, category=?5, payee=?6,
                 anchor_date=?7, recurrence=?8, end_date=?9
             WHERE id=?1",
            params![
                t.id.0,
                t.kind.as_str(),
                t.amount.to_string(),
                t.description,
                t.category,
                t.payee,
                t.anchor_date.to_string(),
                t.recurrence.as_str(),
                t.end_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_template(&mut self, id: TemplateId) -> Result<bool, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM overrides WHERE template_id=?1", params![id.0])?;
        let removed = tx.execute("DELETE FROM templates WHERE id=?1", params![id.0])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn save_override(&mut self, o: &OccurrenceOverride) -> Result<(), StorageError> {
        let empty = OverridePatch::default();
        let patch = match &o.action {
            OverrideAction::Modified(patch) => patch,
            OverrideAction::Deleted => &empty,
        };
        self.conn.execute(
            "INSERT INTO overrides(template_id, occurrence_date, status, amount, kind, description, category, payee, effective_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(template_id, occurrence_date) DO UPDATE SET
                 status=excluded.status, amount=excluded.amount, kind=excluded.kind,
                 description=excluded.description, category=excluded.category,
                 payee=excluded.payee, effective_date=excluded.effective_date",
            params![
                o.template_id.0,
                o.occurrence_date.to_string(),
                o.action.status(),
                patch.amount.map(|a| a.to_string()),
                patch.kind.map(|k| k.as_str()),
                patch.description,
                patch.category,
                patch.payee,
                patch.effective_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    fn delete_override(
        &mut self,
        template_id: TemplateId,
        occurrence_date: NaiveDate,
    ) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM overrides WHERE template_id=?1 AND occurrence_date=?2",
            params![template_id.0, occurrence_date.to_string()],
        )?;
        Ok(removed > 0)
    }

    fn purge_orphan_overrides(&mut self) -> Result<usize, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM overrides WHERE template_id NOT IN (SELECT id FROM templates)",
            [],
        )?;
        Ok(removed)
    }

    fn load_closing(&self, month: YearMonth) -> Result<Option<Decimal>, StorageError> {
        let v: Option<String> = self
            .conn
            .query_row(
                "SELECT closing FROM month_closings WHERE month=?1",
                params![month.to_string()],
                |r| r.get(0),
            )
            .optional()?;
        v.map(|s| parse_amount("closing", &s)).transpose()
    }

    fn latest_closing_before(
        &self,
        month: YearMonth,
    ) -> Result<Option<(YearMonth, Decimal)>, StorageError> {
        let v: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT month, closing FROM month_closings WHERE month<?1 ORDER BY month DESC LIMIT 1",
                params![month.to_string()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        match v {
            Some((m, c)) => {
                let m = m
                    .parse::<YearMonth>()
                    .map_err(|_| StorageError::corrupt("month", m.as_str()))?;
                Ok(Some((m, parse_amount("closing", &c)?)))
            }
            None => Ok(None),
        }
    }

    fn save_closing(&mut self, month: YearMonth, closing: Decimal) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO month_closings(month, closing) VALUES (?1, ?2)
             ON CONFLICT(month) DO UPDATE SET closing=excluded.closing",
            params![month.to_string(), closing.to_string()],
        )?;
        Ok(())
    }

    fn invalidate_closings_from(&mut self, month: YearMonth) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM month_closings WHERE month>=?1",
            params![month.to_string()],
        )?;
        Ok(())
    }

    fn opening_balance(&self) -> Result<Decimal, StorageError> {
        let v: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key='opening_balance'",
                [],
                |r| r.get(0),
            )
            .optional()?;
        match v {
            Some(s) => parse_amount("opening_balance", &s),
            None => Ok(Decimal::ZERO),
        }
    }

    fn set_opening_balance(&mut self, amount: Decimal) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO settings(key, value) VALUES('opening_balance', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![amount.to_string()],
        )?;
        Ok(())
    }
}
