// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::ledger::Ledger;
use crate::models::TemplateId;
use crate::recurrence::template_generates;
use crate::store::TemplateStore;
use crate::utils::pretty_table;
use anyhow::Result;

/// One finding per row: (issue, detail).
pub fn findings<S: TemplateStore>(ledger: &Ledger<S>) -> Result<Vec<Vec<String>>> {
    let templates: HashMap<TemplateId, _> = ledger
        .templates()?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let mut rows = Vec::new();

    for o in ledger.store().load_overrides()? {
        match templates.get(&o.template_id) {
            // 1) Overrides pointing at a template that is gone
            None => rows.push(vec![
                "orphan_override".into(),
                format!("template {} / {}", o.template_id, o.occurrence_date),
            ]),
            // 2) Overrides for a date the template no longer fires on
            Some(t) if !template_generates(t, o.occurrence_date) => rows.push(vec![
                "stale_override".into(),
                format!("template {} / {}", o.template_id, o.occurrence_date),
            ]),
            Some(_) => {}
        }
    }
    Ok(rows)
}

pub fn handle<S: TemplateStore>(ledger: &mut Ledger<S>) -> Result<()> {
    let rows = findings(ledger)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
        return Ok(());
    }
    println!("{}", pretty_table(&["Issue", "Detail"], rows));
    let purged = ledger.purge_orphans()?;
    if purged > 0 {
        println!("Reclaimed {} orphan overrides", purged);
    }
    Ok(())
}
