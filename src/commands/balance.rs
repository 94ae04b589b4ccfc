// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::TemplateStore;
use crate::utils::{fmt_money, parse_date};
use anyhow::Result;

pub fn handle<S: TemplateStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    let date = match m.get_one::<String>("on") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let balance = ledger.balance_on(date)?;
    println!("Balance at end of {}: {}", date, fmt_money(&balance));
    Ok(())
}
