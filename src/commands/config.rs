// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::TemplateStore;
use crate::utils::{fmt_money, parse_decimal, pretty_table};
use anyhow::Result;

pub fn handle<S: TemplateStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("opening-balance", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").map(String::as_str).unwrap_or_default())?;
            ledger.set_opening_balance(amount)?;
            println!("Opening balance set to {}", fmt_money(&amount));
        }
        Some(("show", _)) => {
            let rows = vec![vec![
                "opening_balance".to_string(),
                fmt_money(&ledger.opening_balance()?),
            ]];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
