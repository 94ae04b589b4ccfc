// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, Arg, ArgAction, Command};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn occurrence_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("id")
            .long("id")
            .required(true)
            .help("Template id"),
    )
    .arg(
        Arg::new("date")
            .long("date")
            .required(true)
            .help("Original occurrence date (YYYY-MM-DD)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("paytrack")
        .version(crate_version!())
        .about("Calendar payment tracker with recurring transactions and carried-over balances")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("PAYTRACK_DB")
                .help("Database file (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .global(true)
                .env("PAYTRACK_LOG")
                .default_value("warn")
                .help("error, warn, info, debug or trace"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .about("Add a one-off or recurring transaction")
                        .arg(Arg::new("date").long("date").required(true).help("Anchor date (YYYY-MM-DD)"))
                        .arg(Arg::new("amount").long("amount").required(true).help("Non-negative amount"))
                        .arg(Arg::new("kind").long("kind").default_value("withdrawal").help("deposit or withdrawal"))
                        .arg(
                            Arg::new("recurrence")
                                .long("recurrence")
                                .default_value("once")
                                .help("once, weekly, biweekly or monthly"),
                        )
                        .arg(Arg::new("until").long("until").help("Last possible occurrence date"))
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("payee").long("payee")),
                )
                .subcommand(
                    Command::new("add-batch")
                        .about("Add many transactions from a JSON lines file, all or nothing")
                        .arg(
                            Arg::new("file")
                                .long("file")
                                .required(true)
                                .help("One transaction object per line"),
                        ),
                )
                .subcommand(
                    Command::new("update")
                        .about("Change a whole series")
                        .arg(Arg::new("id").long("id").required(true).help("Template id"))
                        .arg(Arg::new("date").long("date").help("New anchor date (YYYY-MM-DD)"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("recurrence").long("recurrence"))
                        .arg(Arg::new("until").long("until").conflicts_with("no_until"))
                        .arg(
                            Arg::new("no_until")
                                .long("no-until")
                                .action(ArgAction::SetTrue)
                                .help("Repeat without an end date"),
                        )
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("payee").long("payee")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .about("List the instances of a month")
                        .arg(Arg::new("month").long("month").help("YYYY-MM, defaults to the current month"))
                        .arg(Arg::new("search").long("search").help("Text in description, category or payee"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("min").long("min"))
                        .arg(Arg::new("max").long("max")),
                ))
                .subcommand(occurrence_args(
                    Command::new("edit")
                        .about("Edit one occurrence")
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("payee").long("payee"))
                        .arg(Arg::new("move_to").long("move-to").help("Show the occurrence on another date")),
                ))
                .subcommand(occurrence_args(
                    Command::new("rm").about("Delete one occurrence (or a one-off transaction)"),
                ))
                .subcommand(occurrence_args(
                    Command::new("restore").about("Undo edits or deletion of one occurrence"),
                ))
                .subcommand(
                    Command::new("drop")
                        .about("Delete a template and all of its occurrences")
                        .arg(Arg::new("id").long("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("month")
                .about("Calendar view of a month with weekly and monthly balances")
                .arg(Arg::new("month").long("month").help("YYYY-MM, defaults to the current month"))
                .arg(
                    Arg::new("pad")
                        .long("pad")
                        .action(ArgAction::SetTrue)
                        .help("Include the partial weeks around the month"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print JSON"),
                ),
        )
        .subcommand(
            Command::new("balance")
                .about("Balance at the end of a day")
                .arg(Arg::new("on").long("on").help("YYYY-MM-DD, defaults to today")),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(
                    Command::new("opening-balance")
                        .about("Balance before the first transaction")
                        .arg(Arg::new("amount").required(true).allow_hyphen_values(true)),
                )
                .subcommand(Command::new("show").about("Show settings")),
        )
        .subcommand(Command::new("doctor").about("Find and reclaim stale overrides"))
}
