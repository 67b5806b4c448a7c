// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn trip_arg() -> Arg {
    Arg::new("trip")
        .long("trip")
        .short('t')
        .help("Trip name (defaults to the one chosen with 'trip use')")
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("tripsplit")
        .version(crate_version!())
        .about("Split shared trip expenses across currencies and settle up")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(trip_cmd())
        .subcommand(member_cmd())
        .subcommand(expense_cmd())
        .subcommand(rate_cmd())
        .subcommand(settle_cmd())
        .subcommand(report_cmd())
        .subcommand(
            Command::new("doctor")
                .about("Check a trip for data the settlement cannot handle exactly")
                .arg(trip_arg()),
        )
}

fn trip_cmd() -> Command {
    Command::new("trip")
        .about("Create and select trips")
        .subcommand(
            Command::new("create")
                .about("Create a trip and make it current")
                .arg(Arg::new("name").required(true))
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .short('c')
                        .help("Base currency (defaults to the configured default)"),
                )
                .arg(Arg::new("start").long("start").help("YYYY-MM-DD"))
                .arg(Arg::new("end").long("end").help("YYYY-MM-DD")),
        )
        .subcommand(Command::new("list").about("List trips").args(json_args()))
        .subcommand(
            Command::new("use")
                .about("Make a trip current")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(Command::new("show").about("Show trip details").arg(trip_arg()))
        .subcommand(
            Command::new("rename")
                .about("Rename a trip")
                .arg(Arg::new("new").required(true))
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("dates")
                .about("Change trip dates; omitted dates stay as they are")
                .arg(Arg::new("start").long("start").help("YYYY-MM-DD, or 'none' to clear"))
                .arg(Arg::new("end").long("end").help("YYYY-MM-DD, or 'none' to clear"))
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("set-currency")
                .about("Change the base currency (clears custom rates)")
                .arg(Arg::new("currency").required(true))
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a trip with all its members and expenses")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("default-currency")
                .about("Set the base currency used for new trips")
                .arg(Arg::new("currency").required(true)),
        )
}

fn member_cmd() -> Command {
    Command::new("member")
        .about("Manage trip members")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("avatar").long("avatar"))
                .arg(Arg::new("color").long("color"))
                .arg(trip_arg()),
        )
        .subcommand(Command::new("list").args(json_args()).arg(trip_arg()))
        .subcommand(
            Command::new("rename")
                .arg(Arg::new("old").required(true))
                .arg(Arg::new("new").required(true))
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("set")
                .about("Change a member's avatar or colour")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("avatar").long("avatar"))
                .arg(Arg::new("color").long("color"))
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a member; expenses they paid are removed too")
                .arg(Arg::new("name").required(true))
                .arg(trip_arg()),
        )
}

/// Fields of an expense. `add` requires payer and amount and fills defaults;
/// `edit` takes every field as optional and keeps what is not given.
fn expense_args(add: bool) -> Vec<Arg> {
    let mut category = Arg::new("category")
        .long("category")
        .help("transport|accommodation|food|entertainment|shopping|other");
    let mut split = Arg::new("split").long("split").help("equal|custom");
    if add {
        category = category.default_value("other");
        split = split.default_value("equal");
    }
    vec![
        Arg::new("payer").long("payer").short('p').required(add),
        Arg::new("amount").long("amount").short('a').required(add),
        Arg::new("currency")
            .long("currency")
            .short('c')
            .help("Defaults to the trip's base currency"),
        Arg::new("desc").long("desc").short('d'),
        Arg::new("date")
            .long("date")
            .help("YYYY-MM-DD, defaults to today"),
        category,
        Arg::new("participants")
            .long("participants")
            .value_delimiter(',')
            .action(ArgAction::Append)
            .help("Comma separated member names, defaults to everyone"),
        split,
        Arg::new("share")
            .long("share")
            .action(ArgAction::Append)
            .help("name=amount in the expense currency, for custom splits"),
        trip_arg(),
    ]
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Record shared expenses")
        .subcommand(Command::new("add").args(expense_args(true)))
        .subcommand(
            Command::new("edit")
                .about("Change fields of an expense")
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .args(expense_args(false)),
        )
        .subcommand(
            Command::new("list")
                .args(json_args())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                )
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("rm")
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(trip_arg()),
        )
}

fn rate_cmd() -> Command {
    Command::new("rate")
        .about("Custom exchange rates: 1 CURRENCY = RATE base currency")
        .subcommand(
            Command::new("set")
                .arg(Arg::new("currency").required(true))
                .arg(Arg::new("rate").required(true))
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("rm")
                .arg(Arg::new("currency").required(true))
                .arg(trip_arg()),
        )
        .subcommand(Command::new("list").args(json_args()).arg(trip_arg()))
        .subcommand(
            Command::new("convert")
                .arg(Arg::new("amount").required(true))
                .arg(Arg::new("from").required(true))
                .arg(Arg::new("to").help("Defaults to the trip's base currency"))
                .arg(trip_arg()),
        )
}

fn settle_cmd() -> Command {
    Command::new("settle")
        .about("Balances and suggested transfers")
        .subcommand(
            Command::new("balances")
                .args(json_args())
                .arg(trip_arg()),
        )
        .subcommand(
            Command::new("transfers")
                .args(json_args())
                .arg(trip_arg()),
        )
        .subcommand(Command::new("summary").arg(trip_arg()))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Spending totals in the base currency")
        .subcommand(Command::new("total").arg(trip_arg()))
        .subcommand(
            Command::new("by-category")
                .args(json_args())
                .arg(trip_arg()),
        )
        .subcommand(Command::new("by-date").args(json_args()).arg(trip_arg()))
}
