// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::trip_of;
use crate::settlement::stats::{expenses_by_category, expenses_by_date, total_expenses};
use crate::store;
use crate::utils::{fmt_amount, fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("total", sub)) => {
            let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
            let total = total_expenses(&trip.expenses);
            println!(
                "{}: {} across {} expenses",
                trip.name,
                fmt_money(&total, &trip.currency),
                trip.expenses.len()
            );
        }
        Some(("by-category", sub)) => by_category(conn, sub)?,
        Some(("by-date", sub)) => by_date(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let mut items: Vec<_> = expenses_by_category(&trip.expenses).into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    let data: Vec<Vec<String>> = items
        .into_iter()
        .map(|(cat, amt)| vec![cat.to_string(), fmt_amount(&amt)])
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let hdr = format!("Spent ({})", trip.currency);
        println!("{}", pretty_table(&["Category", &hdr], data));
    }
    Ok(())
}

fn by_date(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let data: Vec<Vec<String>> = expenses_by_date(&trip.expenses)
        .into_iter()
        .map(|(date, amt)| vec![date.to_string(), fmt_amount(&amt)])
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let hdr = format!("Spent ({})", trip.currency);
        println!("{}", pretty_table(&["Date", &hdr], data));
    }
    Ok(())
}
