// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::trip_of;
use crate::settlement::{self, EPSILON, render_summary};
use crate::store;
use crate::utils::{fmt_amount, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balances", sub)) => balances(conn, sub)?,
        Some(("transfers", sub)) => transfers(conn, sub)?,
        Some(("summary", sub)) => {
            let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
            let s = settlement::settle(&trip);
            println!(
                "{}",
                render_summary(&trip.name, &trip.currency, &s.balances, &s.transactions)
            );
        }
        _ => {}
    }
    Ok(())
}

fn balances(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let s = settlement::settle(&trip);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s.balances)? {
        return Ok(());
    }
    let mut sorted = s.balances;
    sorted.sort_by(|a, b| b.balance.cmp(&a.balance));
    let rows = sorted
        .into_iter()
        .map(|b| {
            let status = if b.balance > EPSILON {
                "receives"
            } else if b.balance < -EPSILON {
                "pays"
            } else {
                "settled"
            };
            vec![
                b.member_name,
                fmt_amount(&b.total_paid),
                fmt_amount(&b.total_owed),
                fmt_amount(&b.balance),
                status.to_string(),
            ]
        })
        .collect();
    let paid = format!("Paid ({})", trip.currency);
    let owed = format!("Share ({})", trip.currency);
    println!(
        "{}",
        pretty_table(&["Member", &paid, &owed, "Balance", "Status"], rows)
    );
    Ok(())
}

fn transfers(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let s = settlement::settle(&trip);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s.transactions)? {
        return Ok(());
    }
    if s.transactions.is_empty() {
        println!("All settled, nothing to transfer.");
        return Ok(());
    }
    let rows = s
        .transactions
        .into_iter()
        .map(|t| {
            vec![
                t.from_name,
                t.to_name,
                format!("{} {}", trip.currency, fmt_amount(&t.amount)),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["From", "To", "Amount"], rows));
    Ok(())
}
