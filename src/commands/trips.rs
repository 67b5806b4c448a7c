// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::trip_of;
use crate::store::{self, NewTrip};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => create(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = store::trip_id_by_name(conn, name)?;
            store::set_current_trip(conn, id)?;
            println!("Now using trip '{}'", name);
        }
        Some(("show", sub)) => show(conn, sub)?,
        Some(("rename", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let new = sub.get_one::<String>("new").unwrap();
            store::rename_trip(conn, trip_id, new)?;
            println!("Trip renamed to '{}'", new.trim());
        }
        Some(("dates", sub)) => dates(conn, sub)?,
        Some(("set-currency", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let ccy = sub.get_one::<String>("currency").unwrap();
            store::set_trip_currency(conn, trip_id, ccy)?;
            println!("Base currency set to {}; custom rates cleared", ccy.to_uppercase());
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = store::trip_id_by_name(conn, name)?;
            store::remove_trip(conn, id)?;
            println!("Removed trip '{}'", name);
        }
        Some(("default-currency", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap();
            store::set_default_currency(conn, ccy)?;
            println!("New trips will use {}", ccy.to_uppercase());
        }
        _ => {}
    }
    Ok(())
}

fn create(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let currency = match sub.get_one::<String>("currency") {
        Some(c) => c.clone(),
        None => store::default_currency(conn)?,
    };
    let start_date = sub.get_one::<String>("start").map(|s| parse_date(s)).transpose()?;
    let end_date = sub.get_one::<String>("end").map(|s| parse_date(s)).transpose()?;
    let id = store::create_trip(
        conn,
        &NewTrip {
            name: name.clone(),
            currency,
            start_date,
            end_date,
        },
    )?;
    store::set_current_trip(conn, id)?;
    println!("Created trip '{}' and made it current", name.trim());
    Ok(())
}

/// `None` keeps the current date, `"none"` clears it.
fn date_arg(sub: &clap::ArgMatches, id: &str, current: Option<NaiveDate>) -> Result<Option<NaiveDate>> {
    match sub.get_one::<String>(id).map(|s| s.trim()) {
        None => Ok(current),
        Some(s) if s.eq_ignore_ascii_case("none") => Ok(None),
        Some(s) => Ok(Some(parse_date(s)?)),
    }
}

fn dates(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let start = date_arg(sub, "start", trip.start_date)?;
    let end = date_arg(sub, "end", trip.end_date)?;
    store::set_trip_dates(conn, trip.id, start, end)?;
    let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    println!("'{}' runs {} to {}", trip.name, show(start), show(end));
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let trips = store::list_trips(conn)?;
    if maybe_print_json(json_flag, jsonl_flag, &trips)? {
        return Ok(());
    }
    let current = store::current_trip_id(conn)?;
    let rows = trips
        .into_iter()
        .map(|t| {
            let marker = if Some(t.id) == current { "*" } else { "" };
            vec![
                marker.to_string(),
                t.name,
                t.currency,
                t.start_date.map(|d| d.to_string()).unwrap_or_default(),
                t.end_date.map(|d| d.to_string()).unwrap_or_default(),
                t.members.to_string(),
                t.expenses.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["", "Trip", "Base", "Start", "End", "Members", "Expenses"],
            rows
        )
    );
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let total = crate::settlement::stats::total_expenses(&trip.expenses);
    let dates = match (trip.start_date, trip.end_date) {
        (Some(s), Some(e)) => format!("{} to {}", s, e),
        (Some(s), None) => format!("from {}", s),
        (None, Some(e)) => format!("until {}", e),
        (None, None) => "-".to_string(),
    };
    let rows = vec![
        vec!["Name".to_string(), trip.name.clone()],
        vec!["Base currency".to_string(), trip.currency.clone()],
        vec!["Dates".to_string(), dates],
        vec!["Members".to_string(), trip.members.len().to_string()],
        vec!["Expenses".to_string(), trip.expenses.len().to_string()],
        vec!["Total spent".to_string(), fmt_money(&total, &trip.currency)],
        vec!["Custom rates".to_string(), trip.custom_rates.len().to_string()],
        vec!["Updated".to_string(), trip.updated_at.clone()],
    ];
    println!("{}", pretty_table(&["Field", "Value"], rows));
    Ok(())
}
