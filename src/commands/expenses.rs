// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use crate::commands::trip_of;
use crate::error::EntryError;
use crate::models::{Category, MemberId, Split, Trip};
use crate::store::{self, NewExpense};
use crate::utils::{fmt_amount, maybe_print_json, parse_currency, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            store::remove_expense(conn, trip_id, id)?;
            println!("Removed expense #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn lookup(trip: &Trip, name: &str) -> Result<MemberId> {
    trip.members
        .iter()
        .find(|m| m.name == name.trim())
        .map(|m| m.id)
        .ok_or_else(|| anyhow!("Member '{}' not found", name.trim()))
}

fn parse_shares(trip: &Trip, sub: &clap::ArgMatches) -> Result<Option<BTreeMap<MemberId, Decimal>>> {
    let Some(raw_shares) = sub.get_many::<String>("share") else {
        return Ok(None);
    };
    let mut shares = BTreeMap::new();
    for raw in raw_shares {
        let (name, value) = raw
            .split_once('=')
            .with_context(|| format!("Invalid share '{}', expected name=amount", raw))?;
        shares.insert(lookup(trip, name)?, parse_decimal(value)?);
    }
    Ok(Some(shares))
}

/// Overwrite the fields given on the command line, keep the rest of `e`.
fn apply_fields(trip: &Trip, sub: &clap::ArgMatches, mut e: NewExpense) -> Result<NewExpense> {
    if let Some(name) = sub.get_one::<String>("payer") {
        e.payer_id = lookup(trip, name)?;
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        e.amount = parse_decimal(a)?;
    }
    if let Some(c) = sub.get_one::<String>("currency") {
        e.currency = parse_currency(c)?;
    }
    if let Some(d) = sub.get_one::<String>("date") {
        e.date = parse_date(d)?;
    }
    if let Some(c) = sub.get_one::<String>("category") {
        e.category = c.parse()?;
    }
    if let Some(d) = sub.get_one::<String>("desc") {
        e.description = d.clone();
    }
    if let Some(names) = sub.get_many::<String>("participants") {
        e.participants = names
            .filter(|n| !n.trim().is_empty())
            .map(|n| lookup(trip, n))
            .collect::<Result<Vec<_>>>()?;
    }

    let shares = parse_shares(trip, sub)?;
    match sub.get_one::<String>("split").map(|s| s.trim()) {
        Some("equal") => e.split = Split::Equal,
        Some("custom") => {
            let shares = shares.unwrap_or_else(|| match &e.split {
                Split::Custom(old) => old.clone(),
                Split::Equal => BTreeMap::new(),
            });
            e.split = Split::Custom(shares);
        }
        Some(other) => return Err(EntryError::UnknownSplitType(other.to_string()).into()),
        None => {
            if let Some(shares) = shares {
                e.split = Split::Custom(shares);
            }
        }
    }
    Ok(e)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip_id = trip_of(conn, sub)?;
    let trip = store::load_trip(conn, trip_id)?;
    let blank = NewExpense {
        description: String::new(),
        amount: Decimal::ZERO,
        currency: trip.currency.clone(),
        payer_id: 0,
        date: chrono::Local::now().date_naive(),
        category: Category::Other,
        participants: trip.members.iter().map(|m| m.id).collect(),
        split: Split::Equal,
    };
    let mut expense = apply_fields(&trip, sub, blank)?;
    if expense.description.trim().is_empty() {
        expense.description = expense.category.to_string();
    }
    let id = store::add_expense(conn, trip_id, &expense)?;
    println!(
        "Recorded #{}: {} {} paid by {} on {}",
        id,
        expense.currency,
        expense.amount,
        sub.get_one::<String>("payer").unwrap().trim(),
        expense.date
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip_id = trip_of(conn, sub)?;
    let trip = store::load_trip(conn, trip_id)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = trip
        .expenses
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| anyhow!("Expense {} not found in trip '{}'", id, trip.name))?;
    let existing = NewExpense {
        description: current.description.clone(),
        amount: current.amount,
        currency: current.currency.clone(),
        payer_id: current.payer_id,
        date: current.date,
        category: current.category,
        participants: current.participants.clone(),
        split: current.split.clone(),
    };
    let expense = apply_fields(&trip, sub, existing)?;
    store::update_expense(conn, trip_id, id, &expense)?;
    println!("Updated #{}: {} {}", id, expense.currency, expense.amount);
    Ok(())
}

#[derive(Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub category: String,
    pub payer: String,
    pub amount: String,
    pub currency: String,
    pub amount_in_base: String,
    pub split: String,
    pub participants: Vec<String>,
}

/// Expenses of the selected trip, newest first.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<ExpenseRow>> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let name_of = |id: i64| {
        trip.member(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    };
    let mut rows: Vec<ExpenseRow> = trip
        .expenses
        .iter()
        .rev()
        .map(|e| ExpenseRow {
            id: e.id,
            date: e.date.to_string(),
            description: e.description.clone(),
            category: e.category.to_string(),
            payer: name_of(e.payer_id),
            amount: e.amount.to_string(),
            currency: e.currency.clone(),
            amount_in_base: fmt_amount(&e.amount_in_base),
            split: e.split.kind().to_string(),
            participants: e.participants.iter().map(|id| name_of(*id)).collect(),
        })
        .collect();
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    Ok(rows)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date,
                    r.description,
                    r.category,
                    r.payer,
                    format!("{} {}", r.currency, r.amount),
                    r.amount_in_base,
                    r.split,
                    r.participants.join(", "),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["#", "Date", "Description", "Category", "Paid by", "Amount", "Base", "Split", "Shared by"],
                rows,
            )
        );
    }
    Ok(())
}
