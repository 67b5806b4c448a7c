// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::trip_of;
use crate::settlement::fx;
use crate::store;
use crate::utils::{maybe_print_json, parse_currency, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
            store::set_rate(conn, trip_id, &ccy, rate)?;
            println!("1 {} = {} base currency", ccy, rate);
        }
        Some(("rm", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let ccy = sub.get_one::<String>("currency").unwrap();
            if store::remove_rate(conn, trip_id, ccy)? {
                println!("Removed custom rate for {}", ccy.to_uppercase());
            } else {
                println!("No custom rate for {}", ccy.to_uppercase());
            }
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("convert", sub)) => convert_amount(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RateRow {
    pub currency: String,
    pub rate: Decimal,
    pub source: &'static str,
}

/// Rate of each known currency against the trip's base: custom rates first,
/// then every built-in currency that has no custom override.
pub fn effective_rates(conn: &Connection, trip_id: i64) -> Result<Vec<RateRow>> {
    let trip = store::load_trip(conn, trip_id)?;
    let mut out: Vec<RateRow> = trip
        .custom_rates
        .iter()
        .map(|(ccy, rate)| RateRow {
            currency: ccy.clone(),
            rate: *rate,
            source: "custom",
        })
        .collect();
    for ccy in fx::supported_currencies() {
        if *ccy == trip.currency || trip.custom_rates.contains_key(*ccy) {
            continue;
        }
        if fx::can_convert(ccy, &trip.currency, None) {
            out.push(RateRow {
                currency: ccy.to_string(),
                rate: fx::convert(Decimal::ONE, ccy, &trip.currency, None),
                source: "built-in",
            });
        }
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip_id = trip_of(conn, sub)?;
    let data = effective_rates(conn, trip_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let base = store::load_trip(conn, trip_id)?.currency;
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    format!("1 {}", r.currency),
                    format!("{:.6} {}", r.rate.round_dp(6), base),
                    r.source.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Unit", "Rate", "Source"], rows));
    }
    Ok(())
}

fn convert_amount(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, sub)?)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from = parse_currency(sub.get_one::<String>("from").unwrap())?;
    let to = match sub.get_one::<String>("to") {
        Some(t) => parse_currency(t)?,
        None => trip.currency.clone(),
    };
    // Custom rates only apply when converting into the base currency.
    let rates = (to == trip.currency).then_some(&trip.custom_rates);
    if !fx::can_convert(&from, &to, rates) {
        eprintln!("No rate known for {} -> {}; showing 1:1", from, to);
    }
    let res = fx::convert(amount, &from, &to, rates);
    println!("{} {} -> {:.4} {}", amount, from, res.round_dp(4), to);
    Ok(())
}
