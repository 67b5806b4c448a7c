// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeSet, HashSet};

use crate::commands::trip_of;
use crate::models::{MemberId, Split, Trip};
use crate::settlement::{EPSILON, fx};
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn issue(kind: &'static str, detail: String) -> Issue {
    Issue { kind, detail }
}

/// Everything in a trip the settlement would only handle approximately.
pub fn find_issues(trip: &Trip) -> Vec<Issue> {
    let mut out = Vec::new();
    let members: HashSet<MemberId> = trip.members.iter().map(|m| m.id).collect();

    // 1) Currencies that would convert 1:1
    let unknown: BTreeSet<&str> = trip
        .expenses
        .iter()
        .map(|e| e.currency.as_str())
        .filter(|c| !fx::can_convert(c, &trip.currency, Some(&trip.custom_rates)))
        .collect();
    for c in unknown {
        out.push(issue("unknown_currency", format!("{} -> {}", c, trip.currency)));
    }

    for e in &trip.expenses {
        // 2) References to members that no longer exist
        if !members.contains(&e.payer_id) {
            out.push(issue(
                "dangling_payer",
                format!("#{} paid by missing member {}", e.id, e.payer_id),
            ));
        }
        let valid: Vec<MemberId> = e
            .participants
            .iter()
            .copied()
            .filter(|id| members.contains(id))
            .collect();
        for id in e.participants.iter().filter(|id| !members.contains(id)) {
            out.push(issue(
                "dangling_participant",
                format!("#{} shared with missing member {}", e.id, id),
            ));
        }

        // 3) Nobody left to carry the cost
        if valid.is_empty() {
            out.push(issue(
                "unallocated_expense",
                format!("#{} {} {} has no participants", e.id, e.currency, e.amount),
            ));
            continue;
        }

        // 4) Custom shares that no longer add up
        if let Split::Custom(shares) = &e.split {
            let sum: Decimal = valid.iter().filter_map(|id| shares.get(id)).sum();
            if (sum - e.amount).abs() > EPSILON {
                out.push(issue(
                    "split_mismatch",
                    format!("#{} shares {} of {} {}", e.id, sum, e.currency, e.amount),
                ));
            }
        }
    }
    out
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let trip = store::load_trip(conn, trip_of(conn, m)?)?;
    let issues = find_issues(&trip);
    if issues.is_empty() {
        println!("doctor: no issues found in '{}'", trip.name);
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
