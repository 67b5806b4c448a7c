// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod trips;
pub mod members;
pub mod expenses;
pub mod rates;
pub mod settle;
pub mod reports;
pub mod doctor;

/// Trip selected by `--trip`, falling back to the current trip.
pub(crate) fn trip_of(conn: &rusqlite::Connection, m: &clap::ArgMatches) -> anyhow::Result<i64> {
    crate::store::resolve_trip(conn, m.get_one::<String>("trip").map(String::as_str))
}
