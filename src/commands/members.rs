// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::trip_of;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap();
            let avatar = sub.get_one::<String>("avatar").map(String::as_str);
            let color = sub.get_one::<String>("color").map(String::as_str);
            store::add_member(conn, trip_id, name, avatar, color)?;
            println!("Added member '{}'", name.trim());
        }
        Some(("list", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let members = store::list_members(conn, trip_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &members)? {
                let rows = members
                    .into_iter()
                    .map(|m| {
                        vec![
                            m.name,
                            m.avatar.unwrap_or_default(),
                            m.color.unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Name", "Avatar", "Color"], rows));
            }
        }
        Some(("rename", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let old = sub.get_one::<String>("old").unwrap();
            let new = sub.get_one::<String>("new").unwrap();
            store::rename_member(conn, trip_id, old, new)?;
            println!("Renamed '{}' to '{}'", old, new.trim());
        }
        Some(("set", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap();
            let id = store::member_id_by_name(conn, trip_id, name)?;
            let avatar = sub.get_one::<String>("avatar").map(String::as_str);
            let color = sub.get_one::<String>("color").map(String::as_str);
            store::update_member(conn, trip_id, id, avatar, color)?;
            println!("Updated member '{}'", name.trim());
        }
        Some(("rm", sub)) => {
            let trip_id = trip_of(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap();
            let id = store::member_id_by_name(conn, trip_id, name)?;
            store::remove_member(conn, trip_id, id)?;
            println!("Removed member '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
