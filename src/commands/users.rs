// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::utils::{get_default_currency, maybe_print_json, optional, pretty_table, required};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let username = required(sub, "username")?;
    let currency = match optional(sub, "currency") {
        Some(c) => c.to_uppercase(),
        None => get_default_currency(conn)?,
    };
    add_user(conn, username, &currency)?;
    println!("Added user {} ({})", username, currency);
    Ok(())
}

pub fn add_user(conn: &Connection, username: &str, display_currency: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users(username, display_currency) VALUES (?1, ?2)",
        params![username, display_currency],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn query_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare("SELECT id, username, display_currency FROM users ORDER BY username")?;
    let rows = stmt.query_map([], |r| {
        Ok(User {
            id: r.get(0)?,
            username: r.get(1)?,
            display_currency: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let users = query_users(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
        let rows = users
            .into_iter()
            .map(|u| vec![u.id.to_string(), u.username, u.display_currency])
            .collect();
        println!("{}", pretty_table(&["ID", "User", "Display CCY"], rows));
    }
    Ok(())
}
