// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Security;
use crate::utils::{
    maybe_print_json, optional, parse_decimal, pretty_table, required, stored_decimal,
};
use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let ticker = required(sub, "ticker")?.to_uppercase();
    let currency = required(sub, "currency")?.to_uppercase();
    let price = match optional(sub, "price") {
        Some(raw) => parse_decimal(raw)?,
        None => Decimal::ZERO,
    };
    let pays_dividends = sub.get_flag("dividends");
    add_security(conn, &ticker, &currency, price, pays_dividends)?;
    println!("Added security {} ({}) @ {}", ticker, currency, price);
    Ok(())
}

pub fn add_security(
    conn: &Connection,
    ticker: &str,
    base_currency: &str,
    last_price: Decimal,
    pays_dividends: bool,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO securities(ticker, base_currency, last_price, pays_dividends)
         VALUES (?1, ?2, ?3, ?4)",
        params![ticker, base_currency, last_price.to_string(), pays_dividends],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn query_securities(conn: &Connection) -> Result<Vec<Security>> {
    let mut stmt = conn.prepare(
        "SELECT id, ticker, base_currency, last_price, pays_dividends FROM securities ORDER BY ticker",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, bool>(4)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, ticker, base_currency, price_s, pays_dividends) = row?;
        let last_price = stored_decimal(&format!("last price of {}", ticker), &price_s)?;
        out.push(Security {
            id,
            ticker,
            base_currency,
            last_price,
            pays_dividends,
        });
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let securities = query_securities(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &securities)? {
        let rows = securities
            .into_iter()
            .map(|s| {
                vec![
                    s.ticker,
                    s.base_currency,
                    format!("{:.2}", s.last_price),
                    if s.pays_dividends { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Ticker", "CCY", "Last Price", "Dividends"], rows)
        );
    }
    Ok(())
}
