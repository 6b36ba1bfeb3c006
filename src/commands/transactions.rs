// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::utils::{
    id_for_security, id_for_user, maybe_print_json, optional, parse_date, parse_decimal,
    pretty_table, required,
};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("buy", sub)) => add(conn, TxKind::Buy, sub)?,
        Some(("sell", sub)) => add(conn, TxKind::Sell, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// A ledger row to be recorded. `currency` falls back to the security's
/// base currency.
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub user_id: i64,
    pub security_id: i64,
    pub date: NaiveDate,
    pub kind: TxKind,
    pub units: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    pub currency: Option<&'a str>,
}

pub fn record(conn: &Connection, tx: &NewTransaction<'_>) -> Result<i64> {
    if tx.units <= Decimal::ZERO {
        bail!("Units must be positive, got {}", tx.units);
    }
    if tx.fees.is_sign_negative() {
        bail!("Fees must not be negative, got {}", tx.fees);
    }
    let currency = match tx.currency {
        Some(c) => c.to_uppercase(),
        None => conn.query_row(
            "SELECT base_currency FROM securities WHERE id=?1",
            params![tx.security_id],
            |r| r.get::<_, String>(0),
        )?,
    };
    conn.execute(
        "INSERT INTO transactions(user_id, security_id, date, kind, units, unit_price, fees, currency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            tx.user_id,
            tx.security_id,
            tx.date.to_string(),
            tx.kind.as_str(),
            tx.units.to_string(),
            tx.unit_price.to_string(),
            tx.fees.to_string(),
            currency
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn add(conn: &Connection, kind: TxKind, sub: &clap::ArgMatches) -> Result<()> {
    let username = required(sub, "user")?;
    let ticker = required(sub, "ticker")?;
    let tx = NewTransaction {
        user_id: id_for_user(conn, username)?,
        security_id: id_for_security(conn, ticker)?,
        date: parse_date(required(sub, "date")?)?,
        kind,
        units: parse_decimal(required(sub, "units")?)?,
        unit_price: parse_decimal(required(sub, "price")?)?,
        fees: match optional(sub, "fees") {
            Some(raw) => parse_decimal(raw)?,
            None => Decimal::ZERO,
        },
        currency: optional(sub, "currency"),
    };
    record(conn, &tx)?;
    println!(
        "Recorded {} of {} {} @ {} on {} for {}",
        kind, tx.units, ticker, tx.unit_price, tx.date, username
    );
    Ok(())
}

#[derive(Serialize)]
struct TxRow {
    id: i64,
    date: String,
    ticker: String,
    kind: String,
    units: String,
    unit_price: String,
    fees: String,
    currency: String,
}

fn query_rows(conn: &Connection, user_id: i64, ticker: Option<&str>) -> Result<Vec<TxRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, s.ticker, t.kind, t.units, t.unit_price, t.fees, t.currency
         FROM transactions t JOIN securities s ON s.id=t.security_id
         WHERE t.user_id=?1",
    );
    let mut args: Vec<rusqlite::types::Value> = vec![user_id.into()];
    if let Some(t) = ticker {
        sql.push_str(" AND s.ticker=?2");
        args.push(t.to_string().into());
    }
    sql.push_str(" ORDER BY t.date, t.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args), |r| {
        Ok(TxRow {
            id: r.get(0)?,
            date: r.get(1)?,
            ticker: r.get(2)?,
            kind: r.get(3)?,
            units: r.get(4)?,
            unit_price: r.get(5)?,
            fees: r.get(6)?,
            currency: r.get(7)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user_id = id_for_user(conn, required(sub, "user")?)?;
    let data = query_rows(conn, user_id, optional(sub, "ticker"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date,
                    t.ticker,
                    t.kind,
                    t.units,
                    t.unit_price,
                    t.fees,
                    t.currency,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Ticker", "Kind", "Units", "Price", "Fees", "CCY"],
                rows
            )
        );
    }
    Ok(())
}
