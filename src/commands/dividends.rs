// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{id_for_security, parse_date, parse_decimal, pretty_table, required};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let ticker = required(sub, "ticker")?;
            let security_id = id_for_security(conn, ticker)?;
            let ex_date = parse_date(required(sub, "ex-date")?)?;
            let pay_date = parse_date(required(sub, "pay-date")?)?;
            let payout = parse_decimal(required(sub, "payout")?)?;
            add_dividend(conn, security_id, ex_date, pay_date, payout)?;
            println!(
                "Recorded dividend of {} per unit for {} (ex {}, paid {})",
                payout, ticker, ex_date, pay_date
            );
        }
        Some(("list", sub)) => {
            let security_id = id_for_security(conn, required(sub, "ticker")?)?;
            let mut stmt = conn.prepare(
                "SELECT ex_date, pay_date, payout FROM dividends
                 WHERE security_id=?1 ORDER BY ex_date",
            )?;
            let mut cur = stmt.query(params![security_id])?;
            let mut rows = Vec::new();
            while let Some(r) = cur.next()? {
                rows.push(vec![r.get(0)?, r.get(1)?, r.get(2)?]);
            }
            println!("{}", pretty_table(&["Ex-Date", "Pay Date", "Payout"], rows));
        }
        _ => {}
    }
    Ok(())
}

/// Re-recording the same ex-date replaces the previous entry.
pub fn add_dividend(
    conn: &Connection,
    security_id: i64,
    ex_date: NaiveDate,
    pay_date: NaiveDate,
    payout: Decimal,
) -> Result<()> {
    if pay_date < ex_date {
        bail!("Pay date {} is before ex-date {}", pay_date, ex_date);
    }
    conn.execute(
        "INSERT INTO dividends(security_id, ex_date, pay_date, payout) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(security_id, ex_date) DO UPDATE SET
             pay_date=excluded.pay_date, payout=excluded.payout",
        params![
            security_id,
            ex_date.to_string(),
            pay_date.to_string(),
            payout.to_string()
        ],
    )?;
    Ok(())
}
