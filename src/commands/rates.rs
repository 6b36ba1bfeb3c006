// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ExchangeRate;
use crate::utils::{parse_decimal, pretty_table, required, stored_decimal};
use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let pair = normalize_pair(required(sub, "pair")?)?;
            let rate = parse_decimal(required(sub, "rate")?)?;
            set_rate(conn, &pair, rate)?;
            println!("{} = {}", pair, rate);
        }
        Some(("list", _)) => list_rates(conn)?,
        _ => {}
    }
    Ok(())
}

/// `eur/usd` -> `EUR/USD`. Anything other than two non-empty codes is rejected.
pub fn normalize_pair(raw: &str) -> Result<String> {
    let Some((from, to)) = raw.split_once('/') else {
        bail!("Invalid pair '{}', expected FROM/TO", raw);
    };
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() || to.contains('/') {
        bail!("Invalid pair '{}', expected FROM/TO", raw);
    }
    Ok(format!("{}/{}", from.to_uppercase(), to.to_uppercase()))
}

pub fn set_rate(conn: &Connection, pair: &str, rate: Decimal) -> Result<()> {
    if rate <= Decimal::ZERO {
        bail!("Rate for {} must be positive, got {}", pair, rate);
    }
    conn.execute(
        "INSERT INTO rates(pair, rate) VALUES (?1, ?2)
         ON CONFLICT(pair) DO UPDATE SET rate=excluded.rate",
        params![pair, rate.to_string()],
    )?;
    Ok(())
}

pub fn query_rates(conn: &Connection) -> Result<Vec<ExchangeRate>> {
    let mut stmt = conn.prepare("SELECT pair, rate FROM rates ORDER BY pair")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = Vec::new();
    for row in rows {
        let (pair, rate_s) = row?;
        let rate = stored_decimal(&format!("rate {}", pair), &rate_s)?;
        out.push(ExchangeRate { pair, rate });
    }
    Ok(out)
}

fn list_rates(conn: &Connection) -> Result<()> {
    let rows = query_rates(conn)?
        .into_iter()
        .map(|r| vec![r.pair, r.rate.to_string()])
        .collect();
    println!("{}", pretty_table(&["Pair", "Rate"], rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_uppercased() {
        assert_eq!(normalize_pair(" eur/usd ").unwrap(), "EUR/USD");
        assert!(normalize_pair("EURUSD").is_err());
        assert!(normalize_pair("EUR/").is_err());
        assert!(normalize_pair("A/B/C").is_err());
    }
}
