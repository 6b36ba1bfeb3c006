// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StatsError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::{Decimal, RoundingStrategy};

const UA: &str = concat!(
    "holdstat/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/holdstat)"
);

/// Scale used for every division in the engine.
pub const DIVISION_SCALE: u32 = 15;

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

/// Trimmed value of a required CLI argument.
pub fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .with_context(|| format!("Missing required argument '{}'", name))
}

pub fn optional<'a>(m: &'a clap::ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name).map(|s| s.trim())
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parse a decimal read back from storage. Garbage is an integrity violation.
pub fn stored_decimal(what: &str, s: &str) -> crate::error::Result<Decimal> {
    Decimal::from_str_exact(s.trim()).map_err(|_| StatsError::invalid(what, s))
}

pub fn stored_date(what: &str, s: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| StatsError::invalid(what, s))
}

/// `num / den` at 15 decimal places, half-up; zero when `den` is zero.
pub fn div_half_up(num: Decimal, den: Decimal) -> crate::error::Result<Decimal> {
    if den.is_zero() {
        return Ok(Decimal::ZERO);
    }
    num.checked_div(den)
        .map(|q| q.round_dp_with_strategy(DIVISION_SCALE, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(StatsError::Overflow("a quotient"))
}

pub fn mul(what: &'static str, a: Decimal, b: Decimal) -> crate::error::Result<Decimal> {
    a.checked_mul(b).ok_or(StatsError::Overflow(what))
}

pub fn add(what: &'static str, a: Decimal, b: Decimal) -> crate::error::Result<Decimal> {
    a.checked_add(b).ok_or(StatsError::Overflow(what))
}

pub fn sub(what: &'static str, a: Decimal, b: Decimal) -> crate::error::Result<Decimal> {
    a.checked_sub(b).ok_or(StatsError::Overflow(what))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

pub fn fmt_opt(d: Option<Decimal>) -> String {
    d.map(|v| v.round_dp(2).normalize().to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_user(conn: &Connection, username: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE username=?1")?;
    let id: i64 = stmt
        .query_row(params![username], |r| r.get(0))
        .with_context(|| format!("User '{}' not found", username))?;
    Ok(id)
}

pub fn id_for_security(conn: &Connection, ticker: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM securities WHERE ticker=?1")?;
    let id: i64 = stmt
        .query_row(params![ticker], |r| r.get(0))
        .with_context(|| format!("Security '{}' not found", ticker))?;
    Ok(id)
}

// Default display currency for new users
pub fn get_default_currency(conn: &Connection) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_default_currency(conn: &Connection, ccy: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy],
    )?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_half_up_rounds_at_fifteen_places() {
        let two_thirds = div_half_up(Decimal::from(2), Decimal::from(3)).unwrap();
        assert_eq!(two_thirds.to_string(), "0.666666666666667");
        assert_eq!(
            div_half_up(Decimal::from(1005), Decimal::from(10)).unwrap(),
            Decimal::new(1005, 1)
        );
        assert_eq!(div_half_up(Decimal::ONE, Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn arithmetic_past_decimal_range_is_an_integrity_error() {
        let err = mul("cost basis", Decimal::MAX, Decimal::from(2)).unwrap_err();
        assert!(err.is_data_integrity());
        assert_eq!(err.to_string(), "Arithmetic overflow computing cost basis");
        assert!(add("total", Decimal::MAX, Decimal::ONE).is_err());
        assert!(sub("total", Decimal::MIN, Decimal::ONE).is_err());
        assert!(div_half_up(Decimal::MAX, Decimal::new(1, 10)).is_err());
        assert_eq!(mul("value", Decimal::from(3), Decimal::from(4)).unwrap(), Decimal::from(12));
    }

    #[test]
    fn stored_values_reject_garbage() {
        assert!(stored_decimal("units", "12.5").is_ok());
        let err = stored_decimal("units", "12,5").unwrap_err();
        assert!(err.is_data_integrity());
        assert!(stored_date("date", "2025-13-01").is_err());
    }

    #[test]
    fn default_currency_falls_back_to_usd() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL);")
            .unwrap();
        assert_eq!(get_default_currency(&conn).unwrap(), "USD");
        set_default_currency(&conn, "EUR").unwrap();
        assert_eq!(get_default_currency(&conn).unwrap(), "EUR");
    }
}
