// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Materialized per-(user, security) statistics.
//!
//! Rows are derived data: the pipeline can rebuild any of them from the
//! ledger, rates and prices.

use crate::error::{Result, StatsError};
use crate::ledger::LedgerReader;
use crate::models::Statistic;
use crate::utils::{add, stored_decimal};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

const COLUMNS: &str = "user_id, security_id, total_units, total_cost, total_value, \
     realized_profit, unrealized_profit, dividends_earned, total_profit";

fn text(d: Option<Decimal>) -> Option<String> {
    d.map(|v| v.to_string())
}

/// Insert the row for (user, security) or overwrite it in place.
pub fn upsert(conn: &Connection, stat: &Statistic) -> Result<()> {
    conn.execute(
        "INSERT INTO statistics(user_id, security_id, total_units, total_cost, total_value,
                                realized_profit, unrealized_profit, dividends_earned, total_profit)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
         ON CONFLICT(user_id, security_id) DO UPDATE SET
             total_units=excluded.total_units,
             total_cost=excluded.total_cost,
             total_value=excluded.total_value,
             realized_profit=excluded.realized_profit,
             unrealized_profit=excluded.unrealized_profit,
             dividends_earned=excluded.dividends_earned,
             total_profit=excluded.total_profit,
             updated_at=datetime('now')",
        params![
            stat.user_id,
            stat.security_id,
            text(stat.total_units),
            text(stat.total_cost),
            text(stat.total_value),
            text(stat.realized_profit),
            text(stat.unrealized_profit),
            text(stat.dividends_earned),
            text(stat.total_profit),
        ],
    )?;
    Ok(())
}

/// Update only `total_profit`, creating the row if absent.
pub fn set_total_profit(
    conn: &Connection,
    user_id: i64,
    security_id: i64,
    total: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO statistics(user_id, security_id, total_profit) VALUES (?1,?2,?3)
         ON CONFLICT(user_id, security_id) DO UPDATE SET
             total_profit=excluded.total_profit,
             updated_at=datetime('now')",
        params![user_id, security_id, total.to_string()],
    )?;
    Ok(())
}

type RawRow = (i64, i64, [Option<String>; 7]);

fn raw_row(r: &Row<'_>) -> rusqlite::Result<RawRow> {
    let mut cols: [Option<String>; 7] = Default::default();
    for (i, col) in cols.iter_mut().enumerate() {
        *col = r.get(i + 2)?;
    }
    Ok((r.get(0)?, r.get(1)?, cols))
}

fn decode((user_id, security_id, cols): RawRow) -> Result<Statistic> {
    const NAMES: [&str; 7] = [
        "total units",
        "total cost",
        "total value",
        "realized profit",
        "unrealized profit",
        "dividends earned",
        "total profit",
    ];
    let mut vals: [Option<Decimal>; 7] = [None; 7];
    for (i, col) in cols.iter().enumerate() {
        if let Some(s) = col {
            vals[i] = Some(stored_decimal(NAMES[i], s)?);
        }
    }
    Ok(Statistic {
        user_id,
        security_id,
        total_units: vals[0],
        total_cost: vals[1],
        total_value: vals[2],
        realized_profit: vals[3],
        unrealized_profit: vals[4],
        dividends_earned: vals[5],
        total_profit: vals[6],
    })
}

fn query(conn: &Connection, filter: &str, args: &[i64]) -> Result<Vec<Statistic>> {
    let sql = format!(
        "SELECT {} FROM statistics {} ORDER BY user_id, security_id",
        COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), raw_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(decode(row?)?);
    }
    Ok(out)
}

pub fn find(conn: &Connection, user_id: i64, security_id: i64) -> Result<Option<Statistic>> {
    let sql = format!(
        "SELECT {} FROM statistics WHERE user_id=?1 AND security_id=?2",
        COLUMNS
    );
    let raw = conn
        .query_row(&sql, params![user_id, security_id], raw_row)
        .optional()?;
    raw.map(decode).transpose()
}

/// Read one persisted metric; a missing row or column is `StatisticNotFound`.
pub fn require(
    conn: &Connection,
    user_id: i64,
    security_id: i64,
    field: &'static str,
    pick: impl Fn(&Statistic) -> Option<Decimal>,
) -> Result<Decimal> {
    find(conn, user_id, security_id)?
        .as_ref()
        .and_then(pick)
        .ok_or(StatsError::StatisticNotFound {
            user_id,
            security_id,
            field,
        })
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Statistic>> {
    query(conn, "WHERE user_id=?1", &[user_id])
}

pub fn list_all(conn: &Connection) -> Result<Vec<Statistic>> {
    query(conn, "", &[])
}

pub fn delete_for_user(conn: &Connection, user_id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM statistics WHERE user_id=?1", params![user_id])?)
}

pub fn delete_all(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM statistics", [])?)
}

/// A user's statistics summed across holdings, in display currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub user_id: i64,
    pub display_currency: String,
    pub holdings: usize,
    pub total_cost: Decimal,
    pub total_value: Decimal,
    pub realized_profit: Decimal,
    pub unrealized_profit: Decimal,
    pub dividends_earned: Decimal,
    pub total_profit: Decimal,
}

pub fn summary_for_user(conn: &Connection, user_id: i64) -> Result<PortfolioSummary> {
    let display_currency = conn.display_currency(user_id)?;
    let stats = list_for_user(conn, user_id)?;
    if stats.is_empty() {
        return Err(StatsError::NoHoldings(user_id));
    }
    let mut s = PortfolioSummary {
        user_id,
        display_currency,
        holdings: stats.len(),
        ..Default::default()
    };
    let sum = |acc: Decimal, v: Option<Decimal>| add("portfolio summary", acc, v.unwrap_or_default());
    for st in &stats {
        s.total_cost = sum(s.total_cost, st.total_cost)?;
        s.total_value = sum(s.total_value, st.total_value)?;
        s.realized_profit = sum(s.realized_profit, st.realized_profit)?;
        s.unrealized_profit = sum(s.unrealized_profit, st.unrealized_profit)?;
        s.dividends_earned = sum(s.dividends_earned, st.dividends_earned)?;
        s.total_profit = sum(s.total_profit, st.total_profit)?;
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO users(id, username, display_currency) VALUES (1, 'ana', 'USD');
            INSERT INTO securities(id, ticker, base_currency) VALUES (1, 'ABC', 'USD');
            INSERT INTO securities(id, ticker, base_currency) VALUES (2, 'XYZ', 'USD');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn upsert_inserts_then_updates_in_place() {
        let conn = setup();
        let mut stat = Statistic::new(1, 1);
        stat.total_units = Some(Decimal::from(10));
        upsert(&conn, &stat).unwrap();
        stat.total_units = Some(Decimal::from(6));
        stat.total_cost = Some(Decimal::new(10055, 1));
        upsert(&conn, &stat).unwrap();

        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM statistics", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(find(&conn, 1, 1).unwrap(), Some(stat));
    }

    #[test]
    fn require_reports_missing_field() {
        let conn = setup();
        let err = require(&conn, 1, 1, "total units", |s| s.total_units).unwrap_err();
        assert!(matches!(
            err,
            StatsError::StatisticNotFound { field: "total units", .. }
        ));
        set_total_profit(&conn, 1, 1, Decimal::ONE).unwrap();
        let err = require(&conn, 1, 1, "total units", |s| s.total_units).unwrap_err();
        assert!(matches!(err, StatsError::StatisticNotFound { .. }));
        assert_eq!(
            require(&conn, 1, 1, "total profit", |s| s.total_profit).unwrap(),
            Decimal::ONE
        );
    }

    #[test]
    fn summary_sums_holdings() {
        let conn = setup();
        for (sec, cost, divs) in [(1, 100, Some(5)), (2, 50, None)] {
            let mut stat = Statistic::new(1, sec);
            stat.total_cost = Some(Decimal::from(cost));
            stat.dividends_earned = divs.map(Decimal::from);
            upsert(&conn, &stat).unwrap();
        }
        let s = summary_for_user(&conn, 1).unwrap();
        assert_eq!(s.holdings, 2);
        assert_eq!(s.total_cost, Decimal::from(150));
        assert_eq!(s.dividends_earned, Decimal::from(5));

        assert_eq!(delete_for_user(&conn, 1).unwrap(), 2);
        assert!(matches!(
            summary_for_user(&conn, 1),
            Err(StatsError::NoHoldings(1))
        ));
    }
}
