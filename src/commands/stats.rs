// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::LedgerReader;
use crate::models::Statistic;
use crate::prices::{PriceSource, YahooPriceSource};
use crate::stats::holdings::units_owned_as_of;
use crate::stats::pipeline::{self, preview_holding, RecomputeOutcome, RecomputeReport};
use crate::store;
use crate::utils::{
    fmt_money, fmt_opt, id_for_security, id_for_user, maybe_print_json, optional, parse_date,
    pretty_table, required,
};
use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("recompute", sub)) => recompute(conn, sub)?,
        Some(("totals", sub)) => totals(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("units", sub)) => units(conn, sub)?,
        Some(("clear", sub)) => clear(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn as_of(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match optional(sub, "as-of") {
        Some(raw) => parse_date(raw),
        None => Ok(Utc::now().date_naive()),
    }
}

fn print_report(what: &str, report: &RecomputeReport) -> Result<()> {
    println!(
        "{}: {} updated, {} skipped, {} failed",
        what,
        report.updated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if report.is_success() {
        return Ok(());
    }
    let rows = report
        .failed
        .iter()
        .map(|(user_id, e)| vec![user_id.to_string(), format!("{:?}", e.kind()), e.to_string()])
        .collect();
    println!("{}", pretty_table(&["User ID", "Kind", "Error"], rows));
    bail!("{} failed for {} user(s)", what, report.failed.len())
}

fn recompute(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = as_of(sub)?;
    match optional(sub, "user") {
        Some(username) => {
            let user_id = id_for_user(conn, username)?;
            match pipeline::recompute_for_user_as_of(conn, user_id, date)? {
                RecomputeOutcome::Updated(stats) => {
                    println!("Updated {} holding(s) for {}", stats.len(), username)
                }
                RecomputeOutcome::Skipped => println!("{} holds nothing; skipped", username),
            }
        }
        None => {
            let report = pipeline::recompute_for_all_users_as_of(conn, date)?;
            print_report("Recompute", &report)?;
        }
    }
    Ok(())
}

fn totals(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    match optional(sub, "user") {
        Some(username) => {
            let user_id = id_for_user(conn, username)?;
            let n = pipeline::refresh_total_profits_for_user(conn, user_id)?;
            println!("Refreshed total profit on {} holding(s) for {}", n, username);
        }
        None => {
            let report = pipeline::refresh_total_profits_for_all_users(conn)?;
            print_report("Total profit refresh", &report)?;
        }
    }
    Ok(())
}

fn tickers(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, ticker FROM securities")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = HashMap::new();
    for row in rows {
        let (id, ticker) = row?;
        out.insert(id, ticker);
    }
    Ok(out)
}

fn stat_row(ticker: &str, s: &Statistic) -> Vec<String> {
    vec![
        ticker.to_string(),
        fmt_opt(s.total_units),
        fmt_opt(s.total_cost),
        fmt_opt(s.total_value),
        fmt_opt(s.realized_profit),
        fmt_opt(s.unrealized_profit),
        fmt_opt(s.dividends_earned),
        fmt_opt(s.total_profit),
    ]
}

const STAT_HEADERS: [&str; 8] = [
    "Ticker",
    "Units",
    "Cost",
    "Value",
    "Realized",
    "Unrealized",
    "Dividends",
    "Total",
];

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let stats = match optional(sub, "user") {
        Some(username) => store::list_for_user(conn, id_for_user(conn, username)?)?,
        None => store::list_all(conn)?,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
        return Ok(());
    }
    let names = tickers(conn)?;
    let mut headers = vec!["User ID"];
    headers.extend(STAT_HEADERS);
    let rows = stats
        .iter()
        .map(|s| {
            let ticker = names.get(&s.security_id).map(String::as_str).unwrap_or("?");
            let mut row = vec![s.user_id.to_string()];
            row.extend(stat_row(ticker, s));
            row
        })
        .collect();
    println!("{}", pretty_table(&headers, rows));
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let ticker = required(sub, "ticker")?;
    let user_id = id_for_user(conn, required(sub, "user")?)?;
    let security_id = id_for_security(conn, ticker)?;
    let stat = preview_holding(conn, user_id, security_id, Utc::now().date_naive())?;
    let ccy = conn.display_currency(user_id)?;
    println!("Figures in {}", ccy);
    println!("{}", pretty_table(&STAT_HEADERS, vec![stat_row(ticker, &stat)]));
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let username = required(sub, "user")?;
    let s = store::summary_for_user(conn, id_for_user(conn, username)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let ccy = s.display_currency.as_str();
    let rows = vec![
        vec!["Holdings".to_string(), s.holdings.to_string()],
        vec!["Cost".to_string(), fmt_money(&s.total_cost, ccy)],
        vec!["Value".to_string(), fmt_money(&s.total_value, ccy)],
        vec!["Realized".to_string(), fmt_money(&s.realized_profit, ccy)],
        vec!["Unrealized".to_string(), fmt_money(&s.unrealized_profit, ccy)],
        vec!["Dividends".to_string(), fmt_money(&s.dividends_earned, ccy)],
        vec!["Total profit".to_string(), fmt_money(&s.total_profit, ccy)],
    ];
    println!("{}", pretty_table(&[username, ""], rows));
    Ok(())
}

fn units(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let ticker = required(sub, "ticker")?;
    let user_id = id_for_user(conn, required(sub, "user")?)?;
    let security_id = id_for_security(conn, ticker)?;
    let date = match optional(sub, "date") {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let units = units_owned_as_of(conn, user_id, security_id, date)?;
    println!("{} units of {} as of {}", units.normalize(), ticker, date);
    Ok(())
}

fn clear(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let n = match optional(sub, "user") {
        Some(username) => store::delete_for_user(conn, id_for_user(conn, username)?)?,
        None => store::delete_all(conn)?,
    };
    println!("Deleted {} statistic row(s)", n);
    Ok(())
}

/// `holdstat batch`: the scheduled refresh of prices and every user's figures.
pub fn batch(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = as_of(sub)?;
    let yahoo;
    let source: Option<&dyn PriceSource> = if sub.get_flag("skip-prices") {
        None
    } else {
        yahoo = YahooPriceSource::new()?;
        Some(&yahoo)
    };
    let report = pipeline::run_batch(conn, source, date)?;
    print_report("Batch", &report)
}
