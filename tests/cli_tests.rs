// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use holdstat::commands::{doctor, rates, transactions};
use holdstat::{cli, utils};

fn run_tx(conn: &rusqlite::Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["holdstat", "tx"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("tx", tx_m)) => transactions::handle(conn, tx_m),
        _ => panic!("no tx subcommand"),
    }
}

#[test]
fn buy_defaults_to_security_currency() {
    let conn = setup();
    user(&conn, "ana", "USD");
    security(&conn, "SAP", "EUR", "50");

    run_tx(
        &conn,
        &["buy", "-u", "ana", "-t", "SAP", "--date", "2025-01-02", "--units", "10", "--price", "40"],
    )
    .unwrap();
    run_tx(
        &conn,
        &[
            "sell", "-u", "ana", "-t", "SAP", "--date", "2025-01-03", "--units", "2", "--price",
            "41", "--fees", "1.5", "--currency", "usd",
        ],
    )
    .unwrap();

    let rows: Vec<(String, String, String)> = conn
        .prepare("SELECT kind, fees, currency FROM transactions ORDER BY id")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            ("buy".to_string(), "0".to_string(), "EUR".to_string()),
            ("sell".to_string(), "1.5".to_string(), "USD".to_string()),
        ]
    );
}

#[test]
fn trade_rejects_bad_input() {
    let conn = setup();
    user(&conn, "ana", "USD");
    security(&conn, "ABC", "USD", "10");

    let bad_date = ["buy", "-u", "ana", "-t", "ABC", "--date", "02/01/2025", "--units", "1", "--price", "1"];
    assert!(run_tx(&conn, &bad_date).is_err());
    let negative = ["buy", "-u", "ana", "-t", "ABC", "--date", "2025-01-02", "--units=-1", "--price", "1"];
    assert!(run_tx(&conn, &negative).is_err());
    let zero = ["sell", "-u", "ana", "-t", "ABC", "--date", "2025-01-02", "--units", "0", "--price", "1"];
    let err = run_tx(&conn, &zero).unwrap_err();
    assert!(err.to_string().contains("Units must be positive"));
    let unknown = ["buy", "-u", "zoe", "-t", "ABC", "--date", "2025-01-02", "--units", "1", "--price", "1"];
    assert!(run_tx(&conn, &unknown).is_err());
}

#[test]
fn rates_are_stored_uppercase_and_looked_up_case_insensitively() {
    let conn = setup();
    let pair = rates::normalize_pair("eur/usd").unwrap();
    rates::set_rate(&conn, &pair, dec("1.1")).unwrap();
    rates::set_rate(&conn, "EUR/USD", dec("1.2")).unwrap();
    assert!(rates::set_rate(&conn, "EUR/USD", dec("0")).is_err());

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM rates", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
    let stored: String = conn
        .query_row("SELECT rate FROM rates WHERE pair='Eur/Usd'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(stored, "1.2");
    let listed = rates::query_rates(&conn).unwrap();
    assert_eq!(listed[0].pair, "EUR/USD");
    assert_eq!(listed[0].rate, dec("1.2"));
}

#[test]
fn default_currency_applies_to_new_users() {
    let conn = setup();
    utils::set_default_currency(&conn, "EUR").unwrap();
    let matches = cli::build_cli().get_matches_from(["holdstat", "user", "add", "ana"]);
    if let Some(("user", m)) = matches.subcommand() {
        holdstat::commands::users::handle(&conn, m).unwrap();
    } else {
        panic!("no user subcommand");
    }
    let users = holdstat::commands::users::query_users(&conn).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].display_currency, "EUR");
}

#[test]
fn doctor_flags_gaps() {
    let conn = setup();
    let ana = user(&conn, "ana", "USD");
    let sap = security(&conn, "SAP", "EUR", "0");
    let abc = security(&conn, "ABC", "USD", "10");
    buy(&conn, ana, sap, "2025-01-02", "10", "40", "0");
    sell(&conn, ana, abc, "2025-01-02", "1", "10", "0");

    let issues = doctor::find_issues(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|(k, _)| k.as_str()).collect();
    assert!(kinds.contains(&"missing_rate"));
    assert!(kinds.contains(&"sell_without_buy"));
    assert!(kinds.contains(&"no_price"));

    rate(&conn, "EUR/USD", "1.1");
    let issues = doctor::find_issues(&conn).unwrap();
    assert!(issues.iter().all(|(k, _)| k != "missing_rate"));
}
