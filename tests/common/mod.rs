// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use chrono::NaiveDate;
use holdstat::commands::{dividends, rates, securities, transactions, users};
use holdstat::db::init_schema;
use holdstat::models::TxKind;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    init_schema(&mut conn).unwrap();
    conn
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

pub fn user(conn: &Connection, name: &str, ccy: &str) -> i64 {
    users::add_user(conn, name, ccy).unwrap()
}

pub fn security(conn: &Connection, ticker: &str, ccy: &str, price: &str) -> i64 {
    securities::add_security(conn, ticker, ccy, dec(price), false).unwrap()
}

pub fn dividend_payer(conn: &Connection, ticker: &str, ccy: &str, price: &str) -> i64 {
    securities::add_security(conn, ticker, ccy, dec(price), true).unwrap()
}

pub fn rate(conn: &Connection, pair: &str, r: &str) {
    rates::set_rate(conn, pair, dec(r)).unwrap();
}

pub fn dividend(conn: &Connection, security_id: i64, ex_date: &str, payout: &str) {
    dividends::add_dividend(conn, security_id, d(ex_date), d(ex_date), dec(payout)).unwrap();
}

#[allow(clippy::too_many_arguments)]
pub fn trade(
    conn: &Connection,
    kind: TxKind,
    user_id: i64,
    security_id: i64,
    date: &str,
    units: &str,
    price: &str,
    fees: &str,
    currency: Option<&str>,
) -> i64 {
    let tx = transactions::NewTransaction {
        user_id,
        security_id,
        date: d(date),
        kind,
        units: dec(units),
        unit_price: dec(price),
        fees: dec(fees),
        currency,
    };
    transactions::record(conn, &tx).unwrap()
}

pub fn buy(conn: &Connection, user_id: i64, security_id: i64, date: &str, units: &str, price: &str, fees: &str) {
    trade(conn, TxKind::Buy, user_id, security_id, date, units, price, fees, None);
}

pub fn sell(conn: &Connection, user_id: i64, security_id: i64, date: &str, units: &str, price: &str, fees: &str) {
    trade(conn, TxKind::Sell, user_id, security_id, date, units, price, fees, None);
}

pub fn statistic_rows(conn: &Connection, user_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM statistics WHERE user_id=?1",
        [user_id],
        |r| r.get(0),
    )
    .unwrap()
}
