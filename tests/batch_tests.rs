// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use holdstat::prices::PriceSource;
use holdstat::stats::pipeline::run_batch;
use holdstat::store;
use rust_decimal::Decimal;
use std::collections::HashMap;

struct FakeQuotes(HashMap<String, Decimal>);

impl PriceSource for FakeQuotes {
    fn latest_prices(&self, _tickers: &[String]) -> anyhow::Result<HashMap<String, Decimal>> {
        Ok(self.0.clone())
    }
}

struct DownQuotes;

impl PriceSource for DownQuotes {
    fn latest_prices(&self, _tickers: &[String]) -> anyhow::Result<HashMap<String, Decimal>> {
        anyhow::bail!("quote service unavailable")
    }
}

#[test_log::test]
fn batch_prices_then_recomputes() {
    let mut conn = setup();
    let ana = user(&conn, "ana", "USD");
    let abc = security(&conn, "ABC", "USD", "110");
    buy(&conn, ana, abc, "2025-01-02", "10", "100", "5");

    let quotes = FakeQuotes(HashMap::from([("ABC".to_string(), dec("120"))]));
    let report = run_batch(&mut conn, Some(&quotes), d("2025-06-30")).unwrap();
    assert!(report.is_success());
    assert_eq!(report.updated, vec![ana]);

    let s = store::find(&conn, ana, abc).unwrap().unwrap();
    assert_eq!(s.total_value, Some(dec("1200")));
    assert_eq!(s.unrealized_profit, Some(dec("195")));
}

#[test]
fn batch_survives_price_outage() {
    let mut conn = setup();
    let ana = user(&conn, "ana", "USD");
    let abc = security(&conn, "ABC", "USD", "110");
    buy(&conn, ana, abc, "2025-01-02", "10", "100", "5");

    let report = run_batch(&mut conn, Some(&DownQuotes), d("2025-06-30")).unwrap();
    assert!(report.is_success());
    let s = store::find(&conn, ana, abc).unwrap().unwrap();
    assert_eq!(s.total_value, Some(dec("1100")));
}

#[test]
fn batch_without_price_source() {
    let mut conn = setup();
    let ana = user(&conn, "ana", "USD");
    let bob = user(&conn, "bob", "USD");
    let abc = security(&conn, "ABC", "USD", "110");
    buy(&conn, ana, abc, "2025-01-02", "10", "100", "5");
    sell(&conn, bob, abc, "2025-01-02", "1", "100", "0");

    let report = run_batch(&mut conn, None, d("2025-06-30")).unwrap();
    assert_eq!(report.updated, vec![ana]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(statistic_rows(&conn, bob), 0);
}

#[test_log::test]
fn batch_leaves_totals_consistent_with_their_parts() {
    let mut conn = setup();
    let ana = user(&conn, "ana", "USD");
    let div = dividend_payer(&conn, "DIV", "USD", "110");
    buy(&conn, ana, div, "2025-01-02", "10", "100", "0");
    sell(&conn, ana, div, "2025-01-05", "4", "120", "0");
    dividend(&conn, div, "2025-02-01", "2");

    let quotes = FakeQuotes(HashMap::from([("DIV".to_string(), dec("120"))]));
    let report = run_batch(&mut conn, Some(&quotes), d("2025-06-30")).unwrap();
    assert!(report.is_success());
    assert_eq!(report.updated, vec![ana]);

    let s = store::find(&conn, ana, div).unwrap().unwrap();
    assert_eq!(s.realized_profit, Some(dec("80")));
    assert_eq!(s.dividends_earned, Some(dec("12")));
    let parts = s.realized_profit.unwrap() + s.unrealized_profit.unwrap() + s.dividends_earned.unwrap();
    assert_eq!(s.total_profit, Some(parts));
}
