// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Last-price maintenance for securities. The statistics engine only reads
//! `securities.last_price`; this module is what keeps it current.

use crate::utils::http_client;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Supplies the latest known price per ticker. Tickers the source has no
/// quote for are simply absent from the result.
pub trait PriceSource {
    fn latest_prices(&self, tickers: &[String]) -> Result<HashMap<String, Decimal>>;
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct YahooResponse {
    quoteResponse: QuoteResponse,
}
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Vec<YahooQuote>,
}
#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    symbol: Option<String>,
}

pub struct YahooPriceSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooPriceSource {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://query1.finance.yahoo.com")
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(YahooPriceSource {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PriceSource for YahooPriceSource {
    fn latest_prices(&self, tickers: &[String]) -> Result<HashMap<String, Decimal>> {
        let mut out = HashMap::new();
        if tickers.is_empty() {
            return Ok(out);
        }
        let url = format!(
            "{}/v7/finance/quote?symbols={}",
            self.base_url,
            tickers.join(",")
        );
        debug!("Requesting price data from {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .context("Yahoo quote request failed")?
            .error_for_status()?;
        let yr: YahooResponse = resp.json().context("Unexpected Yahoo quote payload")?;
        for q in yr.quoteResponse.result {
            if let (Some(sym), Some(px)) = (q.symbol, q.regular_market_price) {
                match Decimal::from_f64_retain(px) {
                    Some(d) => {
                        out.insert(sym, d);
                    }
                    None => warn!("Discarding non-finite price {} for {}", px, sym),
                }
            }
        }
        Ok(out)
    }
}

pub fn set_price(conn: &Connection, security_id: i64, price: Decimal) -> Result<()> {
    let n = conn.execute(
        "UPDATE securities SET last_price=?1, price_updated_at=?2 WHERE id=?3",
        params![price.to_string(), Utc::now().to_rfc3339(), security_id],
    )?;
    anyhow::ensure!(n == 1, "No security found with id: {}", security_id);
    Ok(())
}

/// Pull prices for every security from `source` and store them in one
/// transaction. Returns how many securities were updated.
pub fn refresh_prices(conn: &mut Connection, source: &dyn PriceSource) -> Result<usize> {
    let mut stmt = conn.prepare_cached("SELECT id, ticker FROM securities ORDER BY ticker")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut securities = Vec::new();
    for row in rows {
        securities.push(row?);
    }
    drop(stmt);

    if securities.is_empty() {
        info!("No securities to price");
        return Ok(0);
    }

    let tickers: Vec<String> = securities.iter().map(|(_, t)| t.clone()).collect();
    let quotes = source.latest_prices(&tickers)?;

    let tx = conn.transaction()?;
    let mut updated = 0;
    for (id, ticker) in &securities {
        match quotes.get(ticker) {
            Some(px) => {
                set_price(&tx, *id, *px)?;
                updated += 1;
            }
            None => warn!("No price returned for {}; keeping last known price", ticker),
        }
    }
    tx.commit()?;
    info!("Updated {} of {} security prices", updated, securities.len());
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    struct FixedPrices(HashMap<String, Decimal>);

    impl PriceSource for FixedPrices {
        fn latest_prices(&self, _tickers: &[String]) -> Result<HashMap<String, Decimal>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn refresh_updates_quoted_securities_only() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO securities(id, ticker, base_currency, last_price) VALUES (1, 'ABC', 'USD', '10');
            INSERT INTO securities(id, ticker, base_currency, last_price) VALUES (2, 'XYZ', 'USD', '20');
            "#,
        )
        .unwrap();
        let source = FixedPrices(HashMap::from([("ABC".to_string(), Decimal::new(1234, 2))]));

        let n = refresh_prices(&mut conn, &source).unwrap();
        assert_eq!(n, 1);

        let prices: Vec<String> = conn
            .prepare("SELECT last_price FROM securities ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(prices, vec!["12.34".to_string(), "20".to_string()]);
    }

    #[test]
    fn set_price_rejects_unknown_security() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        assert!(set_price(&conn, 42, Decimal::ONE).is_err());
    }
}
