// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Result, StatsError};
use crate::ledger::LedgerReader;
use crate::utils::mul;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, error};

/// Conversion factor from `from_ccy` to `to_ccy`.
/// Identity when the codes match; otherwise only the exact `FROM/TO` pair counts.
pub fn resolve_rate<L: LedgerReader + ?Sized>(
    ledger: &L,
    from_ccy: &str,
    to_ccy: &str,
) -> Result<Decimal> {
    if from_ccy.eq_ignore_ascii_case(to_ccy) {
        return Ok(Decimal::ONE);
    }
    match ledger.rate(from_ccy, to_ccy)? {
        Some(r) => Ok(r),
        None => {
            let pair = format!("{}/{}", from_ccy, to_ccy);
            error!("Invalid rate: {}", pair);
            Err(StatsError::RateNotFound(pair))
        }
    }
}

pub fn convert<L: LedgerReader + ?Sized>(
    ledger: &L,
    amount: Decimal,
    from_ccy: &str,
    to_ccy: &str,
) -> Result<Decimal> {
    mul("a conversion", amount, resolve_rate(ledger, from_ccy, to_ccy)?)
}

/// Memoizes rates towards one target currency for the span of a computation.
pub struct RateCache<'a, L: LedgerReader + ?Sized> {
    ledger: &'a L,
    to_ccy: String,
    seen: HashMap<String, Decimal>,
}

impl<'a, L: LedgerReader + ?Sized> RateCache<'a, L> {
    pub fn new(ledger: &'a L, to_ccy: &str) -> Self {
        RateCache {
            ledger,
            to_ccy: to_ccy.to_string(),
            seen: HashMap::new(),
        }
    }

    pub fn to(&mut self, from_ccy: &str) -> Result<Decimal> {
        if let Some(r) = self.seen.get(from_ccy) {
            return Ok(*r);
        }
        let r = resolve_rate(self.ledger, from_ccy, &self.to_ccy)?;
        debug!("Rate {}/{} = {}", from_ccy, self.to_ccy, r);
        self.seen.insert(from_ccy.to_string(), r);
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn.execute("INSERT INTO rates(pair, rate) VALUES ('GBP/USD', '1.25')", [])
            .unwrap();
        conn
    }

    #[test]
    fn identity_needs_no_table_entry() {
        let conn = setup();
        assert_eq!(resolve_rate(&conn, "JPY", "JPY").unwrap(), Decimal::ONE);
    }

    #[test]
    fn converts_with_exact_pair() {
        let conn = setup();
        let v = convert(&conn, Decimal::from(100), "GBP", "USD").unwrap();
        assert_eq!(v, Decimal::from(125));
    }

    #[test]
    fn inverse_pair_is_not_derived() {
        let conn = setup();
        let err = resolve_rate(&conn, "USD", "GBP").unwrap_err();
        assert!(matches!(err, StatsError::RateNotFound(ref p) if p == "USD/GBP"));
    }

    #[test]
    fn cache_reuses_lookups() {
        let conn = setup();
        let mut cache = RateCache::new(&conn, "USD");
        assert_eq!(cache.to("GBP").unwrap(), Decimal::new(125, 2));
        conn.execute("DELETE FROM rates", []).unwrap();
        assert_eq!(cache.to("GBP").unwrap(), Decimal::new(125, 2));
        assert!(cache.to("EUR").is_err());
    }
}
