// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only access to the ledger: users, securities, transactions,
//! dividends and exchange rates.
//!
//! The calculators only ever see the [`LedgerReader`] trait. The SQLite
//! implementation below is the one the CLI uses; inside a recompute it runs
//! against the open `rusqlite::Transaction`.

use crate::error::{Result, StatsError};
use crate::models::{Dividend, Security, Transaction, TxKind};
use crate::utils::{stored_date, stored_decimal};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;

/// Narrows a `transactions_for` query.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxFilter {
    pub kind: Option<TxKind>,
    pub on_or_before: Option<NaiveDate>,
}

impl TxFilter {
    pub fn all() -> Self {
        TxFilter::default()
    }

    pub fn buys() -> Self {
        TxFilter::all().kind(TxKind::Buy)
    }

    pub fn sells() -> Self {
        TxFilter::all().kind(TxKind::Sell)
    }

    pub fn kind(mut self, kind: TxKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn on_or_before(mut self, date: NaiveDate) -> Self {
        self.on_or_before = Some(date);
        self
    }
}

pub trait LedgerReader {
    fn display_currency(&self, user_id: i64) -> Result<String>;
    fn security(&self, security_id: i64) -> Result<Security>;
    fn user_ids(&self) -> Result<Vec<i64>>;
    /// Distinct securities appearing in the user's transactions, ascending id.
    fn held_security_ids(&self, user_id: i64) -> Result<Vec<i64>>;
    /// Matching transactions in ledger (insertion) order.
    fn transactions_for(
        &self,
        user_id: i64,
        security_id: i64,
        filter: &TxFilter,
    ) -> Result<Vec<Transaction>>;
    fn earliest_transaction_date(&self, user_id: i64, security_id: i64)
        -> Result<Option<NaiveDate>>;
    /// Dividends with ex-date on or after `date`, ascending by ex-date.
    fn dividends_on_or_after(&self, security_id: i64, date: NaiveDate) -> Result<Vec<Dividend>>;
    fn rate(&self, from_ccy: &str, to_ccy: &str) -> Result<Option<Decimal>>;
}

impl LedgerReader for Connection {
    fn display_currency(&self, user_id: i64) -> Result<String> {
        self.query_row(
            "SELECT display_currency FROM users WHERE id=?1",
            params![user_id],
            |r| r.get::<_, String>(0),
        )
        .optional()?
        .ok_or(StatsError::UserNotFound(user_id))
    }

    fn security(&self, security_id: i64) -> Result<Security> {
        let row = self
            .query_row(
                "SELECT id, ticker, base_currency, last_price, pays_dividends
                 FROM securities WHERE id=?1",
                params![security_id],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, bool>(4)?,
                    ))
                },
            )
            .optional()?;
        let (id, ticker, base_currency, price_s, pays_dividends) =
            row.ok_or(StatsError::SecurityNotFound(security_id))?;
        let last_price = stored_decimal(&format!("last price of {}", ticker), &price_s)?;
        Ok(Security {
            id,
            ticker,
            base_currency,
            last_price,
            pays_dividends,
        })
    }

    fn user_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.prepare_cached("SELECT id FROM users ORDER BY id")?;
        let rows = stmt.query_map([], |r| r.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn held_security_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.prepare_cached(
            "SELECT DISTINCT security_id FROM transactions WHERE user_id=?1 ORDER BY security_id",
        )?;
        let rows = stmt.query_map(params![user_id], |r| r.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn transactions_for(
        &self,
        user_id: i64,
        security_id: i64,
        filter: &TxFilter,
    ) -> Result<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT id, date, kind, units, unit_price, fees, currency
             FROM transactions WHERE user_id=?1 AND security_id=?2",
        );
        let mut args: Vec<Value> = vec![user_id.into(), security_id.into()];
        if let Some(kind) = filter.kind {
            args.push(kind.as_str().to_string().into());
            sql.push_str(&format!(" AND kind=?{}", args.len()));
        }
        if let Some(date) = filter.on_or_before {
            args.push(date.to_string().into());
            sql.push_str(&format!(" AND date<=?{}", args.len()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, date_s, kind_s, units_s, price_s, fees_s, currency) = row?;
            let kind = kind_s
                .parse::<TxKind>()
                .map_err(|_| StatsError::invalid(format!("kind of transaction {}", id), &kind_s))?;
            let units_what = format!("units of transaction {}", id);
            let units = stored_decimal(&units_what, &units_s)?;
            if units.is_sign_negative() {
                return Err(StatsError::invalid(units_what, units_s));
            }
            out.push(Transaction {
                id,
                user_id,
                security_id,
                date: stored_date(&format!("date of transaction {}", id), &date_s)?,
                kind,
                units,
                unit_price: stored_decimal(&format!("unit price of transaction {}", id), &price_s)?,
                fees: stored_decimal(&format!("fees of transaction {}", id), &fees_s)?,
                currency,
            });
        }
        Ok(out)
    }

    fn earliest_transaction_date(
        &self,
        user_id: i64,
        security_id: i64,
    ) -> Result<Option<NaiveDate>> {
        let earliest: Option<String> = self.query_row(
            "SELECT MIN(date) FROM transactions WHERE user_id=?1 AND security_id=?2",
            params![user_id, security_id],
            |r| r.get(0),
        )?;
        earliest
            .map(|s| stored_date("earliest transaction date", &s))
            .transpose()
    }

    fn dividends_on_or_after(&self, security_id: i64, date: NaiveDate) -> Result<Vec<Dividend>> {
        let mut stmt = self.prepare_cached(
            "SELECT id, ex_date, pay_date, payout FROM dividends
             WHERE security_id=?1 AND ex_date>=?2 ORDER BY ex_date ASC",
        )?;
        let rows = stmt.query_map(params![security_id, date.to_string()], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, ex_s, pay_s, payout_s) = row?;
            out.push(Dividend {
                id,
                security_id,
                ex_date: stored_date(&format!("ex-date of dividend {}", id), &ex_s)?,
                pay_date: stored_date(&format!("pay date of dividend {}", id), &pay_s)?,
                payout: stored_decimal(&format!("payout of dividend {}", id), &payout_s)?,
            });
        }
        Ok(out)
    }

    fn rate(&self, from_ccy: &str, to_ccy: &str) -> Result<Option<Decimal>> {
        let pair = format!("{}/{}", from_ccy, to_ccy);
        let rate_s: Option<String> = self
            .query_row("SELECT rate FROM rates WHERE pair=?1", params![pair], |r| {
                r.get(0)
            })
            .optional()?;
        rate_s
            .map(|s| stored_decimal(&format!("rate {}", pair), &s))
            .transpose()
    }
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
            INSERT INTO securities(id, ticker, base_currency, last_price) VALUES (1, 'ABC', 'USD', '12.5');
            INSERT INTO transactions(user_id, security_id, date, kind, units, unit_price, fees, currency)
                VALUES (1, 1, '2025-01-02', 'buy', '10', '100', '5', 'USD');
            INSERT INTO transactions(user_id, security_id, date, kind, units, unit_price, fees, currency)
                VALUES (1, 1, '2025-01-05', 'sell', '4', '120', '2', 'USD');
            INSERT INTO transactions(user_id, security_id, date, kind, units, unit_price, fees, currency)
                VALUES (1, 1, '2025-01-09', 'buy', '1', '90', '0', 'USD');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn filters_by_kind_and_date() {
        let conn = setup();
        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(conn.transactions_for(1, 1, &TxFilter::all()).unwrap().len(), 3);
        assert_eq!(conn.transactions_for(1, 1, &TxFilter::buys()).unwrap().len(), 2);
        let upto = conn
            .transactions_for(1, 1, &TxFilter::all().on_or_before(d))
            .unwrap();
        assert_eq!(upto.len(), 2);
        let buys_upto = conn
            .transactions_for(1, 1, &TxFilter::buys().on_or_before(d))
            .unwrap();
        assert_eq!(buys_upto.len(), 1);
        assert_eq!(buys_upto[0].fees, Decimal::from(5));
    }

    #[test]
    fn missing_entities_are_not_found() {
        let conn = setup();
        assert!(matches!(
            conn.display_currency(9),
            Err(StatsError::UserNotFound(9))
        ));
        assert!(matches!(
            conn.security(9),
            Err(StatsError::SecurityNotFound(9))
        ));
        assert_eq!(conn.security(1).unwrap().last_price, Decimal::new(125, 1));
    }

    #[test]
    fn rate_lookup_is_exact_pair_ignoring_case() {
        let conn = setup();
        conn.execute("INSERT INTO rates(pair, rate) VALUES ('eur/usd', '1.1')", [])
            .unwrap();
        assert_eq!(conn.rate("EUR", "USD").unwrap(), Some(Decimal::new(11, 1)));
        assert_eq!(conn.rate("USD", "EUR").unwrap(), None);
    }

    #[test]
    fn corrupt_units_surface_as_integrity_error() {
        let conn = setup();
        conn.execute("UPDATE transactions SET units='ten' WHERE id=1", [])
            .unwrap();
        let err = conn.transactions_for(1, 1, &TxFilter::all()).unwrap_err();
        assert!(err.is_data_integrity());
    }

    #[test]
    fn negative_stored_units_are_rejected_not_flipped() {
        let conn = setup();
        conn.execute("UPDATE transactions SET units='-4' WHERE id=2", [])
            .unwrap();
        let err = conn.transactions_for(1, 1, &TxFilter::all()).unwrap_err();
        assert!(err.is_data_integrity());
        assert!(err.to_string().contains("units of transaction 2"));
    }

    #[test]
    fn earliest_date_is_none_without_transactions() {
        let conn = setup();
        assert_eq!(
            conn.earliest_transaction_date(1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );
        assert_eq!(conn.earliest_transaction_date(2, 1).unwrap(), None);
    }
}
