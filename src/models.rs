// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub id: i64,
    pub ticker: String,
    pub base_currency: String,
    pub last_price: Decimal,
    pub pays_dividends: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Buy,
    Sell,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Buy => "buy",
            TxKind::Sell => "sell",
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> Decimal {
        match self {
            TxKind::Buy => Decimal::ONE,
            TxKind::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TxKind::Buy),
            "sell" => Ok(TxKind::Sell),
            other => Err(format!("Unknown transaction kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub security_id: i64,
    pub date: NaiveDate,
    pub kind: TxKind,
    pub units: Decimal,
    pub unit_price: Decimal, // transaction currency
    pub fees: Decimal,       // transaction currency
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dividend {
    pub id: i64,
    pub security_id: i64,
    pub ex_date: NaiveDate,
    pub pay_date: NaiveDate,
    pub payout: Decimal, // per unit, security base currency
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub pair: String, // FROM/TO
    pub rate: Decimal,
}

/// Materialized statistics for one (user, security) pair, in the user's
/// display currency. A metric is `None` until a stage has written it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub user_id: i64,
    pub security_id: i64,
    pub total_units: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub realized_profit: Option<Decimal>,
    pub unrealized_profit: Option<Decimal>,
    pub dividends_earned: Option<Decimal>,
    pub total_profit: Option<Decimal>,
}

impl Statistic {
    pub fn new(user_id: i64, security_id: i64) -> Self {
        Statistic {
            user_id,
            security_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_kind_parses_case_insensitively() {
        assert_eq!(" Buy ".parse::<TxKind>().unwrap(), TxKind::Buy);
        assert_eq!("SELL".parse::<TxKind>().unwrap(), TxKind::Sell);
        assert!("hold".parse::<TxKind>().is_err());
        assert_eq!(TxKind::Sell.sign(), Decimal::NEGATIVE_ONE);
    }
}
