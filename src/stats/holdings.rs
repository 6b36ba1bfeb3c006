// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use crate::ledger::{LedgerReader, TxFilter};
use crate::models::Transaction;
use crate::utils::{add, mul};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

/// Units held at the end of `date`: buys minus sells dated on or before it.
pub fn units_owned_as_of<L: LedgerReader + ?Sized>(
    ledger: &L,
    user_id: i64,
    security_id: i64,
    date: NaiveDate,
) -> Result<Decimal> {
    let txs = ledger.transactions_for(user_id, security_id, &TxFilter::all().on_or_before(date))?;
    let units = signed_units(&txs)?;
    debug!(security_id, %date, %units, "Units owned");
    Ok(units)
}

pub fn signed_units(txs: &[Transaction]) -> Result<Decimal> {
    txs.iter().try_fold(Decimal::ZERO, |acc, t| {
        add("units held", acc, mul("units held", t.units, t.kind.sign())?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TxKind;

    fn tx(kind: TxKind, units: i64) -> Transaction {
        Transaction {
            id: 0,
            user_id: 1,
            security_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            kind,
            units: Decimal::from(units),
            unit_price: Decimal::ONE,
            fees: Decimal::ZERO,
            currency: "USD".into(),
        }
    }

    #[test]
    fn sells_subtract() {
        let txs = vec![tx(TxKind::Buy, 10), tx(TxKind::Sell, 4), tx(TxKind::Buy, 1)];
        assert_eq!(signed_units(&txs).unwrap(), Decimal::from(7));
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(signed_units(&[]).unwrap(), Decimal::ZERO);
    }
}
