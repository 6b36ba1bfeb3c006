// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::HoldingContext;
use crate::error::{Result, StatsError};
use crate::ledger::{LedgerReader, TxFilter};
use crate::rates::RateCache;
use crate::utils::{add, mul};
use rust_decimal::Decimal;
use tracing::{error, info};

/// Cost basis of the user's buys in the security, in display currency.
pub fn total_cost<L: LedgerReader + ?Sized>(
    ledger: &L,
    user_id: i64,
    security_id: i64,
) -> Result<Decimal> {
    let ctx = HoldingContext::load(ledger, user_id, security_id)?;
    let mut rates = RateCache::new(ledger, &ctx.display_currency);
    cost_basis(ledger, &ctx, &mut rates)
}

/// Principal is converted into display currency; fees are added as recorded,
/// in the transaction's own currency.
// TODO: convert fees too once product confirms the cost-basis currency rules.
pub(crate) fn cost_basis<L: LedgerReader + ?Sized>(
    ledger: &L,
    ctx: &HoldingContext,
    rates: &mut RateCache<'_, L>,
) -> Result<Decimal> {
    let buys = ledger.transactions_for(ctx.user_id, ctx.security.id, &TxFilter::buys())?;
    if buys.is_empty() {
        let err = StatsError::NoBuyTransactions {
            user_id: ctx.user_id,
            ticker: ctx.ticker().to_string(),
        };
        error!("{}", err);
        return Err(err);
    }

    let mut total = Decimal::ZERO;
    for buy in &buys {
        let rate = rates.to(&buy.currency)?;
        let principal = mul("cost basis", mul("cost basis", buy.unit_price, buy.units)?, rate)?;
        total = add("cost basis", total, add("cost basis", principal, buy.fees)?)?;
    }
    info!(ticker = ctx.ticker(), "Cost: {} {}", ctx.display_currency, total.normalize());
    Ok(total)
}
