// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Realized profit under a weighted-average-at-time-of-sale model.
//!
//! Every sell is priced against the average cost of *all* buys dated on or
//! before it. Sells do not consume lots, so two sells may draw on the same
//! buys; this is not FIFO/LIFO.

use super::HoldingContext;
use crate::error::{Result, StatsError};
use crate::ledger::{LedgerReader, TxFilter};
use crate::models::Transaction;
use crate::rates::RateCache;
use crate::utils::{add, div_half_up, mul, sub};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, error, info};

pub fn realized_profit<L: LedgerReader + ?Sized>(
    ledger: &L,
    user_id: i64,
    security_id: i64,
) -> Result<Decimal> {
    let ctx = HoldingContext::load(ledger, user_id, security_id)?;
    let mut rates = RateCache::new(ledger, &ctx.display_currency);
    realized_in(ledger, &ctx, &mut rates)
}

pub(crate) fn realized_in<L: LedgerReader + ?Sized>(
    ledger: &L,
    ctx: &HoldingContext,
    rates: &mut RateCache<'_, L>,
) -> Result<Decimal> {
    let sells = ledger.transactions_for(ctx.user_id, ctx.security.id, &TxFilter::sells())?;
    if sells.is_empty() {
        info!(ticker = ctx.ticker(), "Realized Profits: {} 0", ctx.display_currency);
        return Ok(Decimal::ZERO);
    }

    let mut averages: HashMap<NaiveDate, Decimal> = HashMap::new();
    let mut total = Decimal::ZERO;
    for sell in &sells {
        let avg = match averages.get(&sell.date) {
            Some(avg) => *avg,
            None => {
                let avg = average_buy_price(ledger, ctx, rates, sell.date)?;
                averages.insert(sell.date, avg);
                avg
            }
        };
        let rate = rates.to(&sell.currency)?;
        let realized = realized_for_sell(sell, rate, avg)?;
        debug!(
            ticker = ctx.ticker(),
            sell_id = sell.id,
            %avg,
            %realized,
            "Realized on sell"
        );
        total = add("realized profit", total, realized)?;
    }

    info!(
        ticker = ctx.ticker(),
        "Realized Profits: {} {}",
        ctx.display_currency,
        total.normalize()
    );
    Ok(total)
}

/// Average display-currency cost per unit of buys dated on or before `date`,
/// fees included. A sell with no such buy is a ledger integrity violation.
fn average_buy_price<L: LedgerReader + ?Sized>(
    ledger: &L,
    ctx: &HoldingContext,
    rates: &mut RateCache<'_, L>,
    date: NaiveDate,
) -> Result<Decimal> {
    let buys = ledger.transactions_for(
        ctx.user_id,
        ctx.security.id,
        &TxFilter::buys().on_or_before(date),
    )?;
    if buys.is_empty() {
        let err = StatsError::SellWithoutPriorBuy {
            ticker: ctx.ticker().to_string(),
            date,
        };
        error!("{}", err);
        return Err(err);
    }

    let mut units = Decimal::ZERO;
    let mut cost = Decimal::ZERO;
    for buy in &buys {
        let rate = rates.to(&buy.currency)?;
        units = add("average buy price", units, buy.units)?;
        let principal = mul("average buy price", mul("average buy price", buy.units, buy.unit_price)?, rate)?;
        let fees = mul("average buy price", buy.fees, rate)?;
        cost = add("average buy price", cost, add("average buy price", principal, fees)?)?;
    }
    div_half_up(cost, units)
}

/// `(net proceeds per unit - average buy price) * units`, proceeds net of
/// fees and converted with `rate`.
pub fn realized_for_sell(
    sell: &Transaction,
    rate: Decimal,
    average_buy_price: Decimal,
) -> Result<Decimal> {
    if sell.units.is_zero() {
        return Ok(Decimal::ZERO);
    }
    const WHAT: &str = "realized profit";
    let gross = mul(WHAT, mul(WHAT, sell.units, sell.unit_price)?, rate)?;
    let net = sub(WHAT, gross, mul(WHAT, sell.fees, rate)?)?;
    let per_unit = div_half_up(net, sell.units)?;
    mul(WHAT, sub(WHAT, per_unit, average_buy_price)?, sell.units)
}
