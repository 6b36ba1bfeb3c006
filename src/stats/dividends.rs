// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::HoldingContext;
use super::holdings::units_owned_as_of;
use crate::error::Result;
use crate::ledger::LedgerReader;
use crate::rates::RateCache;
use crate::utils::{add, mul};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Dividend income since the user's first transaction in the security,
/// each payout weighted by the units held on its ex-date.
pub fn dividends_earned<L: LedgerReader + ?Sized>(
    ledger: &L,
    user_id: i64,
    security_id: i64,
) -> Result<Decimal> {
    let ctx = HoldingContext::load(ledger, user_id, security_id)?;
    let mut rates = RateCache::new(ledger, &ctx.display_currency);
    dividends_in(ledger, &ctx, &mut rates)
}

pub(crate) fn dividends_in<L: LedgerReader + ?Sized>(
    ledger: &L,
    ctx: &HoldingContext,
    rates: &mut RateCache<'_, L>,
) -> Result<Decimal> {
    let Some(earliest) = ledger.earliest_transaction_date(ctx.user_id, ctx.security.id)? else {
        return Ok(Decimal::ZERO);
    };
    let dividends = ledger.dividends_on_or_after(ctx.security.id, earliest)?;
    if dividends.is_empty() {
        info!(ticker = ctx.ticker(), "Dividends Earned: {} 0", ctx.display_currency);
        return Ok(Decimal::ZERO);
    }

    let rate = rates.to(&ctx.security.base_currency)?;
    let mut total = Decimal::ZERO;
    for dividend in &dividends {
        let units = units_owned_as_of(ledger, ctx.user_id, ctx.security.id, dividend.ex_date)?;
        let earned = mul("dividends earned", mul("dividends earned", units, dividend.payout)?, rate)?;
        debug!(
            ticker = ctx.ticker(),
            ex_date = %dividend.ex_date,
            %units,
            %earned,
            "Dividends earned on ex-date"
        );
        total = add("dividends earned", total, earned)?;
    }
    info!(
        ticker = ctx.ticker(),
        "Dividends Earned: {} {}",
        ctx.display_currency,
        total.normalize()
    );
    Ok(total)
}
