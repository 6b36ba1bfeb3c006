// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::HoldingContext;
use crate::error::Result;
use crate::rates::resolve_rate;
use crate::store;
use crate::utils::{div_half_up, mul, sub};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::info;

/// Mark-to-market gain: `(price - cost / units) * units`, average cost zero
/// when no units are held.
pub fn unrealized_from(price_converted: Decimal, cost: Decimal, units: Decimal) -> Result<Decimal> {
    let average_cost = div_half_up(cost, units)?;
    mul("unrealized profit", sub("unrealized profit", price_converted, average_cost)?, units)
}

/// Unrealized profit from the persisted `total_cost` and `total_units`.
pub fn unrealized_profit(conn: &Connection, user_id: i64, security_id: i64) -> Result<Decimal> {
    let ctx = HoldingContext::load(conn, user_id, security_id)?;
    let rate = resolve_rate(conn, &ctx.security.base_currency, &ctx.display_currency)?;
    let cost = store::require(conn, user_id, security_id, "total cost", |s| s.total_cost)?;
    let units = store::require(conn, user_id, security_id, "total units", |s| s.total_units)?;
    let price = mul("unrealized profit", ctx.security.last_price, rate)?;
    let profit = unrealized_from(price, cost, units)?;
    info!(
        ticker = ctx.ticker(),
        "Unrealized Profits: {} {}",
        ctx.display_currency,
        profit.normalize()
    );
    Ok(profit)
}
