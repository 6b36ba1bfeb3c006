// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::HoldingContext;
use crate::error::Result;
use crate::rates::resolve_rate;
use crate::store;
use crate::utils::mul;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::info;

pub fn market_value(units: Decimal, last_price: Decimal, rate: Decimal) -> Result<Decimal> {
    mul("market value", mul("market value", units, last_price)?, rate)
}

/// Market value of the persisted unit count at the security's last price.
/// Requires a prior recompute to have stored `total_units`.
pub fn total_value(conn: &Connection, user_id: i64, security_id: i64) -> Result<Decimal> {
    let ctx = HoldingContext::load(conn, user_id, security_id)?;
    let units = store::require(conn, user_id, security_id, "total units", |s| s.total_units)?;
    let rate = resolve_rate(conn, &ctx.security.base_currency, &ctx.display_currency)?;
    let value = market_value(units, ctx.security.last_price, rate)?;
    info!(ticker = ctx.ticker(), "Value: {} {}", ctx.display_currency, value.normalize());
    Ok(value)
}
