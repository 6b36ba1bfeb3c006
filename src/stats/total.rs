// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::HoldingContext;
use crate::error::{Result, StatsError};
use crate::store;
use crate::utils::add;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::info;

pub fn total_from(
    realized: Decimal,
    unrealized: Decimal,
    dividends: Option<Decimal>,
) -> Result<Decimal> {
    let profits = add("total profit", realized, unrealized)?;
    add("total profit", profits, dividends.unwrap_or_default())
}

/// Sum of the persisted realized, unrealized and dividend figures.
/// Dividends may be absent; the two profit figures may not.
pub fn total_profit(conn: &Connection, user_id: i64, security_id: i64) -> Result<Decimal> {
    let ctx = HoldingContext::load(conn, user_id, security_id)?;
    let missing = |field| StatsError::StatisticNotFound {
        user_id,
        security_id,
        field,
    };
    let stat = store::find(conn, user_id, security_id)?.ok_or_else(|| missing("statistic"))?;
    let realized = stat.realized_profit.ok_or_else(|| missing("realized profit"))?;
    let unrealized = stat
        .unrealized_profit
        .ok_or_else(|| missing("unrealized profit"))?;
    let total = total_from(realized, unrealized, stat.dividends_earned)?;
    info!(
        ticker = ctx.ticker(),
        "Total Profits: {} {}",
        ctx.display_currency,
        total.normalize()
    );
    Ok(total)
}
