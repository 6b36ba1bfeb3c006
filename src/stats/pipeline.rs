// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user recompute.
//!
//! Stages run strictly in the order units, cost, value, realized,
//! unrealized, dividends, total. Later stages read what earlier ones produced
//! from a [`StatisticDraft`]; the finished row is written once per security.
//! All of a user's writes share one SQLite transaction.

use super::{HoldingContext, cost, dividends, held_securities, holdings, realized, total};
use super::{unrealized::unrealized_from, valuation::market_value};
use crate::error::{Result, StatsError};
use crate::ledger::LedgerReader;
use crate::models::Statistic;
use crate::prices::{PriceSource, refresh_prices};
use crate::rates::RateCache;
use crate::store;
use crate::utils::mul;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// In-memory accumulator for one (user, security) pair.
#[derive(Debug)]
pub struct StatisticDraft {
    stat: Statistic,
}

impl StatisticDraft {
    fn new(user_id: i64, security_id: i64) -> Self {
        StatisticDraft {
            stat: Statistic::new(user_id, security_id),
        }
    }

    fn need(&self, field: &'static str, v: Option<Decimal>) -> Result<Decimal> {
        v.ok_or(StatsError::StatisticNotFound {
            user_id: self.stat.user_id,
            security_id: self.stat.security_id,
            field,
        })
    }

    fn units(&self) -> Result<Decimal> {
        self.need("total units", self.stat.total_units)
    }

    fn cost(&self) -> Result<Decimal> {
        self.need("total cost", self.stat.total_cost)
    }

    fn realized(&self) -> Result<Decimal> {
        self.need("realized profit", self.stat.realized_profit)
    }

    fn unrealized(&self) -> Result<Decimal> {
        self.need("unrealized profit", self.stat.unrealized_profit)
    }

    fn finish(self) -> Statistic {
        self.stat
    }
}

fn compute_holding<L: LedgerReader + ?Sized>(
    ledger: &L,
    ctx: &HoldingContext,
    as_of: NaiveDate,
    rates: &mut RateCache<'_, L>,
) -> Result<Statistic> {
    let mut draft = StatisticDraft::new(ctx.user_id, ctx.security.id);

    draft.stat.total_units = Some(holdings::units_owned_as_of(
        ledger,
        ctx.user_id,
        ctx.security.id,
        as_of,
    )?);
    info!(ticker = ctx.ticker(), "Total Units: {}", draft.units()?.normalize());

    draft.stat.total_cost = Some(cost::cost_basis(ledger, ctx, rates)?);

    let base_rate = rates.to(&ctx.security.base_currency)?;
    let price = mul("unrealized profit", ctx.security.last_price, base_rate)?;
    let value = market_value(draft.units()?, ctx.security.last_price, base_rate)?;
    info!(ticker = ctx.ticker(), "Value: {} {}", ctx.display_currency, value.normalize());
    draft.stat.total_value = Some(value);

    draft.stat.realized_profit = Some(realized::realized_in(ledger, ctx, rates)?);

    let unrealized = unrealized_from(price, draft.cost()?, draft.units()?)?;
    info!(
        ticker = ctx.ticker(),
        "Unrealized Profits: {} {}",
        ctx.display_currency,
        unrealized.normalize()
    );
    draft.stat.unrealized_profit = Some(unrealized);

    if ctx.security.pays_dividends {
        draft.stat.dividends_earned = Some(dividends::dividends_in(ledger, ctx, rates)?);
    }

    let total = total::total_from(
        draft.realized()?,
        draft.unrealized()?,
        draft.stat.dividends_earned,
    )?;
    info!(
        ticker = ctx.ticker(),
        "Total Profits: {} {}",
        ctx.display_currency,
        total.normalize()
    );
    draft.stat.total_profit = Some(total);

    Ok(draft.finish())
}

/// Run every stage for one holding without writing anything.
pub fn preview_holding<L: LedgerReader + ?Sized>(
    ledger: &L,
    user_id: i64,
    security_id: i64,
    as_of: NaiveDate,
) -> Result<Statistic> {
    let ctx = HoldingContext::load(ledger, user_id, security_id)?;
    let mut rates = RateCache::new(ledger, &ctx.display_currency);
    compute_holding(ledger, &ctx, as_of, &mut rates)
}

#[derive(Debug)]
pub enum RecomputeOutcome {
    Updated(Vec<Statistic>),
    /// The user holds nothing; no rows were touched.
    Skipped,
}

pub fn recompute_for_user(conn: &mut Connection, user_id: i64) -> Result<RecomputeOutcome> {
    recompute_for_user_as_of(conn, user_id, Utc::now().date_naive())
}

/// Recompute every holding of `user_id`, with units counted as of `as_of`.
/// On error nothing is written for this user.
pub fn recompute_for_user_as_of(
    conn: &mut Connection,
    user_id: i64,
    as_of: NaiveDate,
) -> Result<RecomputeOutcome> {
    info!("Statistics for user id: {}", user_id);
    let tx = conn.transaction()?;
    let stats = {
        let ledger: &Connection = &tx;
        let display_currency = ledger.display_currency(user_id)?;
        let security_ids = match held_securities(ledger, user_id) {
            Ok(ids) => ids,
            Err(StatsError::NoHoldings(_)) => return Ok(RecomputeOutcome::Skipped),
            Err(e) => return Err(e),
        };

        let mut rates = RateCache::new(ledger, &display_currency);
        let mut stats = Vec::with_capacity(security_ids.len());
        for security_id in security_ids {
            let ctx = HoldingContext {
                user_id,
                display_currency: display_currency.clone(),
                security: ledger.security(security_id)?,
            };
            let stat = compute_holding(ledger, &ctx, as_of, &mut rates).inspect_err(|e| {
                error!(ticker = ctx.ticker(), "Recompute for user id {} failed: {}", user_id, e)
            })?;
            store::upsert(ledger, &stat)?;
            stats.push(stat);
        }
        stats
    };
    tx.commit()?;
    Ok(RecomputeOutcome::Updated(stats))
}

/// Outcome of a batch over all users. A failed user never hides behind a
/// successful batch: check `failed`.
#[derive(Debug, Default)]
pub struct RecomputeReport {
    pub updated: Vec<i64>,
    pub skipped: Vec<i64>,
    pub failed: Vec<(i64, StatsError)>,
}

impl RecomputeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn recompute_for_all_users(conn: &mut Connection) -> Result<RecomputeReport> {
    recompute_for_all_users_as_of(conn, Utc::now().date_naive())
}

pub fn recompute_for_all_users_as_of(
    conn: &mut Connection,
    as_of: NaiveDate,
) -> Result<RecomputeReport> {
    let user_ids = conn.user_ids()?;
    let mut report = RecomputeReport::default();
    for user_id in user_ids {
        match recompute_for_user_as_of(conn, user_id, as_of) {
            Ok(RecomputeOutcome::Updated(_)) => report.updated.push(user_id),
            Ok(RecomputeOutcome::Skipped) => report.skipped.push(user_id),
            Err(e) => {
                warn!("Statistics for user id {} not updated: {}", user_id, e);
                report.failed.push((user_id, e));
            }
        }
    }
    info!(
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Recompute finished"
    );
    Ok(report)
}

/// Re-derive only `total_profit` from the persisted components.
/// Returns how many rows were updated.
pub fn refresh_total_profits_for_user(conn: &mut Connection, user_id: i64) -> Result<usize> {
    let tx = conn.transaction()?;
    let updated = {
        let ledger: &Connection = &tx;
        let security_ids = match held_securities(ledger, user_id) {
            Ok(ids) => ids,
            Err(StatsError::NoHoldings(_)) => return Ok(0),
            Err(e) => return Err(e),
        };
        for &security_id in &security_ids {
            let total = total::total_profit(ledger, user_id, security_id)?;
            store::set_total_profit(ledger, user_id, security_id, total)?;
        }
        security_ids.len()
    };
    tx.commit()?;
    Ok(updated)
}

pub fn refresh_total_profits_for_all_users(conn: &mut Connection) -> Result<RecomputeReport> {
    let mut report = RecomputeReport::default();
    for user_id in conn.user_ids()? {
        match refresh_total_profits_for_user(conn, user_id) {
            Ok(0) => report.skipped.push(user_id),
            Ok(_) => report.updated.push(user_id),
            Err(e) => {
                warn!("Total profits for user id {} not updated: {}", user_id, e);
                report.failed.push((user_id, e));
            }
        }
    }
    Ok(report)
}

/// Scheduled job body: refresh prices, recompute every user, then refresh
/// total profits from the stored rows of the users that were recomputed.
/// A failed price refresh is logged and the recompute proceeds on last known
/// prices; a failed total refresh moves the user to `failed`.
pub fn run_batch(
    conn: &mut Connection,
    prices: Option<&dyn PriceSource>,
    as_of: NaiveDate,
) -> Result<RecomputeReport> {
    if let Some(source) = prices {
        match refresh_prices(conn, source) {
            Ok(n) => info!("Refreshed {} prices", n),
            Err(e) => warn!("Price refresh failed, using last known prices: {:#}", e),
        }
    }
    let mut report = recompute_for_all_users_as_of(conn, as_of)?;

    let recomputed = std::mem::take(&mut report.updated);
    for user_id in recomputed {
        match refresh_total_profits_for_user(conn, user_id) {
            Ok(_) => report.updated.push(user_id),
            Err(e) => {
                warn!("Total profits for user id {} not updated: {}", user_id, e);
                report.failed.push((user_id, e));
            }
        }
    }
    Ok(report)
}
