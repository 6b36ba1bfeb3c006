// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-holding calculators and the per-user pipeline that chains them.
//!
//! Each calculator exposes a query function keyed by (user, security) that
//! performs no writes, and a crate-internal variant working from an already
//! loaded [`HoldingContext`] that the pipeline uses.

pub mod cost;
pub mod dividends;
pub mod holdings;
pub mod pipeline;
pub mod realized;
pub mod total;
pub mod unrealized;
pub mod valuation;

use crate::error::{Result, StatsError};
use crate::ledger::LedgerReader;
use crate::models::Security;
use tracing::info;

/// Everything a calculator needs to know about one (user, security) pair.
#[derive(Debug, Clone)]
pub struct HoldingContext {
    pub user_id: i64,
    pub display_currency: String,
    pub security: Security,
}

impl HoldingContext {
    pub fn load<L: LedgerReader + ?Sized>(
        ledger: &L,
        user_id: i64,
        security_id: i64,
    ) -> Result<Self> {
        let display_currency = ledger.display_currency(user_id)?;
        let security = ledger.security(security_id)?;
        Ok(HoldingContext {
            user_id,
            display_currency,
            security,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.security.ticker
    }
}

/// Securities the user has transactions in. `NoHoldings` when there are none.
pub fn held_securities<L: LedgerReader + ?Sized>(ledger: &L, user_id: i64) -> Result<Vec<i64>> {
    ledger.display_currency(user_id)?;
    let ids = ledger.held_security_ids(user_id)?;
    if ids.is_empty() {
        info!("No stocks found for user with id: {}", user_id);
        return Err(StatsError::NoHoldings(user_id));
    }
    Ok(ids)
}
