// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the statistics engine.
//!
//! Plumbing (CLI, price fetching, path resolution) reports through `anyhow`;
//! everything the calculators and the store can fail with lives here.

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("No user found with id: {0}")]
    UserNotFound(i64),

    #[error("No security found with id: {0}")]
    SecurityNotFound(i64),

    #[error("Invalid rate: {0}")]
    RateNotFound(String),

    #[error("No {field} recorded for user id {user_id} and security id {security_id}")]
    StatisticNotFound {
        user_id: i64,
        security_id: i64,
        field: &'static str,
    },

    #[error("No buy transactions found with ticker {ticker} for user id: {user_id}")]
    NoBuyTransactions { user_id: i64, ticker: String },

    #[error("Sell of {ticker} on {date} has no buy transaction dated on or before it")]
    SellWithoutPriorBuy { ticker: String, date: NaiveDate },

    #[error("Invalid stored {what} '{value}'")]
    InvalidStoredValue { what: String, value: String },

    #[error("No securities held by user id: {0}")]
    NoHoldings(i64),

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("Database operation failed: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Coarse classification used by the batch driver and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DataIntegrity,
    NoHoldings,
    Storage,
}

impl StatsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatsError::UserNotFound(_)
            | StatsError::SecurityNotFound(_)
            | StatsError::RateNotFound(_)
            | StatsError::StatisticNotFound { .. } => ErrorKind::NotFound,
            StatsError::NoBuyTransactions { .. }
            | StatsError::SellWithoutPriorBuy { .. }
            | StatsError::InvalidStoredValue { .. }
            | StatsError::Overflow(_) => ErrorKind::DataIntegrity,
            StatsError::NoHoldings(_) => ErrorKind::NoHoldings,
            StatsError::Database(_) => ErrorKind::Storage,
        }
    }

    pub fn is_data_integrity(&self) -> bool {
        self.kind() == ErrorKind::DataIntegrity
    }

    pub(crate) fn invalid(what: impl Into<String>, value: impl Into<String>) -> Self {
        StatsError::InvalidStoredValue {
            what: what.into(),
            value: value.into(),
        }
    }
}
