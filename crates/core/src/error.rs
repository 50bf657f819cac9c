//! Error types for backtest runs.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while configuring or running a backtest.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// No underlying snapshot exists at the clamped settlement minute.
    #[error(
        "missing settlement price for {contract_id} expiring {expiration} at {hour:02}:{minute:02}"
    )]
    MissingSettlementPrice {
        /// Expiration date being settled.
        expiration: NaiveDate,
        /// Clamped settlement hour.
        hour: u32,
        /// Clamped settlement minute.
        minute: u32,
        /// Contract whose settlement failed.
        contract_id: String,
    },

    /// Configuration rejected before the run started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
