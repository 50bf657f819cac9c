//! Raw option quote rows as delivered by the market data vendor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the vendor's top-of-book option file.
///
/// Only the columns used by the backtest are mapped; any other columns in
/// the file are ignored. Empty price or size cells deserialize to `None` and
/// are treated as zero (not tradable) downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuoteRow {
    /// Receipt timestamp, e.g. `2024-01-04T15:00:00.123456789Z`.
    pub ts_recv: String,
    /// Vendor symbol carrying root, expiration, right, and strike.
    pub symbol: String,
    #[serde(rename = "bid_px_00")]
    pub bid_price: Option<Decimal>,
    #[serde(rename = "ask_px_00")]
    pub ask_price: Option<Decimal>,
    #[serde(rename = "bid_sz_00")]
    pub bid_size: Option<u64>,
    #[serde(rename = "ask_sz_00")]
    pub ask_size: Option<u64>,
}
