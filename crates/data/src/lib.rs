//! Data ingestion for expiry-cycle option backtests.
//!
//! This crate provides:
//! - CSV readers for vendor option quotes and underlying ticks
//! - Vendor symbol parsing and timestamp normalisation
//! - The in-memory market data store queried by the backtest
//! - The order table writer

pub mod csv_storage;
pub mod error;
pub mod etl;
pub mod models;
pub mod store;
pub mod symbol;

pub use csv_storage::CsvStorage;
pub use error::DataError;
pub use etl::{assemble, IngestStats};
pub use models::{
    MinuteKey, OptionQuoteRow, OrderRow, UnderlyingDailyBar, UnderlyingMinuteSnapshot,
    UnderlyingTickRow,
};
pub use store::{MarketDataStore, UnderlyingSeries};
pub use symbol::{parse_symbol, ParsedSymbol};
