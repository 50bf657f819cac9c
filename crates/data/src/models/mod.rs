//! Row and series models for vendor data.
//!
//! Raw rows mirror the CSV columns exactly and are validated into the typed
//! core records by the ETL step. All prices use `rust_decimal::Decimal`.

pub mod option_quote;
pub mod order_row;
pub mod underlying;

pub use option_quote::OptionQuoteRow;
pub use order_row::OrderRow;
pub use underlying::{MinuteKey, UnderlyingDailyBar, UnderlyingMinuteSnapshot, UnderlyingTickRow};
