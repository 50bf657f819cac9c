//! Output order table row.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the order table handed to downstream execution/P&L tooling.
///
/// Columns: `datetime,option_symbol,action,order_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub datetime: String,
    pub option_symbol: String,
    /// `B` or `S`.
    pub action: String,
    pub order_size: Decimal,
}
