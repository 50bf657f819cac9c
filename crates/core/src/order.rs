use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Code written to the order table ("B" or "S").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Buy => "B",
            Self::Sell => "S",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "B" | "BUY" => Ok(Self::Buy),
            "S" | "SELL" => Ok(Self::Sell),
            _ => Err(format!("unknown order side: '{s}'")),
        }
    }
}

/// A filled order. The ordered sequence of these is the output of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub timestamp: DateTime<Utc>,
    /// Receipt timestamp of the filled quote, verbatim. Written to the order
    /// table as-is.
    pub receipt_text: String,
    pub contract_id: String,
    pub side: OrderSide,
    /// Number of contracts; fractional sizes are allowed.
    pub size: Decimal,
}

impl Order {
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        receipt_text: String,
        contract_id: String,
        side: OrderSide,
        size: Decimal,
    ) -> Self {
        Self {
            timestamp,
            receipt_text,
            contract_id,
            side,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_codes_round_trip() {
        assert_eq!(OrderSide::Buy.code(), "B");
        assert_eq!(OrderSide::Sell.to_string(), "S");
        assert_eq!("s".parse::<OrderSide>().unwrap(), OrderSide::Sell);
        assert_eq!("BUY".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert!("X".parse::<OrderSide>().is_err());
    }
}
