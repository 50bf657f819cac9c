use crate::order::OrderSide;
use crate::quote::OptionType;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A position opened by the allocator and closed by settlement within the
/// same expiration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePosition {
    pub contract_id: String,
    pub strike_price: Decimal,
    pub option_type: OptionType,
    /// Sell for written options, Buy for long options.
    pub side: OrderSide,
    pub size: Decimal,
    /// Exchange-clock time of the fill; drives the settlement time key.
    pub order_time: NaiveDateTime,
    pub expiration_date: NaiveDate,
}

impl ActivePosition {
    /// Intrinsic value of the position at `settlement_price`, in currency units.
    ///
    /// Calls are worth `size * multiplier * (price - strike)` above the strike,
    /// puts `size * multiplier * (strike - price)` below it; otherwise zero.
    #[must_use]
    pub fn intrinsic_value(&self, settlement_price: Decimal, multiplier: Decimal) -> Decimal {
        let diff = settlement_price - self.strike_price;
        let in_the_money = match self.option_type {
            OptionType::Call if diff > Decimal::ZERO => diff,
            OptionType::Put if diff < Decimal::ZERO => -diff,
            _ => return Decimal::ZERO,
        };
        self.size * multiplier * in_the_money
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(option_type: OptionType, strike: Decimal, size: Decimal) -> ActivePosition {
        let expiration = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        ActivePosition {
            contract_id: "SPX".to_string(),
            strike_price: strike,
            option_type,
            side: OrderSide::Sell,
            size,
            order_time: NaiveDate::from_ymd_opt(2024, 1, 4)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
            expiration_date: expiration,
        }
    }

    #[test]
    fn call_pays_above_strike() {
        let pos = position(OptionType::Call, dec!(4800), dec!(2));
        assert_eq!(pos.intrinsic_value(dec!(4810), dec!(100)), dec!(2000));
        assert_eq!(pos.intrinsic_value(dec!(4790), dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn put_pays_below_strike() {
        let pos = position(OptionType::Put, dec!(4800), dec!(1.5));
        assert_eq!(pos.intrinsic_value(dec!(4790), dec!(100)), dec!(1500));
        assert_eq!(pos.intrinsic_value(dec!(4800), dec!(100)), Decimal::ZERO);
    }
}
