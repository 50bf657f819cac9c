//! Underlying index ticks and the two price views derived from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the underlying tick file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingTickRow {
    /// Trading date as `YYYYMMDD`.
    pub date: u32,
    /// Milliseconds since midnight on the vendor's clock.
    pub ms_of_day: i64,
    pub price: Decimal,
}

/// Daily OHLC built from the ticks of one date in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingDailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl UnderlyingDailyBar {
    /// Starts a bar from the first tick of the day.
    #[must_use]
    pub const fn open_at(date: NaiveDate, price: Decimal) -> Self {
        Self {
            date,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Folds a later tick of the same day into the bar.
    pub fn update(&mut self, price: Decimal) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }
}

/// Lookup key for minute snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinuteKey {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl MinuteKey {
    #[must_use]
    pub const fn new(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self { date, hour, minute }
    }
}

/// Representative (last) price recorded within one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingMinuteSnapshot {
    pub key: MinuteKey,
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn bar_tracks_first_max_min_last() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut bar = UnderlyingDailyBar::open_at(date, dec!(4750));
        for price in [dec!(4760), dec!(4720), dec!(4742.5)] {
            bar.update(price);
        }
        assert_eq!(bar.open, dec!(4750));
        assert_eq!(bar.high, dec!(4760));
        assert_eq!(bar.low, dec!(4720));
        assert_eq!(bar.close, dec!(4742.5));
    }
}
