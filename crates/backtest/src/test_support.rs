//! Builders shared by the unit tests.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use expiry_trade_core::{OptionQuote, OptionType};
use expiry_trade_data::{MarketDataStore, MinuteKey, UnderlyingSeries};
use rust_decimal::Decimal;

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDateTime::new(date(day), NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

fn receipt_text(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string()
}

/// Quote builder with sensible defaults: observed 15:00 the day before
/// expiration, bid 1 x 10, ask 1.2 x 10.
pub struct QuoteBuilder {
    quote: OptionQuote,
}

impl QuoteBuilder {
    pub fn new(option_type: OptionType, strike: Decimal, underlying: Decimal) -> Self {
        let timestamp = at(4, 15, 0);
        let strike_code = strike * Decimal::ONE_THOUSAND;
        Self {
            quote: OptionQuote {
                received_at: timestamp.and_utc(),
                receipt_text: receipt_text(timestamp),
                timestamp,
                contract_id: format!("SPX 20240105{}{strike_code}", option_type.code()),
                expiration_date: date(5),
                option_type,
                strike_price: strike,
                bid_price: Decimal::ONE,
                ask_price: Decimal::new(12, 1),
                bid_size: 10,
                ask_size: 10,
                underlying_price: underlying,
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.quote.contract_id = id.to_string();
        self
    }

    pub fn bid(mut self, price: Decimal, size: u64) -> Self {
        self.quote.bid_price = price;
        self.quote.bid_size = size;
        self
    }

    pub fn ask(mut self, price: Decimal, size: u64) -> Self {
        self.quote.ask_price = price;
        self.quote.ask_size = size;
        self
    }

    pub fn observed(mut self, timestamp: NaiveDateTime) -> Self {
        self.quote.timestamp = timestamp;
        self.quote.received_at = timestamp.and_utc();
        self.quote.receipt_text = receipt_text(timestamp);
        self
    }

    pub fn expiring(mut self, expiration: NaiveDate) -> Self {
        self.quote.expiration_date = expiration;
        self
    }

    pub fn build(self) -> OptionQuote {
        self.quote
    }
}

/// Store whose minute snapshots are the given (day, hour, minute, price) rows.
pub fn store(quotes: Vec<OptionQuote>, minutes: &[(u32, u32, u32, Decimal)]) -> MarketDataStore {
    let mut series = UnderlyingSeries::new();
    for &(day, hour, minute, price) in minutes {
        series.record_tick(MinuteKey::new(date(day), hour, minute), price);
    }
    MarketDataStore::new(quotes, series)
}
