//! In-memory market data store.
//!
//! Holds the normalised option quotes plus the daily and minute views of the
//! underlying. Everything is indexed once at construction; the backtest only
//! reads from it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use expiry_trade_core::{OptionQuote, UnderlyingAlignment};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{MinuteKey, UnderlyingDailyBar, UnderlyingMinuteSnapshot};

/// Daily bars and minute snapshots of the underlying index.
#[derive(Debug, Clone, Default)]
pub struct UnderlyingSeries {
    daily: BTreeMap<NaiveDate, UnderlyingDailyBar>,
    minutes: HashMap<MinuteKey, Decimal>,
}

impl UnderlyingSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one positive-priced tick into both views. Ticks must arrive in
    /// file order: the first tick of a date opens its bar and the last tick
    /// of a minute becomes that minute's snapshot.
    pub fn record_tick(&mut self, key: MinuteKey, price: Decimal) {
        self.daily
            .entry(key.date)
            .and_modify(|bar| bar.update(price))
            .or_insert_with(|| UnderlyingDailyBar::open_at(key.date, price));
        self.minutes.insert(key, price);
    }

    #[must_use]
    pub fn daily_bar(&self, date: NaiveDate) -> Option<&UnderlyingDailyBar> {
        self.daily.get(&date)
    }

    #[must_use]
    pub fn minute_price(&self, key: &MinuteKey) -> Option<Decimal> {
        self.minutes.get(key).copied()
    }

    /// Iterates daily bars in date order.
    pub fn daily_bars(&self) -> impl Iterator<Item = &UnderlyingDailyBar> {
        self.daily.values()
    }

    /// Minute snapshots sorted by key.
    #[must_use]
    pub fn minute_snapshots(&self) -> Vec<UnderlyingMinuteSnapshot> {
        let mut snapshots: Vec<_> = self
            .minutes
            .iter()
            .map(|(key, price)| UnderlyingMinuteSnapshot {
                key: *key,
                price: *price,
            })
            .collect();
        snapshots.sort_by_key(|s| s.key);
        snapshots
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    /// Underlying price to pair with a quote observed at `observed`.
    ///
    /// Bars are stamped at midnight of their date, so under `AsOfClose` a
    /// quote at exactly 00:00:00 pairs with the previous bar.
    #[must_use]
    pub fn aligned_close(
        &self,
        observed: NaiveDateTime,
        alignment: UnderlyingAlignment,
    ) -> Option<Decimal> {
        let date = observed.date();
        match alignment {
            UnderlyingAlignment::SameDayClose => self.daily.get(&date).map(|bar| bar.close),
            UnderlyingAlignment::AsOfClose => {
                let latest = if observed.time() == NaiveTime::MIN {
                    self.daily.range(..date).next_back()
                } else {
                    self.daily.range(..=date).next_back()
                };
                latest
                    .or_else(|| self.daily.iter().next())
                    .map(|(_, bar)| bar.close)
            }
        }
    }
}

/// Quotes grouped by (observation date, expiration date) plus the
/// underlying views.
#[derive(Debug, Clone, Default)]
pub struct MarketDataStore {
    quotes: Vec<OptionQuote>,
    by_cycle: BTreeMap<(NaiveDate, NaiveDate), Vec<usize>>,
    expirations: BTreeSet<NaiveDate>,
    underlying: UnderlyingSeries,
}

impl MarketDataStore {
    #[must_use]
    pub fn new(quotes: Vec<OptionQuote>, underlying: UnderlyingSeries) -> Self {
        let mut by_cycle: BTreeMap<(NaiveDate, NaiveDate), Vec<usize>> = BTreeMap::new();
        let mut expirations = BTreeSet::new();
        for (idx, quote) in quotes.iter().enumerate() {
            by_cycle
                .entry((quote.observation_date(), quote.expiration_date))
                .or_default()
                .push(idx);
            expirations.insert(quote.expiration_date);
        }

        tracing::debug!(
            quotes = quotes.len(),
            groups = by_cycle.len(),
            expirations = expirations.len(),
            "Market data indexed"
        );

        Self {
            quotes,
            by_cycle,
            expirations,
            underlying,
        }
    }

    /// Quotes observed on `date` for contracts expiring on `expiration`, in
    /// input order.
    #[must_use]
    pub fn quotes_on_date(&self, date: NaiveDate, expiration: NaiveDate) -> Vec<&OptionQuote> {
        self.by_cycle
            .get(&(date, expiration))
            .map(|indices| indices.iter().map(|&i| &self.quotes[i]).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn daily_bar(&self, date: NaiveDate) -> Option<&UnderlyingDailyBar> {
        self.underlying.daily_bar(date)
    }

    /// Exact-minute underlying price, `None` if nothing was recorded then.
    #[must_use]
    pub fn minute_snapshot(&self, date: NaiveDate, hour: u32, minute: u32) -> Option<Decimal> {
        self.underlying.minute_price(&MinuteKey::new(date, hour, minute))
    }

    /// Distinct expiration dates in ascending order.
    pub fn expirations(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.expirations.iter().copied()
    }

    #[must_use]
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }
}
