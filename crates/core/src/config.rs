use crate::error::BacktestError;
use crate::order::OrderSide;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub strategy: StrategyConfig,
    pub data: DataConfig,
}

impl AppConfig {
    /// Checks both sections before any data is loaded.
    ///
    /// # Errors
    ///
    /// Returns `BacktestError::InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<(), BacktestError> {
        self.strategy.validate()
    }
}

/// How contracts are scored, ordered, and filled within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Premium selling: score by signed moneyness, most out-of-the-money first,
    /// eligible while `score <= threshold`, filled against the bid.
    DeviateAscending,
    /// Premium buying: score by signed moneyness minus the ask, best first,
    /// eligible while `score >= threshold`, filled against the ask.
    SpreadAdjustedDescending,
}

impl RankingPolicy {
    #[must_use]
    pub const fn order_side(&self) -> OrderSide {
        match self {
            Self::DeviateAscending => OrderSide::Sell,
            Self::SpreadAdjustedDescending => OrderSide::Buy,
        }
    }
}

/// What to do when one expiration cycle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleErrorPolicy {
    /// Log the failure, keep the ledger as it stands, move to the next cycle.
    #[default]
    SkipCycle,
    /// Stop the run and return the error.
    AbortRun,
}

/// Boundary handling for the settlement time key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementRule {
    /// Hours are clamped into `[open_hour, close_hour]`; any time inside the
    /// opening hour becomes `open_minute`, any time inside the closing hour
    /// becomes `close_minute`.
    PinnedHours,
    /// Hours before the open move to the opening hour, times before
    /// `open_hour:open_minute` move to it, hours after the close become
    /// `close_hour:close_minute`.
    OpeningFloor,
}

/// Window into which order times are clamped before the settlement lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementWindow {
    pub rule: SettlementRule,
    pub open_hour: u32,
    pub open_minute: u32,
    pub close_hour: u32,
    pub close_minute: u32,
}

impl SettlementWindow {
    /// Window for the feed whose minute keys run five hours ahead of New York
    /// (session 14:31 to 21:00).
    #[must_use]
    pub const fn pinned_hours() -> Self {
        Self {
            rule: SettlementRule::PinnedHours,
            open_hour: 14,
            open_minute: 31,
            close_hour: 21,
            close_minute: 0,
        }
    }

    /// Regular New York session, 09:31 to 16:00.
    #[must_use]
    pub const fn opening_floor() -> Self {
        Self {
            rule: SettlementRule::OpeningFloor,
            open_hour: 9,
            open_minute: 31,
            close_hour: 16,
            close_minute: 0,
        }
    }

    /// Clamps an (hour, minute) pair into the window.
    ///
    /// Clamping a pair that is already inside the window returns it unchanged.
    #[must_use]
    pub fn clamp(&self, hour: u32, minute: u32) -> (u32, u32) {
        match self.rule {
            SettlementRule::PinnedHours => {
                let hour = hour.clamp(self.open_hour, self.close_hour);
                let minute = if hour == self.open_hour {
                    self.open_minute
                } else if hour == self.close_hour {
                    self.close_minute
                } else {
                    minute
                };
                (hour, minute)
            }
            SettlementRule::OpeningFloor => {
                let mut hour = hour.max(self.open_hour);
                let mut minute = minute;
                if hour == self.open_hour && minute < self.open_minute {
                    minute = self.open_minute;
                }
                if hour > self.close_hour {
                    hour = self.close_hour;
                    minute = self.close_minute;
                }
                (hour, minute)
            }
        }
    }

    fn validate(&self) -> Result<(), BacktestError> {
        if self.open_hour > 23 || self.close_hour > 23 {
            return Err(BacktestError::InvalidConfig(
                "settlement window hours must be in 0..=23".to_string(),
            ));
        }
        if self.open_minute > 59 || self.close_minute > 59 {
            return Err(BacktestError::InvalidConfig(
                "settlement window minutes must be in 0..=59".to_string(),
            ));
        }
        if (self.open_hour, self.open_minute) > (self.close_hour, self.close_minute) {
            return Err(BacktestError::InvalidConfig(format!(
                "settlement window opens at {:02}:{:02} after it closes at {:02}:{:02}",
                self.open_hour, self.open_minute, self.close_hour, self.close_minute
            )));
        }
        Ok(())
    }
}

/// Strategy and capital parameters for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Opening ledger balance.
    pub capital: Decimal,
    /// Eligibility cutoff on the ranking score.
    pub threshold: Decimal,
    pub ranking_policy: RankingPolicy,
    /// Per-contract reserve as a fraction of strike (calls) or underlying (puts).
    pub margin_rate: Decimal,
    /// Share of capital held back from buying, fixed at the start of each cycle.
    pub spend_limit_ratio: Decimal,
    /// Flat fee charged per filled order.
    pub order_fee: Decimal,
    /// Fills whose premium is below this are skipped.
    pub min_premium: Decimal,
    /// Contract multiplier.
    pub multiplier: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub settlement_window: SettlementWindow,
    pub on_cycle_error: CycleErrorPolicy,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::selling()
    }
}

impl StrategyConfig {
    /// Premium-selling preset.
    #[must_use]
    pub fn selling() -> Self {
        Self {
            capital: Decimal::from(100_000_000),
            threshold: Decimal::from(-150),
            ranking_policy: RankingPolicy::DeviateAscending,
            margin_rate: Decimal::new(1, 1),
            spend_limit_ratio: Decimal::new(9, 1),
            order_fee: Decimal::ZERO,
            min_premium: Decimal::ONE,
            multiplier: Decimal::ONE_HUNDRED,
            start_date: None,
            end_date: None,
            settlement_window: SettlementWindow::pinned_hours(),
            on_cycle_error: CycleErrorPolicy::SkipCycle,
        }
    }

    /// Premium-buying preset.
    #[must_use]
    pub fn buying() -> Self {
        Self {
            threshold: Decimal::from(20),
            ranking_policy: RankingPolicy::SpreadAdjustedDescending,
            order_fee: Decimal::new(5, 1),
            settlement_window: SettlementWindow::opening_floor(),
            ..Self::selling()
        }
    }

    #[must_use]
    pub fn with_capital(mut self, capital: Decimal) -> Self {
        self.capital = capital;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    #[must_use]
    pub fn with_settlement_window(mut self, window: SettlementWindow) -> Self {
        self.settlement_window = window;
        self
    }

    #[must_use]
    pub fn with_cycle_error_policy(mut self, policy: CycleErrorPolicy) -> Self {
        self.on_cycle_error = policy;
        self
    }

    /// Whether an expiration date falls inside `[start_date, end_date]`.
    #[must_use]
    pub fn includes_expiration(&self, expiration: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| expiration >= start)
            && self.end_date.map_or(true, |end| expiration <= end)
    }

    /// # Errors
    ///
    /// Returns `BacktestError::InvalidConfig` for non-positive capital or
    /// multiplier, negative rates or fees, a spend ratio outside `[0, 1]`, an
    /// inverted date range, or a malformed settlement window.
    pub fn validate(&self) -> Result<(), BacktestError> {
        let invalid =
            |msg: String| -> Result<(), BacktestError> { Err(BacktestError::InvalidConfig(msg)) };

        if self.capital <= Decimal::ZERO {
            return invalid(format!("capital must be positive, got {}", self.capital));
        }
        if self.multiplier <= Decimal::ZERO {
            return invalid(format!("multiplier must be positive, got {}", self.multiplier));
        }
        if self.margin_rate < Decimal::ZERO {
            return invalid(format!("margin_rate must be >= 0, got {}", self.margin_rate));
        }
        if self.spend_limit_ratio < Decimal::ZERO || self.spend_limit_ratio > Decimal::ONE {
            return invalid(format!(
                "spend_limit_ratio must be in [0, 1], got {}",
                self.spend_limit_ratio
            ));
        }
        if self.order_fee < Decimal::ZERO || self.min_premium < Decimal::ZERO {
            return invalid("order_fee and min_premium must be >= 0".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return invalid(format!("start_date {start} is after end_date {end}"));
            }
        }
        self.settlement_window.validate()
    }
}

/// Layout of the vendor option symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolLayout {
    /// `YYYYMMDD` + `C|P` + strike x 1000, e.g. `SPX 20240119C4800000`.
    LongDate,
    /// OCC style `YYMMDD` + `C|P` + strike x 1000, e.g. `SPX   240119C04800000`.
    Occ,
}

impl SymbolLayout {
    /// Index of the space-separated token holding the contract details.
    #[must_use]
    pub const fn default_token(&self) -> usize {
        match self {
            Self::LongDate => 1,
            Self::Occ => 3,
        }
    }

    /// Number of characters in the expiration date.
    #[must_use]
    pub const fn date_width(&self) -> usize {
        match self {
            Self::LongDate => 8,
            Self::Occ => 6,
        }
    }

    #[must_use]
    pub const fn date_format(&self) -> &'static str {
        match self {
            Self::LongDate => "%Y%m%d",
            Self::Occ => "%y%m%d",
        }
    }
}

/// Handling of option rows whose symbol cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolErrorPolicy {
    /// Log and drop the row.
    #[default]
    RejectRow,
    /// Fail the whole load.
    Abort,
}

/// Clock used for quote dates and settlement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteTimezone {
    #[default]
    Utc,
    UsEastern,
}

/// How each quote is paired with an underlying price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderlyingAlignment {
    /// Close of the quote's own date; quotes without a bar that day are dropped.
    #[default]
    SameDayClose,
    /// Close of the latest bar on or before the quote's date, falling back to
    /// the earliest bar.
    AsOfClose,
}

/// Input files and ingestion rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub options_csv: String,
    pub underlying_csv: String,
    pub orders_csv: String,
    pub symbol_layout: SymbolLayout,
    /// Overrides the layout's default token index.
    pub symbol_token: Option<usize>,
    pub symbol_errors: SymbolErrorPolicy,
    pub quote_timezone: QuoteTimezone,
    /// Hours added to `ms_of_day` before deriving minute keys.
    pub tick_hour_offset: i64,
    pub underlying_alignment: UnderlyingAlignment,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            options_csv: "data/options.csv".to_string(),
            underlying_csv: "data/underlying.csv".to_string(),
            orders_csv: "data/orders.csv".to_string(),
            symbol_layout: SymbolLayout::LongDate,
            symbol_token: None,
            symbol_errors: SymbolErrorPolicy::RejectRow,
            quote_timezone: QuoteTimezone::Utc,
            tick_hour_offset: 5,
            underlying_alignment: UnderlyingAlignment::SameDayClose,
        }
    }
}

impl DataConfig {
    /// Feed preset for OCC symbols with quotes converted to New York time.
    #[must_use]
    pub fn occ_eastern() -> Self {
        Self {
            symbol_layout: SymbolLayout::Occ,
            quote_timezone: QuoteTimezone::UsEastern,
            tick_hour_offset: 0,
            underlying_alignment: UnderlyingAlignment::AsOfClose,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn symbol_token(&self) -> usize {
        self.symbol_token
            .unwrap_or_else(|| self.symbol_layout.default_token())
    }
}
