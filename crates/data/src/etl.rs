//! Normalisation of vendor rows into the typed records the backtest consumes.
//!
//! Tick rows become the daily and minute views of the underlying; option
//! rows are parsed, time-shifted, filtered, and paired with an underlying
//! price. This is the only place where schema validation happens.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::US::Eastern;
use expiry_trade_core::{DataConfig, OptionQuote, QuoteTimezone, SymbolErrorPolicy};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::DataError;
use crate::models::{MinuteKey, OptionQuoteRow, UnderlyingTickRow};
use crate::store::{MarketDataStore, UnderlyingSeries};
use crate::symbol::parse_symbol;

/// Receipt timestamp format used by the quote vendor.
pub const RECEIPT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MINUTES_PER_DAY: i64 = 1_440;

/// Counts of what happened to the input rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub quote_rows: usize,
    pub quotes_accepted: usize,
    pub rejected_symbols: usize,
    pub beyond_end_date: usize,
    pub missing_underlying: usize,
    pub tick_rows: usize,
    pub non_positive_ticks: usize,
}

/// Parses a vendor receipt timestamp as a UTC instant.
///
/// # Errors
///
/// Returns `DataError::InvalidTimestamp` if `value` does not match
/// [`RECEIPT_FORMAT`].
pub fn parse_receipt_time(value: &str) -> Result<DateTime<Utc>, DataError> {
    NaiveDateTime::parse_from_str(value, RECEIPT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| DataError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

/// Wall-clock time on the configured quote clock.
#[must_use]
pub fn exchange_clock(timestamp: DateTime<Utc>, timezone: QuoteTimezone) -> NaiveDateTime {
    match timezone {
        QuoteTimezone::Utc => timestamp.naive_utc(),
        QuoteTimezone::UsEastern => timestamp.with_timezone(&Eastern).naive_local(),
    }
}

/// Minute key for a tick, shifting `ms_of_day` by `hour_offset` hours.
///
/// Shifts past midnight wrap within the same date.
#[must_use]
pub fn minute_key(date: NaiveDate, ms_of_day: i64, hour_offset: i64) -> MinuteKey {
    let shifted = ms_of_day + hour_offset * MS_PER_HOUR;
    let minute_of_day = shifted.div_euclid(MS_PER_MINUTE).rem_euclid(MINUTES_PER_DAY);
    // Both values are bounded by MINUTES_PER_DAY, so the casts are lossless.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    MinuteKey::new(date, (minute_of_day / 60) as u32, (minute_of_day % 60) as u32)
}

fn parse_tick_date(raw: u32) -> Result<NaiveDate, DataError> {
    NaiveDate::from_ymd_opt((raw / 10_000) as i32, (raw / 100) % 100, raw % 100)
        .ok_or(DataError::InvalidDate(raw))
}

/// Builds the daily and minute views from raw ticks, dropping non-positive
/// prices.
///
/// # Errors
///
/// Returns `DataError::InvalidDate` for a tick whose date is not a calendar date.
pub fn build_underlying(
    rows: &[UnderlyingTickRow],
    hour_offset: i64,
    stats: &mut IngestStats,
) -> Result<UnderlyingSeries, DataError> {
    let mut series = UnderlyingSeries::new();
    stats.tick_rows += rows.len();

    for row in rows {
        if row.price <= Decimal::ZERO {
            stats.non_positive_ticks += 1;
            continue;
        }
        let date = parse_tick_date(row.date)?;
        series.record_tick(minute_key(date, row.ms_of_day, hour_offset), row.price);
    }

    if stats.non_positive_ticks > 0 {
        tracing::info!(dropped = stats.non_positive_ticks, "Dropped non-positive underlying ticks");
    }
    Ok(series)
}

/// Validates raw option rows into [`OptionQuote`]s.
///
/// Rows expiring after `end_date` are dropped, as are rows with no aligned
/// underlying price. Malformed symbols are dropped or fatal according to
/// `config.symbol_errors`.
///
/// # Errors
///
/// Returns `DataError::InvalidTimestamp` for an unparseable receipt time,
/// `DataError::MalformedSymbol` under the abort policy, and
/// `DataError::EmptyUnderlying` if there are quotes but no underlying data.
pub fn normalize_quotes(
    rows: Vec<OptionQuoteRow>,
    config: &DataConfig,
    end_date: Option<NaiveDate>,
    underlying: &UnderlyingSeries,
    stats: &mut IngestStats,
) -> Result<Vec<OptionQuote>, DataError> {
    if !rows.is_empty() && underlying.is_empty() {
        return Err(DataError::EmptyUnderlying);
    }

    let token = config.symbol_token();
    let mut quotes = Vec::with_capacity(rows.len());
    stats.quote_rows += rows.len();

    for row in rows {
        let parsed = match parse_symbol(&row.symbol, config.symbol_layout, token) {
            Ok(parsed) => parsed,
            Err(e) => match config.symbol_errors {
                SymbolErrorPolicy::Abort => return Err(e),
                SymbolErrorPolicy::RejectRow => {
                    tracing::warn!(error = %e, "Rejected option row");
                    stats.rejected_symbols += 1;
                    continue;
                }
            },
        };

        if end_date.is_some_and(|end| parsed.expiration_date > end) {
            stats.beyond_end_date += 1;
            continue;
        }

        let received_at = parse_receipt_time(&row.ts_recv)?;
        let timestamp = exchange_clock(received_at, config.quote_timezone);

        let Some(underlying_price) =
            underlying.aligned_close(timestamp, config.underlying_alignment)
        else {
            stats.missing_underlying += 1;
            continue;
        };

        quotes.push(OptionQuote {
            received_at,
            receipt_text: row.ts_recv,
            timestamp,
            contract_id: row.symbol,
            expiration_date: parsed.expiration_date,
            option_type: parsed.option_type,
            strike_price: parsed.strike_price,
            bid_price: row.bid_price.unwrap_or_default(),
            ask_price: row.ask_price.unwrap_or_default(),
            bid_size: row.bid_size.unwrap_or_default(),
            ask_size: row.ask_size.unwrap_or_default(),
            underlying_price,
        });
    }

    stats.quotes_accepted += quotes.len();
    if stats.missing_underlying > 0 {
        tracing::warn!(
            dropped = stats.missing_underlying,
            "Dropped option rows without an underlying close"
        );
    }
    Ok(quotes)
}

/// Turns raw rows from both files into a ready-to-query store.
///
/// # Errors
///
/// Propagates any error from [`build_underlying`] or [`normalize_quotes`].
pub fn assemble(
    quote_rows: Vec<OptionQuoteRow>,
    tick_rows: &[UnderlyingTickRow],
    config: &DataConfig,
    end_date: Option<NaiveDate>,
) -> Result<(MarketDataStore, IngestStats), DataError> {
    let mut stats = IngestStats::default();
    let underlying = build_underlying(tick_rows, config.tick_hour_offset, &mut stats)?;
    let quotes = normalize_quotes(quote_rows, config, end_date, &underlying, &mut stats)?;

    tracing::info!(
        quotes = stats.quotes_accepted,
        rejected = stats.rejected_symbols,
        beyond_end = stats.beyond_end_date,
        ticks = stats.tick_rows,
        "Market data assembled"
    );

    Ok((MarketDataStore::new(quotes, underlying), stats))
}
