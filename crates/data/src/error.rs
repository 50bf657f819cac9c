//! Error types for data ingestion.

use thiserror::Error;

/// Errors raised while turning vendor rows into typed records.
#[derive(Debug, Error)]
pub enum DataError {
    /// Symbol does not carry a parseable expiration, right, or strike.
    #[error("malformed contract symbol '{symbol}': {reason}")]
    MalformedSymbol {
        /// Raw vendor symbol.
        symbol: String,
        /// What could not be parsed.
        reason: String,
    },

    /// Receipt timestamp is not in the expected ISO-8601 form.
    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        /// Raw timestamp text.
        value: String,
        /// Underlying chrono parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// Tick date is not a valid `YYYYMMDD` calendar date.
    #[error("invalid tick date {0}")]
    InvalidDate(u32),

    /// No underlying bar is available to price any quote.
    #[error("underlying series is empty")]
    EmptyUnderlying,
}

impl DataError {
    pub(crate) fn malformed(symbol: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSymbol {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}
