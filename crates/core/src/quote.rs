//! Option quote types.
//!
//! An [`OptionQuote`] is one top-of-book snapshot for one contract at one
//! instant, already normalised by the data layer and paired with the
//! underlying price that was current for its observation date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Right of an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Single-letter code used inside vendor symbols.
    #[must_use]
    pub const fn code(&self) -> char {
        match self {
            Self::Call => 'C',
            Self::Put => 'P',
        }
    }

    /// Parses the single-letter code from a vendor symbol.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'C' | 'c' => Some(Self::Call),
            'P' | 'p' => Some(Self::Put),
            _ => None,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c" | "call" => Ok(Self::Call),
            "p" | "put" => Ok(Self::Put),
            _ => Err(format!("unknown option type: '{s}'")),
        }
    }
}

/// A single normalised top-of-book observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Receipt instant as reported by the vendor (UTC).
    pub received_at: DateTime<Utc>,
    /// `received_at` exactly as written in the vendor file.
    pub receipt_text: String,
    /// Exchange-clock time used for date grouping and settlement lookups.
    pub timestamp: NaiveDateTime,
    /// Raw vendor symbol.
    pub contract_id: String,
    pub expiration_date: NaiveDate,
    pub option_type: OptionType,
    pub strike_price: Decimal,
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub bid_size: u64,
    pub ask_size: u64,
    /// Underlying price aligned to this quote's observation date.
    pub underlying_price: Decimal,
}

impl OptionQuote {
    /// Calendar date on which the quote was observed.
    #[must_use]
    pub fn observation_date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Signed distance between underlying and strike, oriented by option type.
    ///
    /// `underlying - strike` for calls, `strike - underlying` for puts. Positive
    /// values mean the contract is in the money; the more negative the value,
    /// the further out of the money it sits.
    #[must_use]
    pub fn moneyness_signed(&self) -> Decimal {
        let deviate = self.underlying_price - self.strike_price;
        match self.option_type {
            OptionType::Call => deviate,
            OptionType::Put => -deviate,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::quote;
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn call_moneyness_is_underlying_minus_strike() {
        let q = quote(OptionType::Call, dec!(4700), dec!(4800), date(4), date(5));
        assert_eq!(q.moneyness_signed(), dec!(100));
    }

    #[test]
    fn put_moneyness_is_sign_flipped() {
        // In-the-money put: underlying below strike.
        let q = quote(OptionType::Put, dec!(5000), dec!(4800), date(4), date(5));
        assert_eq!(q.moneyness_signed(), dec!(200));

        let otm = quote(OptionType::Put, dec!(4600), dec!(4800), date(4), date(5));
        assert_eq!(otm.moneyness_signed(), dec!(-200));
    }

    #[test]
    fn option_type_codes() {
        assert_eq!(OptionType::from_code('C'), Some(OptionType::Call));
        assert_eq!(OptionType::from_code('p'), Some(OptionType::Put));
        assert_eq!(OptionType::from_code('X'), None);
        assert_eq!("PUT".parse::<OptionType>().unwrap(), OptionType::Put);
    }
}
