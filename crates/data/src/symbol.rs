//! Vendor option symbol parsing.
//!
//! Symbols are split on single spaces with empty tokens preserved, so padded
//! OCC roots such as `SPX   240119C04800000` put the contract details at
//! token 3 while `SPX 20240119C4800000` puts them at token 1. The details
//! token is `<date><C|P><strike x 1000>`.

use chrono::NaiveDate;
use expiry_trade_core::{OptionType, SymbolLayout};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::DataError;

/// Contract terms extracted from a vendor symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub expiration_date: NaiveDate,
    pub option_type: OptionType,
    pub strike_price: Decimal,
}

/// Parses `symbol` according to `layout`, reading the details from `token`.
///
/// # Errors
///
/// Returns `DataError::MalformedSymbol` if the token is missing, or if the
/// date, right, or strike portion cannot be parsed.
pub fn parse_symbol(
    symbol: &str,
    layout: SymbolLayout,
    token: usize,
) -> Result<ParsedSymbol, DataError> {
    let details = symbol
        .split(' ')
        .nth(token)
        .ok_or_else(|| DataError::malformed(symbol, format!("no token at index {token}")))?;

    let width = layout.date_width();
    if !details.is_char_boundary(width) || details.len() < width + 2 {
        return Err(DataError::malformed(symbol, format!("token '{details}' too short")));
    }

    let (date_part, rest) = details.split_at(width);
    let expiration_date = NaiveDate::parse_from_str(date_part, layout.date_format())
        .map_err(|e| DataError::malformed(symbol, format!("bad expiration '{date_part}': {e}")))?;

    let mut chars = rest.chars();
    let right = chars.next().unwrap_or_default();
    let option_type = OptionType::from_code(right)
        .ok_or_else(|| DataError::malformed(symbol, format!("bad option type '{right}'")))?;

    let strike_part = chars.as_str();
    let strike_milli = Decimal::from_str(strike_part)
        .map_err(|e| DataError::malformed(symbol, format!("bad strike '{strike_part}': {e}")))?;
    if strike_milli.is_sign_negative() {
        return Err(DataError::malformed(symbol, "negative strike"));
    }

    Ok(ParsedSymbol {
        expiration_date,
        option_type,
        strike_price: strike_milli / Decimal::ONE_THOUSAND,
    })
}
