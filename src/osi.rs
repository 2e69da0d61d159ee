//! The OCC (OSI) option contract symbol format.
//!
//! Symbols must have correctly padded roots, i.e. `"TSLA  250815C00100000"`,
//! not `"TSLA250815C00100000"`.

use std::{
    fmt::{self, Display, Formatter},
    os::raw::c_char,
};

use crate::record::c_chars_to_str;

/// The exact length of an OSI symbol in bytes.
pub const OSI_SYMBOL_LEN: usize = 21;

const ROOT_CSTR_LEN: usize = 7;

/// A decoded OSI option contract symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OsiSymbol {
    /// The root symbol with the space padding trimmed (bytes 0 through 5).
    pub root: [c_char; ROOT_CSTR_LEN],
    /// The expiration year since 2000 (bytes 6 through 7).
    pub exp_year: u8,
    /// The expiration month, 1-12 (bytes 8 through 9).
    pub exp_month: u8,
    /// The expiration day, 1-31 (bytes 10 through 11).
    pub exp_day: u8,
    /// Call or put (byte 12).
    pub is_call: bool,
    /// The strike price in nanodollars (bytes 13 through 20).
    pub strike: u64,
}

/// Folds ASCII digits into an unsigned decimal, stopping at the first
/// non-digit, like `strtol`. Leading whitespace is skipped; anything else
/// yields whatever was folded so far.
fn lax_decimal(bytes: &[u8]) -> u64 {
    let mut res = 0;
    let mut iter = bytes.iter().skip_while(|b| b.is_ascii_whitespace());
    for byte in &mut iter {
        if !byte.is_ascii_digit() {
            break;
        }
        res = res * 10 + u64::from(byte - b'0');
    }
    res
}

impl OsiSymbol {
    /// Parses an OSI option contract symbol. `symbol` must be exactly 21
    /// ASCII characters. The trailing run of padding spaces is trimmed off
    /// the root.
    ///
    /// Digit groups are parsed laxly: a non-digit byte terminates the group
    /// and the field keeps the digits folded up to that point.
    ///
    /// # Errors
    /// This function returns an error if `symbol` is not exactly 21 bytes
    /// long.
    pub fn parse(symbol: &str) -> crate::Result<Self> {
        let bytes = symbol.as_bytes();
        if bytes.len() != OSI_SYMBOL_LEN {
            return Err(crate::Error::conversion::<Self>(symbol.to_owned()));
        }

        let mut root = [0; ROOT_CSTR_LEN];
        let root_len = bytes[..6]
            .iter()
            .rposition(|byte| *byte != b' ')
            .map_or(0, |last| last + 1);
        for (i, byte) in bytes[..root_len].iter().enumerate() {
            root[i] = *byte as c_char;
        }

        Ok(Self {
            root,
            exp_year: lax_decimal(&bytes[6..8]) as u8,
            exp_month: lax_decimal(&bytes[8..10]) as u8,
            exp_day: lax_decimal(&bytes[10..12]) as u8,
            is_call: bytes[12] == b'C',
            strike: 1_000_000 * lax_decimal(&bytes[13..21]),
        })
    }

    /// Returns the root symbol as a `&str`, e.g. `"MSFT"` or `"SPY"`.
    ///
    /// # Errors
    /// This function returns an error if `root` contains invalid UTF-8.
    pub fn root(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.root)
    }

    /// Returns the expiration as a calendar date, or `None` if the
    /// expiration fields don't form a valid date.
    pub fn expiration_date(&self) -> Option<time::Date> {
        let month = time::Month::try_from(self.exp_month).ok()?;
        time::Date::from_calendar_date(2000 + i32::from(self.exp_year), month, self.exp_day).ok()
    }
}

impl Display for OsiSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6}{:02}{:02}{:02}{}{:08}",
            self.root().map_err(|_| fmt::Error)?,
            self.exp_year,
            self.exp_month,
            self.exp_day,
            if self.is_call { 'C' } else { 'P' },
            self.strike / 1_000_000,
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn parse_call() {
        let osi = OsiSymbol::parse("TSLA  250815C00100000").unwrap();
        assert_eq!(osi.root().unwrap(), "TSLA");
        assert_eq!(osi.exp_year, 25);
        assert_eq!(osi.exp_month, 8);
        assert_eq!(osi.exp_day, 15);
        assert!(osi.is_call);
        assert_eq!(osi.strike, 100_000_000_000);
    }

    #[test]
    fn parse_put() {
        let osi = OsiSymbol::parse("SPX   240920P04700500").unwrap();
        assert_eq!(osi.root().unwrap(), "SPX");
        assert!(!osi.is_call);
        assert_eq!(osi.strike, 4_700_500_000_000);
        assert_eq!(
            osi.expiration_date().unwrap(),
            time::macros::date!(2024 - 09 - 20)
        );
    }

    #[rstest]
    #[case::too_short("TSLA  250815C0010000")]
    #[case::too_long("TSLA  250815C001000000")]
    #[case::empty("")]
    fn parse_rejects_wrong_length(#[case] symbol: &str) {
        assert!(OsiSymbol::parse(symbol).is_err());
    }

    #[test]
    fn six_character_root() {
        let osi = OsiSymbol::parse("SPXW  251231P06000000").unwrap();
        assert_eq!(osi.root().unwrap(), "SPXW");
        let osi = OsiSymbol::parse("ABCDEF251231C06000000").unwrap();
        assert_eq!(osi.root().unwrap(), "ABCDEF");
    }

    #[test]
    fn only_the_trailing_space_run_is_trimmed() {
        let osi = OsiSymbol::parse("A B   250815C00100000").unwrap();
        assert_eq!(osi.root().unwrap(), "A B");
        assert_eq!(osi.to_string(), "A B   250815C00100000");
    }

    #[test]
    fn lax_digit_groups() {
        // A non-digit terminates the fold and the prefix value is kept.
        let osi = OsiSymbol::parse("TSLA  2X0815C001000Z0").unwrap();
        assert_eq!(osi.exp_year, 2);
        assert_eq!(osi.exp_month, 8);
        assert_eq!(osi.strike, 1_000 * 1_000_000);
        // Neither 'C' nor 'P' decodes as a put.
        let osi = OsiSymbol::parse("TSLA  250815X00100000").unwrap();
        assert!(!osi.is_call);
    }

    #[rstest]
    #[case("TSLA  250815C00100000")]
    #[case("A     010101P00000001")]
    #[case("ABCDEF991231C99999999")]
    fn round_trip(#[case] symbol: &str) {
        assert_eq!(OsiSymbol::parse(symbol).unwrap().to_string(), symbol);
    }
}
