//! Tolerant numeric handling for amounts coming from forms.
//!
//! Nothing here ever fails: anything that is not a finite, non-negative
//! number becomes zero.

use crate::Amount;

/// Clamps an amount into the ledger domain: NaN, infinities and negatives become 0.
pub fn coerce_amount(value: f64) -> Amount {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses a user-typed amount such as `"1,250,000"`.
///
/// Thousands separators and surrounding whitespace are ignored; anything
/// unparseable is 0.
pub fn parse_amount(input: &str) -> Amount {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().map(coerce_amount).unwrap_or(0.0)
}

/// Renders an amount rounded to a whole unit with `,` thousands separators.
pub fn format_amount(value: Amount) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(f64::NAN), 0.0);
        assert_eq!(coerce_amount(f64::INFINITY), 0.0);
        assert_eq!(coerce_amount(-5.0), 0.0);
        assert_eq!(coerce_amount(1500.5), 1500.5);
    }

    #[test]
    fn test_parse_amount_strips_separators() {
        assert_eq!(parse_amount("1,250,000"), 1_250_000.0);
        assert_eq!(parse_amount("  42 "), 42.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-300"), 0.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
        assert_eq!(format_amount(-70_000.0), "-70,000");
    }
}
