//! Display formatting for currency amounts.

use rust_decimal::{Decimal, RoundingStrategy};

use super::decimal_from_f64;

/// Formats an amount with two decimals and thousands separators.
/// A missing value renders as zero.
pub fn format_currency(value: Option<Decimal>, symbol: &str) -> String {
    let amount = value
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = amount.is_sign_negative() && !amount.is_zero();
    let formatted = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{}{}{}.{}",
        if negative { "-" } else { "" },
        symbol,
        grouped,
        frac_part
    )
}

/// Same as [`format_currency`] for raw floats; NaN and infinities render as zero.
pub fn format_currency_f64(value: f64, symbol: &str) -> String {
    format_currency(decimal_from_f64(value), symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(Some(dec!(1234567.891)), "€"), "€1,234,567.89");
        assert_eq!(format_currency(Some(dec!(999)), "$"), "$999.00");
        assert_eq!(format_currency(Some(dec!(-1500.5)), "€"), "-€1,500.50");
    }

    #[test]
    fn test_format_currency_missing_is_zero() {
        assert_eq!(format_currency(None, "€"), "€0.00");
        assert_eq!(format_currency_f64(f64::NAN, "€"), "€0.00");
        assert_eq!(format_currency_f64(f64::NEG_INFINITY, "€"), "€0.00");
    }

    #[test]
    fn test_format_currency_negative_rounding_to_zero() {
        assert_eq!(format_currency(Some(dec!(-0.001)), "€"), "€0.00");
    }
}
