//! Formatting of amounts for people

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a USD amount as `$12,345.68`
///
/// Rounds half away from zero to cents and groups thousands with commas.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

/// Format a coin amount without trailing zeros
pub fn format_coin(amount: Decimal) -> String {
    amount.normalize().to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case::zero("0", "$0.00")]
    #[case::under_a_thousand("999.5", "$999.50")]
    #[case::thousands("8999", "$8,999.00")]
    #[case::ten_thousands("19999", "$19,999.00")]
    #[case::millions("1234567.891", "$1,234,567.89")]
    #[case::half_cent_rounds_up("0.005", "$0.01")]
    #[case::negative("-1234.5", "-$1,234.50")]
    fn test_format_usd(#[case] amount: &str, #[case] expected: &str) {
        assert_eq!(format_usd(Decimal::from_str(amount).unwrap()), expected);
    }

    #[rstest]
    #[case("1.50000000", "1.5")]
    #[case("0.00015385", "0.00015385")]
    #[case("2", "2")]
    fn test_format_coin(#[case] amount: &str, #[case] expected: &str) {
        assert_eq!(format_coin(Decimal::from_str(amount).unwrap()), expected);
    }
}
