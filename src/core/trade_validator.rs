//! Buy-order admission checks
//!
//! `TradeValidator` decides whether a proposed buy may execute. It is pure:
//! the engine hands it the order, the live price and the user's USD balance,
//! and gets back every rule the order breaks.
//!
//! # Rules
//!
//! Each rule is evaluated on its own, so one submission can fail several:
//!
//! 1. **Slippage** - `current_price / (usd_amount / coin_amount)` must lie in
//!    [0.995, 1.005], inclusive.
//! 2. **Input sanity** - both amounts non-negative, coin amount non-zero.
//! 3. **Funds** - `usd_amount` no larger than the USD balance.
//! 4. **Minimum** - `usd_amount` of at least $1.

use crate::types::Coin;
use rust_decimal::Decimal;

/// Lower bound of the accepted live/implied price ratio (0.995)
pub const MIN_PRICE_RATIO: Decimal = Decimal::from_parts(995, 0, 0, false, 3);

/// Upper bound of the accepted live/implied price ratio (1.005)
pub const MAX_PRICE_RATIO: Decimal = Decimal::from_parts(1005, 0, 0, false, 3);

/// Smallest purchase in USD
pub const MIN_PURCHASE_USD: Decimal = Decimal::ONE;

/// A buy order as submitted, paired with the state it is judged against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeProposal {
    pub coin: Coin,
    pub usd_amount: Decimal,
    pub coin_amount: Decimal,
    pub current_price_usd: Decimal,
    pub user_usd_balance: Decimal,
}

/// A rule a proposal breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeViolation {
    Slippage,
    InvalidInput,
    InsufficientFunds,
    BelowMinimum,
}

impl TradeViolation {
    /// Message shown to the user for this violation
    pub fn message(&self) -> &'static str {
        match self {
            TradeViolation::Slippage => {
                "The price has changed too much since your order was placed. Please try again."
            }
            TradeViolation::InvalidInput => "Amounts must be valid, non-negative numbers.",
            TradeViolation::InsufficientFunds => "Insufficient USD balance for this purchase.",
            TradeViolation::BelowMinimum => "Minimum purchase of $1 is required.",
        }
    }
}

pub struct TradeValidator;

impl TradeValidator {
    /// Evaluate every rule and return the ones that fail, in rule order
    ///
    /// An empty result means the proposal is admissible.
    pub fn validate(proposal: &TradeProposal) -> Vec<TradeViolation> {
        let mut violations = Vec::new();

        if !Self::price_within_tolerance(proposal) {
            violations.push(TradeViolation::Slippage);
        }
        if !Self::amounts_are_sane(proposal) {
            violations.push(TradeViolation::InvalidInput);
        }
        if proposal.usd_amount > proposal.user_usd_balance {
            violations.push(TradeViolation::InsufficientFunds);
        }
        if proposal.usd_amount < MIN_PURCHASE_USD {
            violations.push(TradeViolation::BelowMinimum);
        }

        violations
    }

    /// Messages for every failing rule
    pub fn violation_messages(proposal: &TradeProposal) -> Vec<String> {
        Self::validate(proposal)
            .iter()
            .map(|violation| violation.message().to_string())
            .collect()
    }

    /// Slippage rule
    ///
    /// A zero coin amount has no implied price; it is left to the input rule
    /// and does not count as slippage. A zero USD amount implies a zero price,
    /// which is always outside the band.
    fn price_within_tolerance(proposal: &TradeProposal) -> bool {
        if proposal.coin_amount.is_zero() {
            return true;
        }
        if proposal.usd_amount <= Decimal::ZERO {
            return false;
        }

        // current / (usd / coin) == current * coin / usd
        let ratio = proposal
            .current_price_usd
            .checked_mul(proposal.coin_amount)
            .and_then(|scaled| scaled.checked_div(proposal.usd_amount));

        match ratio {
            Some(ratio) => (MIN_PRICE_RATIO..=MAX_PRICE_RATIO).contains(&ratio),
            None => false,
        }
    }

    fn amounts_are_sane(proposal: &TradeProposal) -> bool {
        proposal.usd_amount >= Decimal::ZERO
            && proposal.coin_amount >= Decimal::ZERO
            && !proposal.coin_amount.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn proposal(usd: &str, coin: &str, price: &str, balance: &str) -> TradeProposal {
        TradeProposal {
            coin: Coin::Btc,
            usd_amount: dec(usd),
            coin_amount: dec(coin),
            current_price_usd: dec(price),
            user_usd_balance: dec(balance),
        }
    }

    #[test]
    fn test_ratio_constants() {
        assert_eq!(MIN_PRICE_RATIO, dec("0.995"));
        assert_eq!(MAX_PRICE_RATIO, dec("1.005"));
    }

    #[test]
    fn test_valid_proposal_passes() {
        let p = proposal("6500", "1", "6500", "10000");
        assert!(TradeValidator::validate(&p).is_empty());
    }

    #[rstest]
    #[case::lower_boundary("1000", "1", "995")]
    #[case::upper_boundary("1000", "1", "1005")]
    #[case::fractional_coin_lower("500", "0.5", "995")]
    #[case::fractional_coin_upper("250", "0.25", "1005")]
    fn test_slippage_boundaries_are_inclusive(
        #[case] usd: &str,
        #[case] coin: &str,
        #[case] price: &str,
    ) {
        let p = proposal(usd, coin, price, "100000");
        assert!(TradeValidator::validate(&p).is_empty());
    }

    #[rstest]
    #[case::just_below("1000", "1", "994.99")]
    #[case::just_above("1000", "1", "1005.01")]
    #[case::far_off("1000", "1", "2000")]
    fn test_slippage_outside_band_is_rejected(
        #[case] usd: &str,
        #[case] coin: &str,
        #[case] price: &str,
    ) {
        let p = proposal(usd, coin, price, "100000");
        assert_eq!(
            TradeValidator::validate(&p),
            vec![TradeViolation::Slippage]
        );
    }

    #[test]
    fn test_below_minimum_is_rejected_even_when_otherwise_valid() {
        let p = proposal("0.5", "0.0001", "5000", "10000");
        assert_eq!(
            TradeValidator::violation_messages(&p),
            vec!["Minimum purchase of $1 is required.".to_string()]
        );
    }

    #[test]
    fn test_insufficient_funds() {
        let p = proposal("150", "1", "150", "100");
        assert_eq!(
            TradeValidator::validate(&p),
            vec![TradeViolation::InsufficientFunds]
        );
    }

    #[test]
    fn test_zero_coin_amount_is_invalid_input_not_slippage() {
        let p = proposal("100", "0", "6500", "1000");
        assert_eq!(
            TradeValidator::validate(&p),
            vec![TradeViolation::InvalidInput]
        );
    }

    #[test]
    fn test_negative_amounts_are_invalid_input() {
        let p = proposal("-100", "-1", "100", "1000");
        let violations = TradeValidator::validate(&p);

        assert!(violations.contains(&TradeViolation::InvalidInput));
        assert!(violations.contains(&TradeViolation::BelowMinimum));
    }

    #[test]
    fn test_all_failures_are_collected() {
        // Off-price, over balance and under the minimum at once
        let p = proposal("0.5", "1", "6500", "0.25");
        assert_eq!(
            TradeValidator::validate(&p),
            vec![
                TradeViolation::Slippage,
                TradeViolation::InsufficientFunds,
                TradeViolation::BelowMinimum,
            ]
        );
    }

    #[test]
    fn test_zero_usd_amount_fails_slippage_and_minimum() {
        let p = proposal("0", "1", "6500", "1000");
        assert_eq!(
            TradeValidator::validate(&p),
            vec![TradeViolation::Slippage, TradeViolation::BelowMinimum]
        );
    }
}
