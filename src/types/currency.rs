//! Currency and tradeable coin types
//!
//! Every account holds exactly three balances, keyed by [`Currency`]. Only the
//! non-USD currencies can be bought, which is what [`Coin`] models.

use super::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A balance denomination held by every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Btc,
    Eth,
    Usd,
}

impl Currency {
    /// All denominations, in the order balances are displayed
    pub const ALL: [Currency; 3] = [Currency::Btc, Currency::Eth, Currency::Usd];

    /// Ticker symbol as used in the account store and the price feed
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A coin that can be purchased with USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Coin {
    Btc,
    Eth,
}

impl Coin {
    pub const ALL: [Coin; 2] = [Coin::Btc, Coin::Eth];

    /// The balance this coin is credited to
    pub fn currency(&self) -> Currency {
        match self {
            Coin::Btc => Currency::Btc,
            Coin::Eth => Currency::Eth,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.currency().symbol()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Coin {
    type Err = LedgerError;

    /// Parse a coin symbol case-insensitively (`btc`, `ETH`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTC" => Ok(Coin::Btc),
            "ETH" => Ok(Coin::Eth),
            _ => Err(LedgerError::unknown_coin(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lower("btc", Coin::Btc)]
    #[case::upper("ETH", Coin::Eth)]
    #[case::mixed_padded(" Eth ", Coin::Eth)]
    fn test_coin_parsing(#[case] input: &str, #[case] expected: Coin) {
        assert_eq!(input.parse::<Coin>().unwrap(), expected);
    }

    #[rstest]
    #[case::usd("usd")]
    #[case::empty("")]
    #[case::unknown("doge")]
    fn test_coin_parsing_rejects(#[case] input: &str) {
        let err = input.parse::<Coin>().unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCoin { .. }));
    }

    #[test]
    fn test_currency_serializes_as_symbol() {
        let json = serde_json::to_string(&Currency::Usd).unwrap();
        assert_eq!(json, "\"USD\"");
        let parsed: Currency = serde_json::from_str("\"BTC\"").unwrap();
        assert_eq!(parsed, Currency::Btc);
    }

    #[test]
    fn test_coin_maps_to_currency() {
        assert_eq!(Coin::Btc.currency(), Currency::Btc);
        assert_eq!(Coin::Eth.currency(), Currency::Eth);
        assert_eq!(Coin::Eth.to_string(), "ETH");
    }
}
