//! Trade and price types
//!
//! `TradeRecord` is what lands in an account's transaction log. `Prices`,
//! `PricePoint` and `HistoryRange` describe what the price oracle supplies.

use super::currency::Coin;
use super::error::LedgerError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An executed buy, as stored in the account's transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// The coin that was bought
    pub coin: Coin,

    /// USD debited from the account
    pub usd_amount: Decimal,

    /// Coin credited to the account
    pub coin_amount: Decimal,

    /// Market price (USD per coin) the order was validated against
    pub price_usd: Decimal,

    pub executed_at: DateTime<Utc>,
}

/// Current USD prices for every tradeable coin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prices {
    pub btc: Decimal,
    pub eth: Decimal,
}

impl Prices {
    pub fn for_coin(&self, coin: Coin) -> Decimal {
        match coin {
            Coin::Btc => self.btc,
            Coin::Eth => self.eth,
        }
    }
}

/// One daily close in a price history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_usd: Decimal,
}

/// How far back a price history reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    Week,
    Month,
    Quarter,
    Year,
}

impl HistoryRange {
    /// Number of daily closes requested from the price source
    pub fn days(&self) -> u32 {
        match self {
            HistoryRange::Week => 7,
            HistoryRange::Month => 30,
            HistoryRange::Quarter => 90,
            HistoryRange::Year => 365,
        }
    }
}

impl FromStr for HistoryRange {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "1w" => Ok(HistoryRange::Week),
            "month" | "1m" => Ok(HistoryRange::Month),
            "quarter" | "3m" => Ok(HistoryRange::Quarter),
            "year" | "1y" => Ok(HistoryRange::Year),
            _ => Err(LedgerError::unknown_history_range(s)),
        }
    }
}
