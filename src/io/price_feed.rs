//! HTTP market-data adapter
//!
//! `HttpPriceOracle` implements [`PriceOracle`] against a public price API.
//! Two endpoints are used:
//!
//! - `{base}/data/pricemulti?fsyms=BTC,ETH&tsyms=USD` for current prices,
//!   answering `{"BTC":{"USD":6512.3},"ETH":{"USD":251.7}}`
//! - `{base}/data/v2/histoday?fsym=BTC&tsym=USD&limit=29` for daily closes,
//!   answering `{"Data":{"Data":[{"time":1700000000,"close":6512.3}, ...]}}`
//!
//! Response bodies are decoded by pure functions so they can be tested
//! against fixture JSON without a network.

use crate::core::traits::PriceOracle;
use crate::types::{Coin, HistoryRange, LedgerError, PricePoint, Prices};
use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub struct HttpPriceOracle {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPriceOracle {
    /// Build an oracle whose requests give up after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, url: &str) -> Result<String, LedgerError> {
        debug!(%url, "requesting prices");
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn current_prices(&self) -> Result<Prices, LedgerError> {
        let url = format!("{}/data/pricemulti?fsyms=BTC,ETH&tsyms=USD", self.base_url);
        let body = self.get_text(&url).await?;
        parse_current_prices(&body)
    }

    async fn historical_prices(
        &self,
        coin: Coin,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, LedgerError> {
        let url = format!(
            "{}/data/v2/histoday?fsym={}&tsym=USD&limit={}",
            self.base_url,
            coin.symbol(),
            histoday_limit(range)
        );
        let body = self.get_text(&url).await?;
        parse_history(&body)
    }
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    #[serde(rename = "USD")]
    usd: Decimal,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "Data")]
    data: HistoryData,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(rename = "Data")]
    data: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    time: i64,
    close: Decimal,
}

/// Decode a `pricemulti` response body
///
/// # Errors
///
/// Returns `PriceFetchError` if the body is not the expected shape, a coin is
/// missing, or a price is not positive.
pub fn parse_current_prices(body: &str) -> Result<Prices, LedgerError> {
    let quotes: HashMap<String, UsdQuote> = serde_json::from_str(body)
        .map_err(|e| LedgerError::price_fetch(format!("malformed price response: {}", e)))?;

    let price_of = |coin: Coin| -> Result<Decimal, LedgerError> {
        let price = quotes
            .get(coin.symbol())
            .map(|quote| quote.usd)
            .ok_or_else(|| LedgerError::price_fetch(format!("no price for {}", coin)))?;
        positive(coin, price)
    };

    Ok(Prices {
        btc: price_of(Coin::Btc)?,
        eth: price_of(Coin::Eth)?,
    })
}

/// `histoday` returns `limit + 1` points, today's included
pub fn histoday_limit(range: HistoryRange) -> u32 {
    range.days().saturating_sub(1)
}

/// Decode a `histoday` response body into points ordered by date
pub fn parse_history(body: &str) -> Result<Vec<PricePoint>, LedgerError> {
    let response: HistoryResponse = serde_json::from_str(body)
        .map_err(|e| LedgerError::price_fetch(format!("malformed history response: {}", e)))?;

    let mut points = response
        .data
        .data
        .into_iter()
        .map(|entry| {
            let date = DateTime::from_timestamp(entry.time, 0)
                .ok_or_else(|| {
                    LedgerError::price_fetch(format!("invalid timestamp {}", entry.time))
                })?
                .date_naive();
            Ok(PricePoint {
                date,
                close_usd: entry.close,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    points.sort_by_key(|point| point.date);
    Ok(points)
}

fn positive(coin: Coin, price: Decimal) -> Result<Decimal, LedgerError> {
    if price <= Decimal::ZERO {
        return Err(LedgerError::price_fetch(format!(
            "non-positive price {} for {}",
            price, coin
        )));
    }
    Ok(price)
}
