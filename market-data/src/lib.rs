//! Market data collaborator.
//!
//! Fetches OHLCV history and spot prices from the Yahoo Finance chart API.
//! Fetch failures are the caller's policy: the orchestration loop logs them
//! and skips the instrument for the cycle.

mod yahoo;

pub use yahoo::YahooFinanceClient;

use anyhow::Result;
use common::PriceSeries;

/// Source of price history and latest quotes.
///
/// Behind a trait so the signal engine and ledger can be driven from canned
/// series in tests.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch an OHLCV series, e.g. `range` "5d" at `interval` "5m".
    async fn fetch_series(&self, ticker: &str, range: &str, interval: &str)
        -> Result<PriceSeries>;

    /// Fetch the most recent traded price.
    async fn fetch_latest_price(&self, ticker: &str) -> Result<f64>;
}
