//! Yahoo Finance chart API client

use crate::MarketDataSource;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use common::{Candle, PriceSeries};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// HTTP client for `GET /v8/finance/chart/{ticker}`
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooFinanceClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (compatible; sentinel-bot)")
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_chart(&self, ticker: &str, range: &str, interval: &str) -> Result<PriceSeries> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .http
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await
            .with_context(|| format!("requesting chart for {ticker}"))?
            .error_for_status()
            .with_context(|| format!("chart request for {ticker} rejected"))?;

        let payload: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("decoding chart payload for {ticker}"))?;

        let series = series_from_chart(payload)?;
        debug!("fetched {} bars for {}", series.len(), ticker);
        Ok(series)
    }
}

#[async_trait::async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn fetch_series(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<PriceSeries> {
        self.fetch_chart(ticker, range, interval).await
    }

    async fn fetch_latest_price(&self, ticker: &str) -> Result<f64> {
        let series = self.fetch_chart(ticker, "1d", "1m").await?;
        series
            .last_close()
            .ok_or_else(|| anyhow!("no quotes returned for {ticker}"))
    }
}

/// Flatten the chart payload into a series, dropping bars with missing
/// fields (Yahoo pads intraday ranges with nulls).
fn series_from_chart(payload: ChartResponse) -> Result<PriceSeries> {
    if let Some(error) = payload.chart.error {
        return Err(anyhow!(
            "chart API error: {} ({})",
            error.description.unwrap_or_default(),
            error.code.unwrap_or_default()
        ));
    }

    let result = payload
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| anyhow!("chart API returned no result"))?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("chart API returned no quote block"))?;

    let mut series = PriceSeries::default();
    for (i, ts) in result.timestamp.iter().enumerate() {
        let bar = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = bar {
            let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)
                .ok_or_else(|| anyhow!("timestamp {ts} out of range"))?;
            series.push(Candle {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }
    Ok(series)
}
