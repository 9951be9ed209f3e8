use super::{MarketError, TimeSeriesProvider};
use crate::config::MarketConfig;
use crate::models::TradingDay;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Daily bars from the public Yahoo Finance chart endpoint.
pub struct YahooChartProvider {
    client: reqwest::Client,
    chart_url: String,
}

impl YahooChartProvider {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build market-data client")?;
        Ok(Self {
            client,
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
        })
    }

    fn series_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<url::Url, MarketError> {
        let period1 = unix_midnight(start).to_string();
        let period2 = unix_midnight(end).to_string();
        url::Url::parse_with_params(
            &format!("{}/{}", self.chart_url, symbol),
            &[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
            ],
        )
        .map_err(|e| MarketError::Fetch(format!("bad chart url for {}: {}", symbol, e)))
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[async_trait]
impl TimeSeriesProvider for YahooChartProvider {
    async fn daily_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradingDay>, MarketError> {
        let url = self.series_url(symbol, start, end)?;
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketError::Fetch(e.to_string()))?;
        let body = resp.text().await.map_err(|e| MarketError::Fetch(e.to_string()))?;

        parse_chart(symbol, &body)
    }
}

// ── Chart payload ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
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

/// Decode a chart response body into daily bars, oldest first.
pub fn parse_chart(symbol: &str, body: &str) -> Result<Vec<TradingDay>, MarketError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| MarketError::Fetch(format!("bad chart payload for {}: {}", symbol, e)))?;

    if let Some(err) = response.chart.error {
        return Err(MarketError::Provider {
            symbol: symbol.to_string(),
            message: err.description,
        });
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(MarketError::EmptySeries(symbol.to_string()));
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let days = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
            Some(TradingDay {
                date,
                open: at(&quote.open),
                high: at(&quote.high),
                low: at(&quote.low),
                close: at(&quote.close),
                volume: at(&quote.volume),
            })
        })
        .collect::<Vec<_>>();

    if days.is_empty() {
        return Err(MarketError::EmptySeries(symbol.to_string()));
    }
    Ok(days)
}
