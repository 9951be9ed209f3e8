//! First-trading-day enrichment from an external daily time series.

pub mod yahoo;

use crate::harvest::cleaner::parse_date;
use crate::models::{FirstDayMetrics, TradeData, TradingDay};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

pub use self::yahoo::YahooChartProvider;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("unparseable pricing date {0:?}")]
    BadDate(String),

    #[error("market data request failed: {0}")]
    Fetch(String),

    #[error("provider error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("no trading days returned for {0}")]
    EmptySeries(String),

    #[error("first trading day for {0} lacks open or close")]
    MissingQuote(String),

    #[error("first-day open for {0} is zero")]
    ZeroOpen(String),

    #[error("offer price missing or zero")]
    NoOfferPrice,
}

/// Daily bars for a symbol over `[start, end)`.
#[async_trait]
pub trait TimeSeriesProvider: Send + Sync {
    async fn daily_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradingDay>, MarketError>;
}

/// Outcome of the market lookup for one listing row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketEnrichment {
    pub trade_data: TradeData,
    pub metrics: FirstDayMetrics,
}

/// Look up the first trading day and derive performance against the open and
/// against the offer price. Every failure maps to the empty enrichment.
pub async fn enrich(
    provider: &dyn TimeSeriesProvider,
    symbol: &str,
    pricing_date: &str,
    offer_price: Option<f64>,
) -> MarketEnrichment {
    match try_enrich(provider, symbol, pricing_date, offer_price).await {
        Ok(enrichment) => enrichment,
        Err(e) => {
            warn!("{}: no first-day metrics ({})", symbol, e);
            MarketEnrichment::default()
        }
    }
}

async fn try_enrich(
    provider: &dyn TimeSeriesProvider,
    symbol: &str,
    pricing_date: &str,
    offer_price: Option<f64>,
) -> Result<MarketEnrichment, MarketError> {
    let start = parse_date(pricing_date).ok_or_else(|| MarketError::BadDate(pricing_date.to_string()))?;
    let end = start
        .checked_add_days(Days::new(1))
        .ok_or_else(|| MarketError::BadDate(pricing_date.to_string()))?;

    debug!("{}: requesting series {} .. {}", symbol, start, end);
    let days = provider.daily_series(symbol, start, end).await?;
    let metrics = first_day_metrics(symbol, &days, offer_price)?;

    Ok(MarketEnrichment {
        trade_data: TradeData::from_days(&days),
        metrics,
    })
}

/// Derive first-day metrics from the first bar of `days`.
pub fn first_day_metrics(
    symbol: &str,
    days: &[TradingDay],
    offer_price: Option<f64>,
) -> Result<FirstDayMetrics, MarketError> {
    let first = days.first().ok_or_else(|| MarketError::EmptySeries(symbol.to_string()))?;
    let (open, close) = match (first.open, first.close) {
        (Some(o), Some(c)) if o.is_finite() && c.is_finite() => (o, c),
        _ => return Err(MarketError::MissingQuote(symbol.to_string())),
    };
    if open.abs() < f64::EPSILON {
        return Err(MarketError::ZeroOpen(symbol.to_string()));
    }
    let offer = offer_price
        .filter(|p| p.abs() >= f64::EPSILON)
        .ok_or(MarketError::NoOfferPrice)?;

    let market_change_pct = (close - open) / open * 100.0;
    let ipo_change_pct = (close - offer) / offer * 100.0;

    Ok(FirstDayMetrics {
        open: Some(open),
        close: Some(close),
        market_change_pct: Some(market_change_pct),
        ipo_change_pct: Some(ipo_change_pct),
        market_positive: Some(market_change_pct > 0.0),
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeProvider, day};
    use super::*;

    #[test]
    fn computes_changes_against_open_and_offer() {
        let m = first_day_metrics("ACME", &[day(2017, 7, 14, 15.0, 18.0)], Some(12.0)).unwrap();
        assert_eq!(m.open, Some(15.0));
        assert_eq!(m.close, Some(18.0));
        assert!((m.market_change_pct.unwrap() - 20.0).abs() < 1e-9);
        assert!((m.ipo_change_pct.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(m.market_positive, Some(true));
    }

    #[test]
    fn flat_first_day_is_not_positive() {
        let m = first_day_metrics("ACME", &[day(2017, 7, 14, 10.0, 10.0)], Some(10.0)).unwrap();
        assert_eq!(m.market_positive, Some(false));
        assert_eq!(m.ipo_change_pct, Some(0.0));
    }

    #[test]
    fn degenerate_series_are_errors() {
        assert!(matches!(
            first_day_metrics("X", &[], Some(1.0)),
            Err(MarketError::EmptySeries(_))
        ));
        assert!(matches!(
            first_day_metrics("X", &[day(2017, 1, 3, 0.0, 1.0)], Some(1.0)),
            Err(MarketError::ZeroOpen(_))
        ));
        assert!(matches!(
            first_day_metrics("X", &[day(2017, 1, 3, 1.0, 1.0)], None),
            Err(MarketError::NoOfferPrice)
        ));
        let mut no_close = day(2017, 1, 3, 1.0, 1.0);
        no_close.close = None;
        assert!(matches!(
            first_day_metrics("X", &[no_close], Some(1.0)),
            Err(MarketError::MissingQuote(_))
        ));
    }

    #[tokio::test]
    async fn requests_one_day_window_from_pricing_date() {
        let provider = FakeProvider::default().with("ACME", vec![day(2017, 7, 14, 15.0, 18.0)]);
        let out = enrich(&provider, "ACME", "7/14/2017", Some(12.0)).await;

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, NaiveDate::from_ymd_opt(2017, 7, 14).unwrap());
        assert_eq!(calls[0].2, NaiveDate::from_ymd_opt(2017, 7, 15).unwrap());
        assert!(!out.trade_data.is_empty());
        assert_eq!(out.metrics.close, Some(18.0));
    }

    #[tokio::test]
    async fn any_failure_collapses_to_all_null() {
        let provider = FakeProvider::default();
        let out = enrich(&provider, "GONE", "7/14/2017", Some(12.0)).await;
        assert_eq!(out, MarketEnrichment::default());

        let out = enrich(&provider, "GONE", "not a date", Some(12.0)).await;
        assert_eq!(out, MarketEnrichment::default());
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }
}
