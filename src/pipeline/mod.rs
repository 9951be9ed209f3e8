//! Pipeline orchestrator: listing pages → company pages + market data → output file.
//!
//! Months are mined newest first, one at a time. Within a month every row is
//! assembled in listing order: company page, then first-day market data.
//! After each month the identity is rotated, the run pauses, and the whole
//! accumulated set is written out, so killing the process loses at most the
//! month in flight. Records already present in the output file are not
//! mined again.

use crate::config::{AppConfig, ScraperConfig};
use crate::extract::{listing_rows_from_markup, profile_from_markup};
use crate::harvest::identity::{OutboundIdentity, polite_pause};
use crate::harvest::{NasdaqSource, PageSource};
use crate::market::{self, TimeSeriesProvider, YahooChartProvider};
use crate::models::{EnrichedRecord, ListingRow};
use crate::storage::RecordStore;
use crate::utils::months_descending;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("from date {from} is after to date {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

pub struct Pipeline {
    config: ScraperConfig,
    source: Arc<dyn PageSource>,
    market: Arc<dyn TimeSeriesProvider>,
    store: RecordStore,
}

impl Pipeline {
    pub fn new(
        config: ScraperConfig,
        source: Arc<dyn PageSource>,
        market: Arc<dyn TimeSeriesProvider>,
        store: RecordStore,
    ) -> Self {
        Self {
            config,
            source,
            market,
            store,
        }
    }

    /// NASDAQ listing pages and Yahoo market data, writing to `output`.
    pub fn from_config(config: &AppConfig, output: &Path) -> Result<Self> {
        let source = NasdaqSource::new(&config.scraper).context("Failed to build page source")?;
        let market =
            YahooChartProvider::new(&config.market).context("Failed to build market provider")?;
        Ok(Self::new(
            config.scraper.clone(),
            Arc::new(source),
            Arc::new(market),
            RecordStore::new(output),
        ))
    }

    pub async fn run(&self, from: NaiveDate, to: NaiveDate) -> Result<PipelineStats> {
        if from > to {
            warn!("From date {} is after to date {} - cancelling", from, to);
            return Err(PipelineError::InvalidRange { from, to }.into());
        }

        info!("Mining to {:?}", self.store.path());
        let mut records = self.store.load();
        let mut seen: HashSet<_> = records.iter().map(|r| r.listing.dedup_key()).collect();

        let months = months_descending(from, to);
        info!("{} months to mine ({} .. {})", months.len(), to, from);

        let mut identity = OutboundIdentity::initial(&self.config);
        let mut stats = PipelineStats::default();

        for month in months {
            let url = self.source.listing_url(month);
            info!("Mining {} - {}", month.format("%Y-%m"), url);

            let rows = self.listing_rows(month, &url, &identity).await;
            stats.months_visited += 1;
            stats.rows_seen += rows.len();

            let mut mined = 0usize;
            for (i, row) in rows.into_iter().enumerate() {
                if !seen.insert(row.dedup_key()) {
                    debug!("Row #{} {} already mined - skipping", i, row.company);
                    stats.duplicates_skipped += 1;
                    continue;
                }
                records.push(self.assemble(i, row, &identity, &mut stats).await);
                mined += 1;
            }
            stats.records_appended += mined;
            info!("Mined {} new records for {}", mined, month.format("%Y-%m"));

            identity = identity.rotated(&url);
            polite_pause(self.config.request_delay_ms, self.config.jitter_ms).await;
            self.store
                .save(&records)
                .with_context(|| format!("Checkpoint after {} failed", month.format("%Y-%m")))?;
        }

        stats.total_records = records.len();
        info!(
            "Done - {} new records, {} total in {:?}",
            stats.records_appended,
            stats.total_records,
            self.store.path()
        );
        Ok(stats)
    }

    /// Rows of one month's listing page; any failure means an empty month.
    async fn listing_rows(
        &self,
        month: NaiveDate,
        url: &str,
        identity: &OutboundIdentity,
    ) -> Vec<ListingRow> {
        let body = match self.source.fetch_listing(month, identity).await {
            Ok(body) => body,
            Err(e) => {
                warn!("{:#} - skipping {}", e, url);
                return Vec::new();
            }
        };

        match listing_rows_from_markup(&body) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Nothing found for {} ({}) - skipping", url, e);
                Vec::new()
            }
        }
    }

    /// Company profile and first-day market data for one row. Either half may
    /// come back empty; the record is always produced.
    async fn assemble(
        &self,
        i: usize,
        row: ListingRow,
        identity: &OutboundIdentity,
        stats: &mut PipelineStats,
    ) -> EnrichedRecord {
        info!("Mining row #{} - {} ({})", i, row.company, row.symbol);

        polite_pause(self.config.detail_delay_ms, 0).await;
        let ipo_data = match self.source.fetch_detail(&row.company_url, identity).await {
            Ok(body) => Some(profile_from_markup(&body, &self.config.site_root)),
            Err(e) => {
                warn!("No company data for #{} {}: {:#}", i, row.company, e);
                stats.detail_failures += 1;
                None
            }
        };

        let enrichment =
            market::enrich(self.market.as_ref(), &row.symbol, &row.date, row.price_num).await;
        if enrichment.metrics.open.is_none() {
            stats.market_failures += 1;
        }

        EnrichedRecord::new(row, ipo_data, enrichment.trade_data, enrichment.metrics)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub months_visited: usize,
    pub rows_seen: usize,
    pub records_appended: usize,
    pub duplicates_skipped: usize,
    pub detail_failures: usize,
    pub market_failures: usize,
    pub total_records: usize,
}
