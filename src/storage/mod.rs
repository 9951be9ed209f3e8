//! JSON output file: the accumulated record set, rewritten in full after
//! every month so an interrupted run keeps every completed month.

use crate::models::EnrichedRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previously persisted records, or an empty set if the file is missing
    /// or unreadable.
    pub fn load(&self) -> Vec<EnrichedRecord> {
        match self.try_load() {
            Ok(records) => {
                info!("Resuming from {:?} with {} records", self.path, records.len());
                records
            }
            Err(e) => {
                debug!("Starting with an empty set: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces the failure.
    pub fn try_load(&self) -> Result<Vec<EnrichedRecord>> {
        let bytes = fs::read(&self.path).with_context(|| format!("read {:?}", self.path))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse {:?}", self.path))
    }

    /// Replace the output file with `records`. Writes a sibling temp file and
    /// renames it over the target, so readers never see a half-written file.
    pub fn save(&self, records: &[EnrichedRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }

        let bytes = serde_json::to_vec(records).context("serialise records")?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &bytes).with_context(|| format!("write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {:?} with {:?}", self.path, tmp))?;

        debug!("Wrote {} records ({} bytes) to {:?}", records.len(), bytes.len(), self.path);
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
pub struct OutputSummary {
    pub records: usize,
    pub with_profile: usize,
    pub with_trade_data: usize,
    pub positive_first_day: usize,
    pub mean_ipo_change_pct: Option<f64>,
}

pub fn summarize(records: &[EnrichedRecord]) -> OutputSummary {
    let changes: Vec<f64> = records.iter().filter_map(|r| r.first_day_ipo_change_pct).collect();
    OutputSummary {
        records: records.len(),
        with_profile: records.iter().filter(|r| r.ipo_data.is_some()).count(),
        with_trade_data: records.iter().filter(|r| !r.trade_data.is_empty()).count(),
        positive_first_day: records
            .iter()
            .filter(|r| r.first_day_market_positive == Some(true))
            .count(),
        mean_ipo_change_pct: if changes.is_empty() {
            None
        } else {
            Some(changes.iter().sum::<f64>() / changes.len() as f64)
        },
    }
}

// ── CSV export ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    company: &'a str,
    symbol: &'a str,
    market: &'a str,
    date: &'a str,
    price: &'a str,
    price_num: Option<f64>,
    shares: &'a str,
    amount: &'a str,
    first_day_open: Option<f64>,
    first_day_close: Option<f64>,
    first_day_market_change_pct: Option<f64>,
    first_day_ipo_change_pct: Option<f64>,
    first_day_market_positive: Option<bool>,
    news_headlines_count: usize,
    experts: usize,
    revenue: &'a str,
    net_income: &'a str,
    company_url: &'a str,
}

impl<'a> From<&'a EnrichedRecord> for CsvRow<'a> {
    fn from(r: &'a EnrichedRecord) -> Self {
        let profile = r.ipo_data.as_ref();
        let m = r.metrics();
        Self {
            company: &r.listing.company,
            symbol: &r.listing.symbol,
            market: &r.listing.market,
            date: &r.listing.date,
            price: &r.listing.price,
            price_num: r.listing.price_num,
            shares: &r.listing.shares,
            amount: &r.listing.amount,
            first_day_open: m.open,
            first_day_close: m.close,
            first_day_market_change_pct: m.market_change_pct,
            first_day_ipo_change_pct: m.ipo_change_pct,
            first_day_market_positive: m.market_positive,
            news_headlines_count: profile.map(|p| p.news_headlines_count).unwrap_or(0),
            experts: profile.map(|p| p.experts.len()).unwrap_or(0),
            revenue: profile.map(|p| p.financials.revenue.as_str()).unwrap_or(""),
            net_income: profile.map(|p| p.financials.net_income.as_str()).unwrap_or(""),
            company_url: &r.listing.company_url,
        }
    }
}

/// One CSV line per record with the headline fields.
pub fn export_csv(records: &[EnrichedRecord], path: &Path) -> Result<usize> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {:?}", path))?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(records.len())
}
