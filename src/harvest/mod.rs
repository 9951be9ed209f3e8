pub mod cleaner;
pub mod http_client;
pub mod identity;

use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use self::http_client::HttpClient;
use self::identity::OutboundIdentity;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Where listing and company pages come from. Implementations return raw
/// markup; parsing happens in `extract`.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// URL of the pricing-activity page for the month containing `month`.
    fn listing_url(&self, month: NaiveDate) -> String;

    async fn fetch_listing(&self, month: NaiveDate, identity: &OutboundIdentity) -> Result<String>;

    async fn fetch_detail(&self, url: &str, identity: &OutboundIdentity) -> Result<String>;
}

// ── NASDAQ IPO calendar ───────────────────────────────────────────────────────

pub struct NasdaqSource {
    client: HttpClient,
    listing_template: String,
}

impl NasdaqSource {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            listing_template: config.listing_url.clone(),
        })
    }
}

/// Fill `{year}` and zero-padded `{month}` into a listing URL template.
pub fn render_listing_url(template: &str, month: NaiveDate) -> String {
    template
        .replace("{year}", &month.year().to_string())
        .replace("{month}", &format!("{:02}", month.month()))
}

#[async_trait]
impl PageSource for NasdaqSource {
    fn listing_url(&self, month: NaiveDate) -> String {
        render_listing_url(&self.listing_template, month)
    }

    async fn fetch_listing(&self, month: NaiveDate, identity: &OutboundIdentity) -> Result<String> {
        let url = self.listing_url(month);
        debug!("Fetching listing page {}", url);
        self.client
            .get_text(&url, identity)
            .await
            .with_context(|| format!("Failed to fetch listing for {}", month.format("%Y-%m")))
    }

    async fn fetch_detail(&self, url: &str, identity: &OutboundIdentity) -> Result<String> {
        if url.trim().is_empty() {
            anyhow::bail!("Listing row has no company link");
        }
        debug!("Fetching company page {}", url);
        self.client
            .get_text(url, identity)
            .await
            .with_context(|| format!("Failed to fetch company page {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_pads_month() {
        let url = render_listing_url(
            "http://host/activity.aspx?tab=pricings&month={year}-{month}",
            NaiveDate::from_ymd_opt(2017, 3, 31).unwrap(),
        );
        assert_eq!(url, "http://host/activity.aspx?tab=pricings&month=2017-03");
    }

    #[tokio::test]
    async fn empty_company_link_is_a_fetch_failure() {
        let config = ScraperConfig::default();
        let source = NasdaqSource::new(&config).unwrap();
        let identity = OutboundIdentity::initial(&config);
        tokio_test::assert_err!(source.fetch_detail("  ", &identity).await);
    }
}
