use config::builder::{ConfigBuilder, DefaultState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Listing/detail page source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Monthly pricing-activity page; `{year}` and `{month}` are substituted.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Prefixed to relative filing links.
    #[serde(default = "default_site_root")]
    pub site_root: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between monthly listing fetches.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Pause before each company detail fetch.
    #[serde(default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,

    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Cookie header sent with every page request; `{referer}` is substituted.
    #[serde(default = "default_cookie_template")]
    pub cookie_template: String,
}

/// Market-data provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    #[serde(default = "default_chart_url")]
    pub chart_url: String,

    #[serde(default = "default_market_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_listing_url() -> String {
    "http://www.nasdaq.com/markets/ipos/activity.aspx?tab=pricings&month={year}-{month}".to_string()
}
fn default_site_root() -> String {
    "http://www.nasdaq.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_detail_delay_ms() -> u64 {
    500
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3153.0 Safari/537.36".to_string()
}
fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string()
}
fn default_accept_language() -> String {
    "en-US,en;q=0.8".to_string()
}
fn default_cookie_template() -> String {
    "userCookiePref=true; i10c.referrer={referer}".to_string()
}
fn default_chart_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_market_timeout_secs() -> u64 {
    15
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output.json")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            site_root: default_site_root(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            detail_delay_ms: default_detail_delay_ms(),
            max_retries: 0,
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            cookie_template: default_cookie_template(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chart_url: default_chart_url(),
            timeout_secs: default_market_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("IPO_MINER").separator("__"));

        Self::from_builder(builder)
    }

    /// Unreadable or ill-typed sources fall back to the defaults.
    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Self {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize::<AppConfig>())
            .unwrap_or_else(|e| {
                warn!("Unusable configuration ({}), falling back to defaults", e);
                AppConfig::default()
            })
    }
}
