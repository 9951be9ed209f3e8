use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Listing row ───────────────────────────────────────────────────────────────

/// One row of the monthly pricing-activity table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingRow {
    pub company: String,
    pub company_url: String,
    pub symbol: String,
    pub market: String,
    /// Offer price as printed, e.g. "$12.50".
    pub price: String,
    pub price_num: Option<f64>,
    pub shares: String,
    pub amount: String,
    /// Pricing date as printed.
    pub date: String,
}

impl ListingRow {
    /// Identity used to avoid appending the same IPO twice across resumed runs.
    pub fn dedup_key(&self) -> (String, String, String) {
        (self.company_url.clone(), self.symbol.clone(), self.date.clone())
    }
}

// ── Company profile (detail page) ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredProfile")]
pub struct CompanyProfile {
    /// Summary table, labels lower-cased.
    pub summary: BTreeMap<String, String>,
    pub description: String,
    pub use_of_proceeds: String,
    pub competitors_text: String,
    pub news_headlines: Vec<NewsItem>,
    pub news_headlines_count: usize,
    pub experts: Vec<ExpertEntry>,
    pub financials: FinancialsSummary,
}

/// On-disk shape of a profile. Older output files wrote summary labels
/// directly into `ipo_data` instead of under `summary`; those land in `loose`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct StoredProfile {
    summary: BTreeMap<String, String>,
    description: String,
    #[serde(alias = "use of proceeds")]
    use_of_proceeds: String,
    competitors_text: String,
    news_headlines: Vec<NewsItem>,
    news_headlines_count: usize,
    experts: Vec<ExpertEntry>,
    financials: FinancialsSummary,
    #[serde(flatten)]
    loose: BTreeMap<String, serde_json::Value>,
}

impl From<StoredProfile> for CompanyProfile {
    fn from(stored: StoredProfile) -> Self {
        let mut summary = stored.summary;
        for (label, value) in stored.loose {
            if let serde_json::Value::String(text) = value {
                summary.entry(label).or_insert(text);
            }
        }
        Self {
            summary,
            description: stored.description,
            use_of_proceeds: stored.use_of_proceeds,
            competitors_text: stored.competitors_text,
            news_headlines: stored.news_headlines,
            news_headlines_count: stored.news_headlines_count,
            experts: stored.experts,
            financials: stored.financials,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsItem {
    pub news_url: String,
    pub news_headline: String,
    pub news_source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExpertEntry {
    /// Role label, e.g. "Lead Underwriter".
    #[serde(rename = "type")]
    pub role: String,
    pub expert_name: String,
    pub expert_url: String,
}

/// Financial figures are kept as printed; the source mixes units and signs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinancialsSummary {
    pub revenue: String,
    pub net_income: String,
    pub total_assets: String,
    pub total_liabilities: String,
    pub stockholders_equity: String,
    pub filings: Vec<FilingEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilingEntry {
    pub form_type: String,
    pub date_received: String,
    pub url: String,
}

// ── Market data ───────────────────────────────────────────────────────────────

/// One daily bar as returned by the market-data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingDay {
    pub date: chrono::NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// Raw series payload, column → ISO date → value. Empty when enrichment failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TradeData(pub BTreeMap<String, BTreeMap<String, f64>>);

impl TradeData {
    pub fn from_days(days: &[TradingDay]) -> Self {
        let mut columns: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for day in days {
            let date = day.date.format("%Y-%m-%d").to_string();
            let fields = [
                ("Open", day.open),
                ("High", day.high),
                ("Low", day.low),
                ("Close", day.close),
                ("Volume", day.volume),
            ];
            for (column, value) in fields {
                // JSON has no NaN; drop non-finite points rather than write nulls
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    columns.entry(column.to_string()).or_default().insert(date.clone(), v);
                }
            }
        }
        Self(columns)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// First-trading-day performance. All fields are set together or all are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FirstDayMetrics {
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub market_change_pct: Option<f64>,
    pub ipo_change_pct: Option<f64>,
    pub market_positive: Option<bool>,
}

// ── Output record ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub listing: ListingRow,

    /// `{}` when the detail page could not be fetched.
    #[serde(default, with = "profile_or_empty")]
    pub ipo_data: Option<CompanyProfile>,

    #[serde(default)]
    pub trade_data: TradeData,

    #[serde(default)]
    pub first_day_open: Option<f64>,
    #[serde(default)]
    pub first_day_close: Option<f64>,
    #[serde(default, alias = "first_day_market_change")]
    pub first_day_market_change_pct: Option<f64>,
    #[serde(default, alias = "first_day_ipo_change")]
    pub first_day_ipo_change_pct: Option<f64>,
    #[serde(default)]
    pub first_day_market_positive: Option<bool>,
}

impl EnrichedRecord {
    pub fn new(
        listing: ListingRow,
        ipo_data: Option<CompanyProfile>,
        trade_data: TradeData,
        metrics: FirstDayMetrics,
    ) -> Self {
        Self {
            listing,
            ipo_data,
            trade_data,
            first_day_open: metrics.open,
            first_day_close: metrics.close,
            first_day_market_change_pct: metrics.market_change_pct,
            first_day_ipo_change_pct: metrics.ipo_change_pct,
            first_day_market_positive: metrics.market_positive,
        }
    }

    pub fn metrics(&self) -> FirstDayMetrics {
        FirstDayMetrics {
            open: self.first_day_open,
            close: self.first_day_close,
            market_change_pct: self.first_day_market_change_pct,
            ipo_change_pct: self.first_day_ipo_change_pct,
            market_positive: self.first_day_market_positive,
        }
    }
}

/// Serialises a missing profile as `{}` and reads `{}` (or `null`) back as `None`.
mod profile_or_empty {
    use super::CompanyProfile;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        profile: &Option<CompanyProfile>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match profile {
            Some(p) => p.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<CompanyProfile>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing() -> ListingRow {
        ListingRow {
            company: "Acme Corp".into(),
            company_url: "http://www.nasdaq.com/markets/ipos/company/acme-123".into(),
            symbol: "ACME".into(),
            market: "NASDAQ Global".into(),
            price: "$12.50".into(),
            price_num: Some(12.5),
            shares: "5,000,000".into(),
            amount: "$62,500,000".into(),
            date: "7/14/2017".into(),
        }
    }

    #[test]
    fn missing_profile_serialises_as_empty_object() {
        let record = EnrichedRecord::new(listing(), None, TradeData::default(), FirstDayMetrics::default());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["ipo_data"], serde_json::json!({}));
        assert_eq!(json["trade_data"], serde_json::json!({}));
        assert!(json["first_day_open"].is_null());
        assert!(json["first_day_market_positive"].is_null());
        assert_eq!(json["symbol"], "ACME");
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let raw = r#"{
            "company": "Acme Corp", "company_url": "u", "symbol": "ACME", "market": "NYSE",
            "price": "$10.00", "price_num": 10.0, "shares": "1", "amount": "10", "date": "1/2/2017",
            "ipo_data": {"description": "widgets", "use of proceeds": "growth"},
            "trade_data": {},
            "first_day_market_change": 5.0, "first_day_ipo_change": 20.0,
            "first_day_market_positive": true, "first_day_open": 11.43, "first_day_close": 12.0
        }"#;
        let record: EnrichedRecord = serde_json::from_str(raw).unwrap();

        let profile = record.ipo_data.as_ref().unwrap();
        assert_eq!(profile.description, "widgets");
        assert_eq!(profile.use_of_proceeds, "growth");
        assert_eq!(record.first_day_market_change_pct, Some(5.0));
        assert_eq!(record.first_day_ipo_change_pct, Some(20.0));
    }

    #[test]
    fn legacy_summary_labels_move_under_summary() {
        let raw = r#"{
            "company name": "acme corp", "employees": "120",
            "description": "widgets", "news_headlines_count": 0,
            "summary": {"employees": "121"}
        }"#;
        let profile: CompanyProfile = serde_json::from_str(raw).unwrap();

        assert_eq!(profile.summary["company name"], "acme corp");
        assert_eq!(profile.summary["employees"], "121");
        assert_eq!(profile.description, "widgets");

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("company name").is_none());
        assert_eq!(json["summary"]["company name"], "acme corp");
    }

    #[test]
    fn trade_data_skips_absent_and_non_finite_points() {
        let day = TradingDay {
            date: NaiveDate::from_ymd_opt(2017, 7, 14).unwrap(),
            open: Some(13.0),
            high: None,
            low: Some(f64::NAN),
            close: Some(14.0),
            volume: Some(1000.0),
        };
        let data = TradeData::from_days(&[day]);

        assert_eq!(data.0["Open"]["2017-07-14"], 13.0);
        assert!(!data.0.contains_key("High"));
        assert!(!data.0.contains_key("Low"));
        assert_eq!(data.0.len(), 3);
    }
}
