use super::experts::parse_experts;
use super::financials::parse_financials;
use super::news::parse_news;
use super::{ExtractError, ExtractResult, select_all, select_first};
use crate::harvest::cleaner::element_text;
use crate::models::CompanyProfile;
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use tracing::warn;

/// Build the company profile from a detail page.
///
/// Each section is extracted on its own; a section that is missing falls back
/// to its empty value and the rest are still attempted.
pub fn parse_company_profile(doc: &Html, site_root: &str) -> CompanyProfile {
    let root = doc.root_element();

    let summary = or_default("summary table", parse_summary(root));
    let description = or_default(
        "company description",
        block_text(root, "div.ipo-comp-description", "company description"),
    );
    let use_of_proceeds = or_default(
        "use of proceeds",
        block_text(root, "div#infoTable_2", "use of proceeds"),
    );
    let competitors_text = or_default(
        "competitors",
        block_text(root, "div#infoTable_3", "competitors"),
    );
    let news_headlines = or_default("news", parse_news(doc));
    let experts = or_default("experts", parse_experts(doc));
    let financials = or_default("financials", parse_financials(doc, site_root));

    CompanyProfile {
        summary,
        description,
        use_of_proceeds,
        competitors_text,
        news_headlines_count: news_headlines.len(),
        news_headlines,
        experts,
        financials,
    }
}

fn or_default<T: Default>(section: &str, result: ExtractResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{}: {}", section, e);
        T::default()
    })
}

/// Label/value pairs from the summary table; labels lower-cased.
fn parse_summary(root: ElementRef) -> ExtractResult<BTreeMap<String, String>> {
    let table = select_first(root, "div#infoTable").ok_or(ExtractError::Missing("summary table"))?;
    let rows = select_all(table, "tr");
    if rows.is_empty() {
        return Err(ExtractError::NoRows("summary table"));
    }

    let mut summary = BTreeMap::new();
    for (i, tr) in rows.into_iter().enumerate() {
        let cells = select_all(tr, "td");
        if cells.is_empty() || cells.len() % 2 != 0 {
            warn!("Skipping summary row #{} - {} columns", i, cells.len());
            continue;
        }
        for pair in cells.chunks(2) {
            let label = element_text(&pair[0]).to_lowercase();
            if label.is_empty() {
                continue;
            }
            summary.insert(label, element_text(&pair[1]));
        }
    }
    Ok(summary)
}

/// Preformatted text inside a container, trimmed but otherwise as printed.
fn block_text(root: ElementRef, container: &str, what: &'static str) -> ExtractResult<String> {
    let block = select_first(root, container).ok_or(ExtractError::Missing(what))?;
    let pre = select_first(block, "pre").ok_or(ExtractError::Missing(what))?;
    let text = pre.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        return Err(ExtractError::Missing(what));
    }
    Ok(text)
}
