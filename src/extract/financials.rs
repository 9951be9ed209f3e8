use super::{ExtractError, ExtractResult, select_all, select_first};
use crate::harvest::cleaner::{absolute_url, element_text};
use crate::models::{FilingEntry, FinancialsSummary};
use regex::RegexBuilder;
use scraper::{ElementRef, Html};
use tracing::warn;

/// Tab pane holding the financials and filings tables.
pub const FINANCIALS_PANE: &str = "div#tabpane2";

/// Income figures from the first table, balance-sheet figures from the
/// second, filings from the third. Later tables are optional.
pub fn parse_financials(doc: &Html, site_root: &str) -> ExtractResult<FinancialsSummary> {
    let pane = select_first(doc.root_element(), FINANCIALS_PANE)
        .ok_or(ExtractError::Missing("financials pane"))?;
    let container =
        select_first(pane, "div.genTable").ok_or(ExtractError::Missing("financials table"))?;

    let tables = select_all(container, "table");
    let Some(income) = tables.first() else {
        return Err(ExtractError::Missing("income table"));
    };

    let mut financials = FinancialsSummary::default();

    let cells = select_all(*income, "td");
    financials.revenue = labelled_value(&cells, "revenue");
    financials.net_income = labelled_value(&cells, "net income");
    financials.total_assets = labelled_value(&cells, "total assets");

    if let Some(liabilities) = tables.get(1) {
        let cells = select_all(*liabilities, "td");
        financials.total_liabilities = labelled_value(&cells, "total liabilities");
        financials.stockholders_equity = labelled_value(&cells, "stockholders.*equity");
    }

    if let Some(filings) = tables.get(2) {
        financials.filings = parse_filings(*filings, site_root);
    }

    Ok(financials)
}

/// Text of the cell after the first cell whose text matches `pattern`
/// (case-insensitive), or "" when no cell matches.
fn labelled_value(cells: &[ElementRef], pattern: &str) -> String {
    let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
        return String::new();
    };
    cells
        .iter()
        .position(|td| re.is_match(&element_text(td)))
        .and_then(|i| cells.get(i + 1))
        .map(|td| element_text(td))
        .unwrap_or_default()
}

/// Rows are (blank | form type | date received | link); anything whose cell
/// count is not a multiple of four is skipped.
fn parse_filings(table: ElementRef, site_root: &str) -> Vec<FilingEntry> {
    let Some(body) = select_first(table, "tbody") else {
        warn!("Filings table has no body");
        return Vec::new();
    };

    let mut filings = Vec::new();
    for (i, tr) in select_all(body, "tr").into_iter().enumerate() {
        let cells = select_all(tr, "td");
        if cells.is_empty() || cells.len() % 4 != 0 {
            warn!("Skipping filings row #{} - {} columns", i, cells.len());
            continue;
        }

        let url = select_first(cells[3], "a")
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolute_url(site_root, href))
            .unwrap_or_default();

        filings.push(FilingEntry {
            form_type: element_text(&cells[1]),
            date_received: element_text(&cells[2]),
            url,
        });
    }
    filings
}
