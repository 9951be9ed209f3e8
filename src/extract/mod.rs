//! Markup extractors for the listing page and the company detail page.
//!
//! Every extractor takes a parsed document and either returns a value or an
//! [`ExtractError`] naming the section that was not found. Callers decide
//! what the default is; see [`profile::parse_company_profile`].

pub mod experts;
pub mod financials;
pub mod listing;
pub mod news;
pub mod profile;

use scraper::{ElementRef, Selector};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("{0} not found")]
    Missing(&'static str),

    #[error("{0} has no rows")]
    NoRows(&'static str),
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// All descendants of `scope` matching `css`. An invalid selector matches nothing.
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Ok(sel) = Selector::parse(css) else {
        return Vec::new();
    };
    scope.select(&sel).collect()
}

pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let Ok(sel) = Selector::parse(css) else {
        return None;
    };
    scope.select(&sel).next()
}

/// First anchor under `scope` as `(text, href)`, only when it has visible text.
pub(crate) fn anchor(scope: ElementRef<'_>) -> Option<(String, String)> {
    let a = select_first(scope, "a")?;
    let text = crate::harvest::cleaner::non_empty_text(&a)?;
    let href = a.value().attr("href").unwrap_or_default().trim().to_string();
    Some((text, href))
}

/// Parse a listing page body. Keeps the non-`Send` document out of async code.
pub fn listing_rows_from_markup(body: &str) -> ExtractResult<Vec<crate::models::ListingRow>> {
    listing::parse_listing_rows(&scraper::Html::parse_document(body))
}

/// Parse a company detail page body into its profile.
pub fn profile_from_markup(body: &str, site_root: &str) -> crate::models::CompanyProfile {
    profile::parse_company_profile(&scraper::Html::parse_document(body), site_root)
}
