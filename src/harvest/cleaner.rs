use chrono::NaiveDate;
use scraper::ElementRef;

// ── Text ──────────────────────────────────────────────────────────────────────

/// Visible text of an element with runs of whitespace collapsed.
pub fn element_text(el: &ElementRef) -> String {
    normalise_ws(&el.text().collect::<String>())
}

pub fn normalise_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Some(text)` when the element has non-empty text.
pub fn non_empty_text(el: &ElementRef) -> Option<String> {
    let text = element_text(el);
    if text.is_empty() { None } else { Some(text) }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Offer price: keep ASCII digits and '.' only.
/// "$12.50" → 12.5 | "$1,012.00" → 1012.0 | "TBD" → None
pub fn parse_price(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Pricing dates: "7/14/2017" (listing table), "Jul 14, 2017" or ISO.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%m/%d/%Y", "%b %d, %Y", "%Y-%m-%d", "%d %b %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

// ── Links ─────────────────────────────────────────────────────────────────────

/// Prefix a site-relative href with the site root. Absolute hrefs pass through.
pub fn absolute_url(site_root: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let root = site_root.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", root, href)
    } else {
        format!("{}/{}", root, href)
    }
}
