use super::{ExtractError, ExtractResult, anchor, select_all, select_first};
use crate::harvest::cleaner::non_empty_text;
use crate::models::NewsItem;
use scraper::Html;

/// Headlines listed under the company news & commentary box.
pub fn parse_news(doc: &Html) -> ExtractResult<Vec<NewsItem>> {
    let container = select_first(doc.root_element(), "div#CompanyNewsCommentary")
        .ok_or(ExtractError::Missing("news container"))?;
    let list = select_first(container, "ul").ok_or(ExtractError::Missing("news list"))?;

    let items = select_all(list, "li");
    if items.is_empty() {
        return Err(ExtractError::NoRows("news list"));
    }

    Ok(items
        .into_iter()
        .map(|li| {
            let (news_headline, news_url) = anchor(li).unwrap_or_default();
            let news_source = select_first(li, "small")
                .and_then(|s| non_empty_text(&s))
                .unwrap_or_default();
            NewsItem {
                news_url,
                news_headline,
                news_source,
            }
        })
        .collect())
}
