use super::{ExtractError, ExtractResult, anchor, select_all, select_first};
use crate::harvest::cleaner::element_text;
use crate::models::ExpertEntry;
use scraper::Html;
use tracing::warn;

/// Tab pane holding the underwriters / counsel / auditors table.
pub const EXPERTS_PANE: &str = "div#tabpane3";

pub fn parse_experts(doc: &Html) -> ExtractResult<Vec<ExpertEntry>> {
    let pane = select_first(doc.root_element(), EXPERTS_PANE)
        .ok_or(ExtractError::Missing("experts pane"))?;
    let table = select_first(pane, "div.genTable table")
        .ok_or(ExtractError::Missing("experts table"))?;
    let body = select_first(table, "tbody").ok_or(ExtractError::Missing("experts table body"))?;

    let rows = select_all(body, "tr");
    if rows.is_empty() {
        return Err(ExtractError::NoRows("experts table"));
    }

    let mut experts = Vec::new();
    for (i, tr) in rows.into_iter().enumerate() {
        let cells = select_all(tr, "td");
        if cells.is_empty() || cells.len() % 2 != 0 {
            warn!("Skipping experts row #{} - {} columns", i, cells.len());
            continue;
        }

        let (expert_name, expert_url) = anchor(cells[1]).unwrap_or_default();
        experts.push(ExpertEntry {
            role: element_text(&cells[0]),
            expert_name,
            expert_url,
        });
    }

    Ok(experts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_even_rows_and_skips_odd_ones() {
        let doc = Html::parse_document(
            r#"<div id="tabpane3"><div class="genTable"><table><tbody>
                 <tr><td>Lead Underwriter</td><td><a href="http://x/gs">Goldman Sachs</a></td></tr>
                 <tr><td>Company Counsel</td><td>Unlisted LLP</td></tr>
                 <tr><td>Auditor</td></tr>
               </tbody></table></div></div>"#,
        );
        let experts = parse_experts(&doc).unwrap();
        assert_eq!(experts.len(), 2);
        assert_eq!(experts[0].role, "Lead Underwriter");
        assert_eq!(experts[0].expert_name, "Goldman Sachs");
        assert_eq!(experts[0].expert_url, "http://x/gs");
        assert_eq!(experts[1].role, "Company Counsel");
        assert_eq!(experts[1].expert_name, "");
        assert_eq!(experts[1].expert_url, "");
    }

    #[test]
    fn missing_pane_or_table() {
        let doc = Html::parse_document("<div id='tabpane2'></div>");
        assert_eq!(parse_experts(&doc), Err(ExtractError::Missing("experts pane")));

        let doc = Html::parse_document("<div id='tabpane3'><p>none</p></div>");
        assert_eq!(parse_experts(&doc), Err(ExtractError::Missing("experts table")));
    }
}
