use super::{ExtractError, ExtractResult, anchor, select_all, select_first};
use crate::harvest::cleaner::{element_text, parse_price};
use crate::models::ListingRow;
use scraper::Html;
use tracing::{debug, warn};

/// Class of the container around the pricing-activity table.
pub const PRICING_TABLE: &str = "div.genTable";

/// Company, symbol, market, price, shares, amount, date.
const LISTING_COLUMNS: usize = 7;

/// Parse every row of the monthly pricing table.
///
/// A missing table or body is `Err`; the paginator treats that as an empty
/// month. Rows with no cells, or too few to fill every column, are skipped.
pub fn parse_listing_rows(doc: &Html) -> ExtractResult<Vec<ListingRow>> {
    let root = doc.root_element();
    let table = select_first(root, PRICING_TABLE).ok_or(ExtractError::Missing("pricing table"))?;
    let body = select_first(table, "tbody").ok_or(ExtractError::Missing("pricing table body"))?;

    let trs = select_all(body, "tr");
    if trs.is_empty() {
        return Err(ExtractError::NoRows("pricing table"));
    }

    let mut rows = Vec::with_capacity(trs.len());
    for (i, tr) in trs.into_iter().enumerate() {
        let cells = select_all(tr, "td");
        if cells.is_empty() {
            warn!("Skipping listing row #{} - no columns found", i);
            continue;
        }
        if cells.len() < LISTING_COLUMNS {
            warn!(
                "Skipping listing row #{} - {} columns, expected {}",
                i,
                cells.len(),
                LISTING_COLUMNS
            );
            continue;
        }

        let (company, company_url) =
            anchor(cells[0]).unwrap_or_else(|| (element_text(&cells[0]), String::new()));
        let symbol = anchor(cells[1])
            .map(|(text, _)| text)
            .unwrap_or_else(|| element_text(&cells[1]));
        let price = element_text(&cells[3]);

        debug!("Listing row #{}: {} ({})", i, company, symbol);
        rows.push(ListingRow {
            company,
            company_url,
            symbol,
            market: element_text(&cells[2]),
            price_num: parse_price(&price),
            price,
            shares: element_text(&cells[4]),
            amount: element_text(&cells[5]),
            date: element_text(&cells[6]),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <div class="genTable">
          <table>
            <thead><tr><th>Company</th><th>Symbol</th></tr></thead>
            <tbody>
              <tr>
                <td><a href="http://www.nasdaq.com/markets/ipos/company/acme-corp-1">Acme Corp</a></td>
                <td><a href="/symbol/acme">ACME</a></td>
                <td>NASDAQ Global</td>
                <td>$12.50</td>
                <td>5,000,000</td>
                <td>$62,500,000</td>
                <td>7/14/2017</td>
              </tr>
              <tr></tr>
              <tr><td>only</td><td>two</td></tr>
              <tr>
                <td>Beta Holdings</td>
                <td>BETA</td>
                <td>NYSE</td>
                <td>TBD</td>
                <td>1,000,000</td>
                <td>-</td>
                <td>7/20/2017</td>
              </tr>
            </tbody>
          </table>
        </div>
        </body></html>"#;

    #[test]
    fn parses_rows_and_skips_malformed_ones() {
        let rows = parse_listing_rows(&Html::parse_document(PAGE)).unwrap();
        assert_eq!(rows.len(), 2);

        let acme = &rows[0];
        assert_eq!(acme.company, "Acme Corp");
        assert_eq!(acme.company_url, "http://www.nasdaq.com/markets/ipos/company/acme-corp-1");
        assert_eq!(acme.symbol, "ACME");
        assert_eq!(acme.market, "NASDAQ Global");
        assert_eq!(acme.price, "$12.50");
        assert_eq!(acme.price_num, Some(12.5));
        assert_eq!(acme.shares, "5,000,000");
        assert_eq!(acme.amount, "$62,500,000");
        assert_eq!(acme.date, "7/14/2017");

        let beta = &rows[1];
        assert_eq!(beta.company, "Beta Holdings");
        assert_eq!(beta.company_url, "");
        assert_eq!(beta.symbol, "BETA");
        assert_eq!(beta.price_num, None);
    }

    #[test]
    fn missing_table_is_reported() {
        let doc = Html::parse_document("<html><body><p>No pricings</p></body></html>");
        assert_eq!(parse_listing_rows(&doc), Err(ExtractError::Missing("pricing table")));
    }

    #[test]
    fn empty_body_is_reported() {
        let doc = Html::parse_document(
            r#"<div class="genTable"><table><tbody></tbody></table></div>"#,
        );
        assert!(parse_listing_rows(&doc).is_err());
    }
}
