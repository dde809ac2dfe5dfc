// src/edgar/index.rs
use crate::edgar::client::{fetch_success, Fetcher, RetryPolicy};
use crate::edgar::models::{FilingReference, ANNUAL_REPORT_FORM};
use crate::utils::error::{EdgarError, NotFound};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

// --- CSS Selectors (Lazy Static) ---
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").expect("Failed to compile CELL_SELECTOR")
});

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to compile LINK_SELECTOR")
});

// Index pages link the primary document through the inline XBRL viewer.
const INLINE_VIEWER_PREFIX: &str = "/ix?doc=";

/// `{base}/Archives/edgar/data/{cik}/{accession-no-dashes}/{accession}-index.html`
pub fn filing_index_url(archives_base: &Url, filing: &FilingReference) -> String {
    let accession = filing.accession_number();
    format!(
        "{}/Archives/edgar/data/{}/{}/{}-index.html",
        archives_base.as_str().trim_end_matches('/'),
        filing.cik(),
        accession.without_dashes(),
        accession
    )
}

/// Fetches the filing index page and returns the absolute URL of the
/// primary 10-K document.
pub async fn resolve_primary_document(
    fetcher: &dyn Fetcher,
    archives_base: &Url,
    policy: &RetryPolicy,
    filing: &FilingReference,
) -> Result<String, EdgarError> {
    let index_url = filing_index_url(archives_base, filing);
    tracing::info!("Fetching filing index: {}", index_url);

    let html = fetch_success(fetcher, &index_url, policy).await?;
    tracing::debug!("Filing index is {} bytes", html.len());

    match find_primary_document(&html, archives_base) {
        Some(url) => {
            tracing::info!("Primary 10-K document: {}", url);
            Ok(url)
        }
        None => {
            tracing::error!("No 10-K document row found in {}", index_url);
            Err(NotFound::PrimaryDocument(index_url).into())
        }
    }
}

/// Scans the document table row by row. The first row with a description
/// cell (second column) mentioning `10-K` decides the outcome: its third
/// column link is the primary document, and when that row has no usable
/// link there is no primary document. Later 10-K rows (exhibits and the
/// like) are never considered.
pub fn find_primary_document(html: &str, archives_base: &Url) -> Option<String> {
    let document = Html::parse_document(html);

    let row = document.select(&ROW_SELECTOR).find_map(|row| {
        let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
        let qualifies = cells.len() >= 3
            && cells[1].text().collect::<String>().contains(ANNUAL_REPORT_FORM);
        qualifies.then_some(cells)
    })?;

    let Some(href) = row[2]
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|link| link.value().attr("href"))
    else {
        tracing::warn!(
            "10-K row '{}' has no document link",
            row[1].text().collect::<String>().trim()
        );
        return None;
    };

    let url = absolute_document_url(archives_base, href);
    if url.is_none() {
        tracing::warn!("Unusable document link '{}'", href);
    }
    url
}

fn absolute_document_url(archives_base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    let href = href.strip_prefix(INLINE_VIEWER_PREFIX).unwrap_or(href);
    archives_base.join(href).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::client::testing::FakeFetcher;
    use crate::edgar::models::{AccessionNumber, Cik};
    use crate::utils::error::ErrorKind;

    fn sec() -> Url {
        Url::parse("https://www.sec.gov").unwrap()
    }

    fn apple_filing() -> FilingReference {
        FilingReference::from_accession(
            Cik::new(320193),
            AccessionNumber::parse("0000320193-23-000106").unwrap(),
        )
    }

    const INDEX_PAGE: &str = r#"
        <html><body>
        <table class="tableFile" summary="Document Format Files">
          <tr><th>Seq</th><th>Description</th><th>Document</th><th>Type</th><th>Size</th></tr>
          <tr>
            <td>1</td><td>10-K</td>
            <td><a href="/ix?doc=/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm">
              aapl-20230930.htm</a></td>
            <td>10-K</td><td>1234567</td>
          </tr>
          <tr>
            <td>2</td><td>EX-4.1 description of 10-K securities</td>
            <td><a href="/Archives/edgar/data/320193/000032019323000106/a10-kexhibit41.htm">
              a10-kexhibit41.htm</a></td>
            <td>EX-4.1</td><td>1000</td>
          </tr>
        </table>
        </body></html>
    "#;

    fn fetcher_serving(status: u16, body: &str) -> FakeFetcher {
        FakeFetcher::new().respond(&filing_index_url(&sec(), &apple_filing()), status, body)
    }

    #[test]
    fn single_row_relative_link() {
        let html = r#"<table><tr>
            <td>1</td><td>10-K Filing</td><td><a href="/Archives/x.htm">x.htm</a></td>
        </tr></table>"#;
        assert_eq!(
            find_primary_document(html, &sec()).as_deref(),
            Some("https://www.sec.gov/Archives/x.htm")
        );
    }

    #[test]
    fn first_qualifying_row_wins_and_viewer_link_is_unwrapped() {
        assert_eq!(
            find_primary_document(INDEX_PAGE, &sec()).as_deref(),
            Some(
                "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/\
                 aapl-20230930.htm"
            )
        );
    }

    #[test]
    fn absolute_links_are_kept() {
        let html = r#"<table><tr>
            <td>1</td><td>FORM 10-K</td><td><a href="https://mirror.example/doc.htm">doc</a></td>
        </tr></table>"#;
        assert_eq!(
            find_primary_document(html, &sec()).as_deref(),
            Some("https://mirror.example/doc.htm")
        );
    }

    const LINKLESS_ANNUAL_REPORT_PAGE: &str = r#"<table>
        <tr><td>1</td><td>10-K</td><td>aapl-20230930.htm</td></tr>
        <tr>
          <td>2</td><td>EX-4.1 description of 10-K securities</td>
          <td><a href="/Archives/exhibit41.htm">exhibit41.htm</a></td>
        </tr>
    </table>"#;

    #[test]
    fn annual_report_row_without_link_is_not_replaced_by_exhibit() {
        assert_eq!(find_primary_document(LINKLESS_ANNUAL_REPORT_PAGE, &sec()), None);
    }

    #[test]
    fn unusable_link_in_annual_report_row_is_none() {
        let html = r#"<table>
            <tr><td>1</td><td>10-K</td><td><a href="http://[bad">doc</a></td></tr>
            <tr><td>2</td><td>10-K</td><td><a href="/Archives/y.htm">y.htm</a></td></tr>
        </table>"#;
        assert_eq!(find_primary_document(html, &sec()), None);
    }

    #[test]
    fn no_matching_row() {
        let html = r#"<table><tr>
            <td>1</td><td>10-Q</td><td><a href="/Archives/q.htm">q.htm</a></td>
        </tr></table>"#;
        assert_eq!(find_primary_document(html, &sec()), None);
        assert_eq!(find_primary_document("<p>empty</p>", &sec()), None);
    }

    #[test]
    fn index_url_layout() {
        assert_eq!(
            filing_index_url(&sec(), &apple_filing()),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/\
             0000320193-23-000106-index.html"
        );
    }

    #[tokio::test]
    async fn non_200_index_is_retrieval_error_with_status() {
        let fetcher = fetcher_serving(500, "oops");
        let err = resolve_primary_document(&fetcher, &sec(), &RetryPolicy::none(), &apple_filing())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Retrieval);
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let fetcher = fetcher_serving(200, "<table></table>");
        let err = resolve_primary_document(&fetcher, &sec(), &RetryPolicy::none(), &apple_filing())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn linkless_annual_report_row_is_not_found() {
        let fetcher = fetcher_serving(200, LINKLESS_ANNUAL_REPORT_PAGE);
        let err = resolve_primary_document(&fetcher, &sec(), &RetryPolicy::none(), &apple_filing())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.to_string().contains("exhibit41"));
    }
}
