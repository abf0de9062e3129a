//! Registry scraping and search-API lookup
//!
//! Two stateless fetch-and-extract functions. No retries, no pagination:
//! a transient network failure on the registry fetch propagates as a
//! transport error.

use std::io::Read;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

use crate::config::Secrets;
use crate::{Error, Result};

/// Public register of recognised sponsors (regular labour and highly
/// skilled migrants)
pub const IND_SPONSORS_URL: &str =
    "https://ind.nl/en/public-register-recognised-sponsors/public-register-regular-labour-and-highly-skilled-migrants";

/// Column-header labels on the registry page. The header row is
/// structurally indistinguishable from data rows under the row-header
/// selector, so these get filtered out by exact text match. The labels
/// change occasionally.
pub const IND_HEADER_ORGANISATION: &str = "Company/organisation";
pub const IND_HEADER_REGISTRATION: &str = "Comp.Reg.nr.";
pub const IND_EXCLUDED_HEADERS: &[&str] = &[IND_HEADER_ORGANISATION, IND_HEADER_REGISTRATION];

/// Custom Search JSON API endpoint; the engine behind `cx` is
/// restricted to www.linkedin.com/* and nl.linkedin.com/*
pub const SEARCH_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Returned when the search API answers successfully but with zero
/// items. Distinct from a failed request, which is an error.
pub const NO_RESULTS: &str = "No results found.";

/// Fetch the registry page and return the organisation names it lists,
/// in document order.
pub fn scrape_registry_organisations(url: &str, excluded_headers: &[&str]) -> Result<Vec<String>> {
    debug!("Fetching registry page {url}");
    let response = ureq::get(url).call()?;
    let mut html = String::new();
    response.into_reader().read_to_string(&mut html)?;
    extract_row_labels(&html, excluded_headers)
}

/// Extract the trimmed text of every `th[scope=row]` cell, dropping any
/// text exactly equal to an excluded header label.
pub fn extract_row_labels(html: &str, excluded_headers: &[&str]) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("th[scope=row]")
        .map_err(|e| Error::Scrape(format!("invalid row selector: {e}")))?;

    let labels = document
        .select(&selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .filter(|text| !excluded_headers.contains(&text.as_str()))
        .collect();
    Ok(labels)
}

/// Resolve an organisation name to the first search-result link.
///
/// Returns [`NO_RESULTS`] when the API answers with zero items; a
/// non-2xx status becomes [`Error::SearchApi`] carrying the response
/// body.
pub fn resolve_organisation_link(name: &str, secrets: &Secrets) -> Result<String> {
    search_first_link(SEARCH_API_URL, name, secrets)
}

/// Same as [`resolve_organisation_link`] but against an explicit
/// endpoint, so tests can point it at a local listener.
pub fn search_first_link(endpoint: &str, name: &str, secrets: &Secrets) -> Result<String> {
    debug!("Searching for \"{name}\"");
    let request = ureq::get(endpoint)
        .query("key", &secrets.my_key)
        .query("cx", &secrets.my_cx)
        .query("q", name);

    match request.call() {
        Ok(response) => {
            let data: SearchResponse = serde_json::from_reader(response.into_reader())?;
            match data.items.into_iter().next() {
                Some(item) => Ok(item.link),
                None => Ok(NO_RESULTS.to_string()),
            }
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(Error::SearchApi { status, body })
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const REGISTRY_FRAGMENT: &str = r#"
        <html><body><table>
            <tr>
                <th scope="row">Company/organisation</th>
                <th scope="row">Comp.Reg.nr.</th>
            </tr>
            <tr><th scope="row"> Company A </th><td>111</td></tr>
            <tr><th scope="row">Company B</th><td>222</td></tr>
        </table></body></html>
    "#;

    fn test_secrets() -> Secrets {
        Secrets {
            my_key: "test-key".to_string(),
            my_cx: "test-cx".to_string(),
        }
    }

    /// Serve one HTTP response on an ephemeral port and return the
    /// endpoint URL
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_extract_row_labels_filters_headers() {
        let labels = extract_row_labels(REGISTRY_FRAGMENT, IND_EXCLUDED_HEADERS).unwrap();
        assert_eq!(labels, vec!["Company A", "Company B"]);
    }

    #[test]
    fn test_extract_row_labels_without_exclusions() {
        let labels = extract_row_labels(REGISTRY_FRAGMENT, &[]).unwrap();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[0], "Company/organisation");
    }

    #[test]
    fn test_extract_row_labels_empty_document() {
        let labels = extract_row_labels("<html><body></body></html>", IND_EXCLUDED_HEADERS).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn test_search_returns_first_link() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"items": [{"link": "https://www.linkedin.com/company/abb"}, {"link": "https://www.linkedin.com/company/other"}]}"#,
        );
        let link = search_first_link(&endpoint, "ABB B.V.", &test_secrets()).unwrap();
        assert_eq!(link, "https://www.linkedin.com/company/abb");
    }

    #[test]
    fn test_search_empty_items_is_not_an_error() {
        let endpoint = serve_once("200 OK", r#"{"items": []}"#);
        let link = search_first_link(&endpoint, "Nobody", &test_secrets()).unwrap();
        assert_eq!(link, NO_RESULTS);
    }

    #[test]
    fn test_search_missing_items_is_not_an_error() {
        let endpoint = serve_once("200 OK", "{}");
        let link = search_first_link(&endpoint, "Nobody", &test_secrets()).unwrap();
        assert_eq!(link, NO_RESULTS);
    }

    #[test]
    fn test_search_malformed_body_fails() {
        let endpoint = serve_once("200 OK", "not json at all");
        let result = search_first_link(&endpoint, "ABB B.V.", &test_secrets());
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_search_non_success_status_fails_with_body() {
        let endpoint = serve_once("500 Internal Server Error", r#"{"error": "quota exceeded"}"#);
        let result = search_first_link(&endpoint, "ABB B.V.", &test_secrets());
        match result {
            Err(Error::SearchApi { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("expected SearchApi error, got {other:?}"),
        }
    }
}
