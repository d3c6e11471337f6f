use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::data_models::SearchResult;
use crate::error::{ResearchError, Result};

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ResearchError::Selector(css))
}

fn element_text(element: Option<ElementRef<'_>>) -> String {
    element
        .map(|el| el.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// DuckDuckGo wraps result links as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
/// Returns the decoded destination, or the href unchanged when it is not a redirect.
pub fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    if let Ok(url) = Url::parse(&absolute) {
        if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
            if !target.is_empty() {
                return target.into_owned();
            }
        }
    }
    href.to_string()
}

/// Parses a DuckDuckGo HTML results page. Blocks without a title are skipped.
pub fn parse_search_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for block in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }
        let link = block.select(&link_sel).next();
        let title = element_text(link);
        if title.is_empty() {
            continue;
        }
        let url = link
            .and_then(|el| el.value().attr("href"))
            .map(unwrap_redirect)
            .unwrap_or_default();
        let description = element_text(block.select(&snippet_sel).next());

        results.push(SearchResult {
            title,
            url,
            description,
        });
    }
    Ok(results)
}
