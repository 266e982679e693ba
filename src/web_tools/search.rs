//! HttpSearcher: RESEARCH via an HTML search results page
//!
//! Result shape: `{"queries": [{"query", "results": [{"title", "url", "snippet"}]}]}`.
//! A query that fails records an `error` instead of results; the search as a
//! whole fails only when every query failed.

use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::WebConfig;
use crate::execution_engine::{CollaboratorError, WebSearcher};
use crate::web_tools::{build_client, WebError};

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

pub struct HttpSearcher {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl HttpSearcher {
    pub fn new(config: &WebConfig) -> Result<Self, WebError> {
        Ok(HttpSearcher {
            client: build_client(config)?,
            endpoint: config.search_endpoint.clone(),
            max_results: config.max_results,
        })
    }

    /// Run one query
    pub fn search_one(&self, query: &str) -> Result<Vec<SearchHit>, WebError> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|_| WebError::InvalidUrl(self.endpoint.clone()))?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| WebError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|source| WebError::Request {
            url: url.to_string(),
            source,
        })?;

        let hits = parse_results(&body, self.max_results);
        tracing::debug!(%query, hits = hits.len(), "Search finished");
        Ok(hits)
    }
}

impl WebSearcher for HttpSearcher {
    fn search(&self, queries: &[String]) -> Result<Value, CollaboratorError> {
        let mut entries = Vec::with_capacity(queries.len());
        let mut failures = Vec::new();

        for query in queries {
            match self.search_one(query) {
                Ok(results) => entries.push(json!({ "query": query, "results": results })),
                Err(e) => {
                    tracing::warn!(%query, error = %e, "Search query failed");
                    entries.push(json!({ "query": query, "error": e.to_string() }));
                    failures.push(e.to_string());
                }
            }
        }

        if !queries.is_empty() && failures.len() == queries.len() {
            return Err(CollaboratorError::new(format!(
                "All searches failed: {}",
                failures.join("; ")
            )));
        }
        Ok(json!({ "queries": entries }))
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwrap redirect links of the form `/l/?uddg=<target>`
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    if let Ok(url) = Url::parse(&absolute) {
        if let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg") {
            return target.into_owned();
        }
    }
    absolute
}

/// Extract up to `limit` hits from a results page
pub fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let (Some(result_sel), Some(link_sel), Some(snippet_sel)) = (
        selector(".result"),
        selector("a.result__a"),
        selector(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(text_of)
                .unwrap_or_default();
            Some(SearchHit {
                title: text_of(link),
                url: resolve_link(href),
                snippet,
            })
        })
        .take(limit)
        .collect()
}
