//! Web tools: remote content for READ and RESEARCH actions
//!
//! - `fetch`: HTTP GET with HTML reduced to readable text
//! - `search`: web search over an HTML results page

mod fetch;
mod search;

pub use fetch::{extract_text, truncate_text, HttpFetcher};
pub use search::{parse_results, HttpSearcher, SearchHit};

/// Web tool errors
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

pub(crate) fn build_client(
    config: &crate::config::WebConfig,
) -> Result<reqwest::blocking::Client, WebError> {
    reqwest::blocking::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(WebError::Client)
}
