//! HttpFetcher: READ on a URL

use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::config::WebConfig;
use crate::execution_engine::{CollaboratorError, ContentFetcher};
use crate::web_tools::{build_client, WebError};

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    client: Client,
    max_content_chars: usize,
}

impl HttpFetcher {
    pub fn new(config: &WebConfig) -> Result<Self, WebError> {
        Ok(HttpFetcher {
            client: build_client(config)?,
            max_content_chars: config.max_content_chars,
        })
    }

    /// Fetch `url`; HTML bodies are reduced to text
    pub fn fetch(&self, url: &str) -> Result<String, WebError> {
        let request_error = |source| WebError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        let body = response.text().map_err(request_error)?;
        tracing::debug!(%url, bytes = body.len(), is_html, "Fetched content");

        let text = if is_html { extract_text(&body) } else { body };
        Ok(truncate_text(&text, self.max_content_chars))
    }
}

impl ContentFetcher for HttpFetcher {
    fn get_content(&self, url: &str) -> Result<String, CollaboratorError> {
        self.fetch(url).map_err(CollaboratorError::from_display)
    }
}

/// Readable text of an HTML page: title, then article / main / body text
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let content = element_text(&document, "article")
        .or_else(|| element_text(&document, "main"))
        .or_else(|| element_text(&document, "body"))
        .unwrap_or_default();

    match title {
        Some(title) => format!("# {title}\n\n{content}"),
        None => content,
    }
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = document.select(&sel).next()?;
    let text = element.text().collect::<Vec<_>>().join(" ");
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
