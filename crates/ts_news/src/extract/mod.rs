use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};
use ts_core::{ArticleExtractor, Error, ExtractedDocument, Result};
use url::Url;

pub mod clean;
pub mod readability;

pub use clean::clean_text;
pub use readability::extract_content;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetches an article page and reduces it to cleaned plain text.
#[derive(Debug, Clone)]
pub struct HttpArticleExtractor {
    client: Client,
}

impl HttpArticleExtractor {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("🌐 Fetch failed for {}: {}", url, e);
            Error::Network(format!("Could not fetch the article page: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("🌐 Article page {} answered {}", url, status);
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("Fetching the article page failed with status {}.", status.as_u16()),
            });
        }

        Ok(response.text().await?)
    }
}

/// Accepts only absolute http(s) URLs.
pub fn validate_url(url: &str) -> Result<Url> {
    let invalid = || Error::Validation("Missing or invalid 'url' property in request body.".to_string());
    if !url.starts_with("http") {
        return Err(invalid());
    }
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(invalid()),
    }
}

/// Runs main-content detection and cleanup on an already fetched page.
pub fn extract_text(html: &str) -> Result<String> {
    let text = extract_content(html)
        .map(|content| clean_text(&content))
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            Error::ExtractionFailed(
                "Could not extract main content from this page (structure might be unsupported)."
                    .to_string(),
            )
        })?;
    Ok(text)
}

#[async_trait]
impl ArticleExtractor for HttpArticleExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedDocument> {
        validate_url(url)?;
        info!("🦗 Extracting article from {}", url);

        let html = self.fetch_html(url).await?;
        info!("📄 Fetched {} bytes of HTML, extracting content", html.len());

        let text = extract_text(&html).map_err(|e| {
            warn!("⚠️ No main content found at {}", url);
            e
        })?;
        info!("✨ Extracted {} characters from {}", text.chars().count(), url);

        Ok(ExtractedDocument {
            url: url.to_string(),
            text,
        })
    }
}
