use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use ts_core::{Error, Result, TrendItem, TrendQuery, Voice};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(150);

/// Script options chosen by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOptions {
    pub duration_secs: Option<u32>,
    pub tone: Option<String>,
}

/// Speech options chosen by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOptions {
    pub voice: Voice,
    pub model: Option<String>,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            voice: Voice::Nova,
            model: None,
        }
    }
}

/// One call per pipeline stage.
#[async_trait]
pub trait StageClient: Send + Sync {
    async fn trends(&self, query: &TrendQuery) -> Result<Vec<TrendItem>>;

    async fn extract(&self, url: &str) -> Result<String>;

    async fn ideas(&self, article_text: &str) -> Result<String>;

    async fn script(&self, article_text: &str, ideas: &str, options: &ScriptOptions) -> Result<String>;

    async fn audio(&self, script: &str, options: &AudioOptions) -> Result<Bytes>;
}

#[derive(Deserialize)]
struct DataBody<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct TrendsParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<&'a str>,
    country: &'a str,
    category: &'a str,
    limit: u32,
    #[serde(rename = "sortBy", skip_serializing_if = "Option::is_none")]
    sort_by: Option<&'a str>,
}

/// Talks to a running `ts_web` server.
#[derive(Debug, Clone)]
pub struct HttpStageClient {
    client: Client,
    base_url: String,
}

impl HttpStageClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<Response> {
        debug!("📡 POST {}", self.endpoint(path));
        let response = self.client.post(self.endpoint(path)).json(&body).send().await?;
        check(response).await
    }

    async fn post_data<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let body: DataBody<T> = self.post(path, body).await?.json().await?;
        Ok(body.data)
    }
}

/// Turns a non-success answer into an error carrying the server's `{error}` message.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("Request failed with status {}.", status.as_u16()),
    };
    warn!("📡 Server answered {}: {}", status.as_u16(), message);

    Err(match status.as_u16() {
        400 => Error::Validation(message),
        422 => Error::ExtractionFailed(message),
        503 => Error::Config(message),
        code => Error::Upstream {
            status: code,
            message,
        },
    })
}

#[async_trait]
impl StageClient for HttpStageClient {
    async fn trends(&self, query: &TrendQuery) -> Result<Vec<TrendItem>> {
        let params = TrendsParams {
            keywords: query.search_terms(),
            country: &query.country,
            category: &query.category,
            limit: query.clamped_limit(),
            sort_by: query.sort_by.as_deref(),
        };
        debug!("📡 GET {}", self.endpoint("trends"));
        let response = self
            .client
            .get(self.endpoint("trends"))
            .query(&params)
            .send()
            .await?;
        let body: DataBody<Vec<TrendItem>> = check(response).await?.json().await?;
        Ok(body.data)
    }

    async fn extract(&self, url: &str) -> Result<String> {
        self.post_data("extract", json!({ "url": url })).await
    }

    async fn ideas(&self, article_text: &str) -> Result<String> {
        self.post_data("ideas", json!({ "text": article_text })).await
    }

    async fn script(&self, article_text: &str, ideas: &str, options: &ScriptOptions) -> Result<String> {
        let body = json!({
            "text": article_text,
            "ideas": ideas,
            "duration": options.duration_secs,
            "tone": options.tone,
        });
        self.post_data("script", body).await
    }

    async fn audio(&self, script: &str, options: &AudioOptions) -> Result<Bytes> {
        let body = json!({
            "scriptText": script,
            "ttsOptions": { "voice": options.voice.as_str(), "model": options.model },
        });
        Ok(self.post("audio", body).await?.bytes().await?)
    }
}
