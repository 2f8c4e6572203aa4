use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};
use ts_core::config::NewsConfig;
use ts_core::{Error, NewsSource, Result, TrendItem, TrendQuery};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Deserialize)]
struct NewsApiResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<NewsApiSource>,
    published_at: Option<String>,
    author: Option<String>,
    url_to_image: Option<String>,
}

#[derive(Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<NewsApiArticle> for TrendItem {
    fn from(article: NewsApiArticle) -> Self {
        TrendItem {
            title: present(article.title),
            description: present(article.description),
            url: present(article.url),
            source: present(article.source.and_then(|s| s.name)),
            published_at: article
                .published_at
                .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
            author: present(article.author),
            image_url: present(article.url_to_image),
            selected: false,
        }
    }
}

/// Client for a NewsAPI-compatible news search service.
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &NewsConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Endpoint path and query parameters for `query`.
    fn request_parts(query: &TrendQuery, api_key: &str) -> (&'static str, Vec<(&'static str, String)>) {
        let mut params = vec![
            ("apiKey", api_key.to_string()),
            ("pageSize", query.clamped_limit().to_string()),
        ];
        match query.search_terms() {
            Some(terms) => {
                params.push(("q", terms.to_string()));
                params.push(("sortBy", query.effective_sort().to_string()));
                params.push(("language", "en".to_string()));
                ("everything", params)
            }
            None => {
                params.push(("country", query.country.clone()));
                params.push(("category", query.category.clone()));
                ("top-headlines", params)
            }
        }
    }
}

/// Human-readable message for a failed provider status.
fn status_message(status: u16, provider_message: Option<String>) -> String {
    match status {
        401 => "Unauthorized - Check News API Key.".to_string(),
        429 => "Too Many Requests - NewsAPI rate limit hit.".to_string(),
        400 => "Bad Request (400) to NewsAPI: Check parameters.".to_string(),
        426 => "Upgrade Required (426): NewsAPI requires HTTPS.".to_string(),
        _ => provider_message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("NewsAPI request failed with status {}.", status)),
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn search(&self, query: &TrendQuery) -> Result<Vec<TrendItem>> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("🔑 NEWS_API_KEY not configured");
            return Err(Error::Config(
                "Server configuration error: News API Key is missing.".to_string(),
            ));
        };

        let (path, params) = Self::request_parts(query, api_key);
        info!(
            "📰 Querying {} '{}' (limit {}, keywords {:?})",
            self.name(),
            path,
            query.clamped_limit(),
            query.search_terms()
        );

        let response = self
            .client
            .get(self.endpoint(path))
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!("🌐 No response from {}: {}", self.name(), e);
                Error::Network("Network error or timeout contacting News API.".to_string())
            })?;

        let status = response.status().as_u16();
        let body: Option<NewsApiResponse> = match response.json().await {
            Ok(body) => Some(body),
            Err(e) if e.is_timeout() => {
                error!("🌐 Timed out reading {} response: {}", self.name(), e);
                return Err(Error::Network(
                    "Network error or timeout contacting News API.".to_string(),
                ));
            }
            Err(e) => {
                warn!("📰 Unreadable {} body: {}", self.name(), e);
                None
            }
        };

        if !(200..300).contains(&status) {
            let message = status_message(status, body.and_then(|b| b.message));
            error!("📰 {} answered {}: {}", self.name(), status, message);
            return Err(Error::Upstream { status, message });
        }

        let body = body.ok_or_else(|| Error::Upstream {
            status: 502,
            message: "NewsAPI returned an unreadable response.".to_string(),
        })?;
        if body.status.as_deref() != Some("ok") {
            let message = body.message.unwrap_or_else(|| {
                format!("API returned status: {}", body.status.as_deref().unwrap_or("unknown"))
            });
            error!("📰 {} returned non-ok status: {}", self.name(), message);
            return Err(Error::Upstream { status: 502, message });
        }

        let limit = query.clamped_limit() as usize;
        let items: Vec<TrendItem> = body.articles.into_iter().take(limit).map(TrendItem::from).collect();
        info!("✨ {} returned {} articles", self.name(), items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::body::{Body, Bytes};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use futures_util::stream::{self, StreamExt};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use ts_core::types::{NewsCategory, NewsCountry};
    use ts_core::ErrorKind;

    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v2/", addr)
    }

    fn config(base_url: &str) -> NewsConfig {
        NewsConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
        }
    }

    fn article(n: usize) -> Value {
        json!({
            "source": { "id": null, "name": format!("Source {}", n) },
            "author": null,
            "title": format!("Headline {}", n),
            "description": "",
            "url": format!("https://news.example/{}", n),
            "urlToImage": null,
            "publishedAt": "2024-03-01T08:30:00Z",
            "content": "..."
        })
    }

    /// Echoes the received query back in the first article's description.
    fn echo_router() -> Router {
        Router::new()
            .route(
                "/v2/top-headlines",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let size: usize = params["pageSize"].parse().unwrap();
                    let mut articles: Vec<Value> = (0..size + 5).map(article).collect();
                    articles[0]["description"] = json!(format!(
                        "top-headlines {} {} {}",
                        params["country"], params["category"], params["apiKey"]
                    ));
                    Json(json!({ "status": "ok", "totalResults": 99, "articles": articles }))
                }),
            )
            .route(
                "/v2/everything",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let mut first = article(0);
                    first["description"] = json!(format!(
                        "everything {} {} {}",
                        params["q"], params["sortBy"], params["language"]
                    ));
                    Json(json!({ "status": "ok", "articles": [first] }))
                }),
            )
    }

    #[tokio::test]
    async fn test_headlines() {
        let base = spawn_provider(echo_router()).await;
        let client = NewsApiClient::new(&config(&base)).unwrap();
        let query = TrendQuery::headlines(NewsCategory::Technology, NewsCountry::Us).with_limit(10);

        let items = client.search(&query).await.unwrap();
        assert!(items.len() <= 10);
        assert_eq!(items[0].description.as_deref(), Some("top-headlines us technology test-key"));
        for (i, item) in items.iter().enumerate() {
            assert!(item.title.is_some());
            assert!(item.url.is_some());
            if i > 0 {
                assert_eq!(item.title.as_deref(), Some(format!("Headline {}", i).as_str()));
                assert!(item.description.is_none());
            }
            assert!(item.author.is_none());
            assert!(item.published_at.is_some());
        }
    }

    #[tokio::test]
    async fn test_keyword_search() {
        let base = spawn_provider(echo_router()).await;
        let client = NewsApiClient::new(&config(&base)).unwrap();

        let items = client.search(&TrendQuery::keywords(" climate ")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description.as_deref(), Some("everything climate relevancy en"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = NewsApiClient::new(&NewsConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/".to_string(),
        })
        .unwrap();
        let err = client.search(&TrendQuery::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (401, "Unauthorized - Check News API Key."),
            (429, "Too Many Requests - NewsAPI rate limit hit."),
            (400, "Bad Request (400) to NewsAPI: Check parameters."),
            (426, "Upgrade Required (426): NewsAPI requires HTTPS."),
            (500, "provider exploded"),
        ];
        for (code, expected) in cases {
            let router = Router::new().route(
                "/v2/top-headlines",
                get(move || async move {
                    (
                        StatusCode::from_u16(code).unwrap(),
                        Json(json!({ "status": "error", "code": "x", "message": "provider exploded" })),
                    )
                }),
            );
            let base = spawn_provider(router).await;
            let err = NewsApiClient::new(&config(&base))
                .unwrap()
                .search(&TrendQuery::default())
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(code));
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_non_ok_body() {
        let router = Router::new().route(
            "/v2/top-headlines",
            get(|| async { Json(json!({ "status": "error", "message": "apiKeyDisabled" })) }),
        );
        let base = spawn_provider(router).await;
        let err = NewsApiClient::new(&config(&base))
            .unwrap()
            .search(&TrendQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.to_string(), "apiKeyDisabled");
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let router = Router::new().route(
            "/v2/top-headlines",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "status": "ok", "articles": [] }))
            }),
        );
        let base = spawn_provider(router).await;
        let err = NewsApiClient::with_timeout(&config(&base), Duration::from_millis(100))
            .unwrap()
            .search(&TrendQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_stalled_body_is_network_error() {
        let router = Router::new().route(
            "/v2/top-headlines",
            get(|| async {
                let head = stream::once(async {
                    Ok::<_, std::io::Error>(Bytes::from_static(b"{\"status\":\"ok\","))
                });
                let tail = stream::once(async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Ok::<_, std::io::Error>(Bytes::from_static(b"\"articles\":[]}"))
                });
                Body::from_stream(head.chain(tail))
            }),
        );
        let base = spawn_provider(router).await;
        let err = NewsApiClient::with_timeout(&config(&base), Duration::from_millis(300))
            .unwrap()
            .search(&TrendQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = NewsApiClient::new(&config("http://localhost/")).unwrap();
        assert!(!format!("{:?}", client).contains("test-key"));
    }
}
