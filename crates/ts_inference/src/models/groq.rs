use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};
use ts_core::config::ChatConfig;
use ts_core::models::{ChatMessage, CompletionRequest};
use ts_core::{ChatModel, Error, Result};

use super::provider_error_message;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client, pointed at Groq by default.
pub struct GroqChatModel {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GroqChatModel {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &ChatConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

impl fmt::Debug for GroqChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqChatModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl ChatModel for GroqChatModel {
    fn name(&self) -> &str {
        "Groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("🔑 GROQ_API_KEY not configured");
            return Err(Error::Config(
                "Server configuration error: AI service unavailable.".to_string(),
            ));
        };

        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stream: false,
        };
        debug!("🧠 Sending chat completion to {} (model {}, max_tokens {})", self.name(), self.model, request.max_tokens);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Groq request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let raw = response.text().await.unwrap_or_default();
            let message = provider_error_message("Groq", "Groq", status, &raw);
            error!("🧠 {}", message);
            return Err(Error::Upstream { status, message });
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use ts_core::ErrorKind;

    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/openai/v1", addr)
    }

    fn config(base_url: &str, key: Option<&str>) -> ChatConfig {
        ChatConfig {
            api_key: key.map(str::to_string),
            base_url: base_url.to_string(),
            model: "llama-3.1-8b-instant".to_string(),
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 350,
            top_p: 1.0,
        }
    }

    #[tokio::test]
    async fn test_sends_openai_shaped_request() {
        let router = Router::new().route(
            "/openai/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers["authorization"].to_str().unwrap().to_string();
                let echo = format!(
                    "{} {} {} {} {} {}",
                    auth,
                    body["model"].as_str().unwrap(),
                    body["messages"][0]["role"].as_str().unwrap(),
                    body["messages"][1]["content"].as_str().unwrap(),
                    body["max_tokens"],
                    body["stream"],
                );
                Json(json!({ "choices": [{ "index": 0, "message": { "role": "assistant", "content": echo } }] }))
            }),
        );
        let base = spawn_provider(router).await;
        let model = GroqChatModel::new(&config(&base, Some("gsk-test"))).unwrap();

        let reply = model.complete(&request()).await.unwrap().unwrap();
        assert_eq!(reply, "Bearer gsk-test llama-3.1-8b-instant system hello 350 false");
    }

    #[tokio::test]
    async fn test_missing_content_is_none() {
        let router = Router::new().route(
            "/openai/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let base = spawn_provider(router).await;
        let model = GroqChatModel::new(&config(&base, Some("gsk-test"))).unwrap();
        assert_eq!(model.complete(&request()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let model = GroqChatModel::new(&config("http://127.0.0.1:9", None)).unwrap();
        let err = model.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_api_errors_are_annotated() {
        for (code, suffix) in [(401, " Check Groq API Key."), (429, " Rate limit hit."), (400, "")] {
            let router = Router::new().route(
                "/openai/v1/chat/completions",
                post(move || async move {
                    (
                        StatusCode::from_u16(code).unwrap(),
                        Json(json!({ "error": { "message": "nope", "type": "invalid_request_error" } })),
                    )
                }),
            );
            let base = spawn_provider(router).await;
            let err = GroqChatModel::new(&config(&base, Some("gsk-test")))
                .unwrap()
                .complete(&request())
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(code));
            assert_eq!(err.to_string(), format!("Groq API Error ({}): nope{}", code, suffix));
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let model = GroqChatModel::with_timeout(&config("http://127.0.0.1:9", Some("k")), Duration::from_millis(200)).unwrap();
        let err = model.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
