use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};
use ts_core::config::SpeechConfig;
use ts_core::models::SpeechRequest;
use ts_core::{AudioStream, Error, Result, SpeechModel};

use super::provider_error_message;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

/// OpenAI text-to-speech client. Audio comes back as an MPEG byte stream.
pub struct OpenAiSpeechModel {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiSpeechModel {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &SpeechConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl fmt::Debug for OpenAiSpeechModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSpeechModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl SpeechModel for OpenAiSpeechModel {
    fn name(&self) -> &str {
        "OpenAI TTS"
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioStream> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("🔑 OPENAI_API_KEY not configured");
            return Err(Error::Config(
                "Server configuration error: Audio service unavailable.".to_string(),
            ));
        };

        let body = SpeechBody {
            model: &request.model,
            voice: request.voice.as_str(),
            input: &request.input,
            response_format: "mp3",
        };
        debug!("🔊 Requesting speech from {} (voice {}, model {})", self.name(), body.voice, body.model);

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("OpenAI request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let raw = response.text().await.unwrap_or_default();
            let message = provider_error_message("OpenAI", "OpenAI", status, &raw);
            error!("🔊 {}", message);
            return Err(Error::Upstream { status, message });
        }

        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use bytes::Bytes;
    use serde_json::{json, Value};
    use ts_core::{ErrorKind, Voice};

    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1/", addr)
    }

    fn config(base_url: &str, key: Option<&str>) -> SpeechConfig {
        SpeechConfig {
            api_key: key.map(str::to_string),
            base_url: base_url.to_string(),
            ..SpeechConfig::default()
        }
    }

    fn request() -> SpeechRequest {
        SpeechRequest {
            input: "Hello there".to_string(),
            voice: Voice::Fable,
            model: "tts-1".to_string(),
        }
    }

    async fn collect(stream: AudioStream) -> Vec<u8> {
        stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_streams_audio_bytes() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["voice"], "fable");
                assert_eq!(body["model"], "tts-1");
                assert_eq!(body["input"], "Hello there");
                ([("content-type", "audio/mpeg")], Bytes::from_static(b"ID3fake-mp3"))
            }),
        );
        let base = spawn_provider(router).await;
        let model = OpenAiSpeechModel::new(&config(&base, Some("sk-test"))).unwrap();

        let stream = model.synthesize(&request()).await.unwrap();
        assert_eq!(collect(stream).await, b"ID3fake-mp3");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let model = OpenAiSpeechModel::new(&config("http://127.0.0.1:9", None)).unwrap();
        let err = model.synthesize(&request()).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_rate_limit_is_annotated() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": { "message": "slow down" } })),
                )
            }),
        );
        let base = spawn_provider(router).await;
        let err = OpenAiSpeechModel::new(&config(&base, Some("sk-test")))
            .unwrap()
            .synthesize(&request())
            .await
            .err().unwrap();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "OpenAI API Error (429): slow down Rate limit hit.");
    }
}
