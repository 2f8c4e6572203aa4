use axum::{
    body::{Body, Bytes},
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use ts_core::types::{audio_file_name, MAX_TREND_LIMIT};
use ts_core::{Error, Stage, TrendItem, TrendQuery};
use ts_inference::{ScriptBrief, TtsOptions};
use ts_news::extract::validate_url;

use crate::error::ApiError;
use crate::state::{AppState, ProviderStatus};

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    fn json(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendsParams {
    pub keywords: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

impl TrendsParams {
    /// Collects raw query pairs. Unknown keys are ignored, a repeated key is rejected.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, Error> {
        let mut params = TrendsParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "keywords" => &mut params.keywords,
                "country" => &mut params.country,
                "category" => &mut params.category,
                "limit" => &mut params.limit,
                "sortBy" => &mut params.sort_by,
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(Error::Validation(format!("Duplicate '{}' parameter.", key)));
            }
        }
        Ok(params)
    }

    pub fn into_query(self) -> Result<TrendQuery, Error> {
        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        let mut query = TrendQuery::default();
        if let Some(limit) = non_blank(self.limit) {
            let parsed: i64 = limit.parse().map_err(|_| {
                Error::Validation(format!("Invalid 'limit' parameter: {:?}", limit))
            })?;
            query.limit = parsed.clamp(1, i64::from(MAX_TREND_LIMIT)) as u32;
        }
        query.keywords = non_blank(self.keywords);
        if let Some(country) = non_blank(self.country) {
            query.country = country;
        }
        if let Some(category) = non_blank(self.category) {
            query.category = category;
        }
        query.sort_by = non_blank(self.sort_by);
        Ok(query)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractBody {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdeasBody {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptBody {
    pub text: Option<String>,
    pub ideas: Option<String>,
    pub tone: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TtsOptionsBody {
    pub voice: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBody {
    pub script_text: Option<String>,
    #[serde(default)]
    pub tts_options: Option<TtsOptionsBody>,
}

/// Request bodies are parsed by hand so malformed JSON maps onto the `{error}` shape.
fn parse_body<T: DeserializeOwned>(stage: Stage, body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("🧾 Rejecting {} body: {}", stage, e);
        ApiError::new(stage, Error::Validation(format!("Invalid JSON request body: {}", e)))
    })
}

fn required(stage: Stage, value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::new(stage, Error::Validation(message.to_string())))
}

pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<TrendItem>>>, ApiError> {
    let Query(pairs) = query.map_err(|e| {
        debug!("🧾 Rejecting trends query: {}", e);
        ApiError::new(Stage::Trends, Error::Validation(format!("Invalid query string: {}", e.body_text())))
    })?;
    let query = TrendsParams::from_pairs(pairs)
        .and_then(TrendsParams::into_query)
        .map_err(|e| ApiError::new(Stage::Trends, e))?;
    let items = state
        .news
        .search(&query)
        .await
        .map_err(|e| ApiError::new(Stage::Trends, e))?;
    info!("📰 Returning {} trend items from {}", items.len(), state.news.name());
    Ok(DataResponse::json(items))
}

pub async fn extract_article(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DataResponse<String>>, ApiError> {
    let body: ExtractBody = parse_body(Stage::Extract, &body)?;
    let url = required(Stage::Extract, body.url, "Missing or invalid 'url' in request body.")?;
    validate_url(&url).map_err(|e| ApiError::new(Stage::Extract, e))?;

    let document = state
        .extractor
        .extract(&url)
        .await
        .map_err(|e| ApiError::new(Stage::Extract, e))?;
    Ok(DataResponse::json(document.text))
}

pub async fn generate_ideas(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DataResponse<String>>, ApiError> {
    let body: IdeasBody = parse_body(Stage::Ideas, &body)?;
    let text = required(Stage::Ideas, body.text, "Missing or empty article content")?;

    let ideas = state
        .ideas
        .generate(&text)
        .await
        .map_err(|e| ApiError::new(Stage::Ideas, e))?;
    Ok(DataResponse::json(ideas.text))
}

pub async fn generate_script(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DataResponse<String>>, ApiError> {
    let body: ScriptBody = parse_body(Stage::Script, &body)?;
    let brief = ScriptBrief {
        article_text: body.text.unwrap_or_default(),
        ideas: body.ideas.unwrap_or_default(),
        duration_secs: body.duration,
        tone: body.tone,
    };

    let script = state
        .scripts
        .write(&brief)
        .await
        .map_err(|e| ApiError::new(Stage::Script, e))?;
    Ok(DataResponse::json(script.text))
}

pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body: AudioBody = parse_body(Stage::Audio, &body)?;
    let options = body.tts_options.unwrap_or_default();
    let options = TtsOptions {
        voice: options.voice,
        model: options.model,
    };

    let audio = state
        .audio
        .generate(body.script_text.as_deref().unwrap_or_default(), &options)
        .await
        .map_err(|e| ApiError::new(Stage::Audio, e))?;

    let disposition = format!("attachment; filename=\"{}\"", audio_file_name(Utc::now()));
    info!("🎧 Streaming audio ({}, {})", audio.voice, audio.model);
    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(audio.stream),
    )
        .into_response())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<ProviderStatus> {
    Json(state.providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>) -> TrendsParams {
        TrendsParams {
            limit: limit.map(str::to_string),
            ..TrendsParams::default()
        }
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!(params(None).into_query().unwrap().limit, 10);
        assert_eq!(params(Some("25")).into_query().unwrap().limit, 25);
        assert_eq!(params(Some("0")).into_query().unwrap().limit, 1);
        assert_eq!(params(Some("-4")).into_query().unwrap().limit, 1);
        assert_eq!(params(Some("5000")).into_query().unwrap().limit, 100);
        assert!(params(Some("ten")).into_query().is_err());
    }

    #[test]
    fn test_query_pairs() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        let params = TrendsParams::from_pairs(vec![
            pair("sortBy", "popularity"),
            pair("limit", "5"),
            pair("page", "3"),
        ])
        .unwrap();
        assert_eq!(params.sort_by.as_deref(), Some("popularity"));
        assert_eq!(params.limit.as_deref(), Some("5"));

        let err = TrendsParams::from_pairs(vec![pair("limit", "1"), pair("limit", "2")]).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate 'limit' parameter.");
    }

    #[test]
    fn test_blank_fields_fall_back_to_defaults() {
        let query = TrendsParams {
            keywords: Some("  ".to_string()),
            country: Some("".to_string()),
            category: Some("science".to_string()),
            ..TrendsParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.keywords, None);
        assert_eq!(query.country, "us");
        assert_eq!(query.category, "science");
    }
}
