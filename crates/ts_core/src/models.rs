use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ExtractedDocument, TrendItem, TrendQuery, Voice};
use crate::Result;

/// Binary audio as it arrives from the speech provider.
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single-turn, non-streaming chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub input: String,
    pub voice: Voice,
    pub model: String,
}

/// News search provider.
#[async_trait]
pub trait NewsSource: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Runs a trends query, preserving provider order.
    async fn search(&self, query: &TrendQuery) -> Result<Vec<TrendItem>>;
}

/// Main-content extraction for a single article URL.
#[async_trait]
pub trait ArticleExtractor: Send + Sync + fmt::Debug {
    async fn extract(&self, url: &str) -> Result<ExtractedDocument>;
}

/// Chat-completion provider.
#[async_trait]
pub trait ChatModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Returns the first choice's text content, or `None` when the provider sent none.
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>>;
}

/// Text-to-speech provider.
#[async_trait]
pub trait SpeechModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioStream>;
}
