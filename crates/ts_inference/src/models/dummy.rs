use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::fmt;
use std::sync::Mutex;
use ts_core::models::{CompletionRequest, SpeechRequest};
use ts_core::{AudioStream, ChatModel, Result, SpeechModel};

/// Offline chat model that answers with a fixed reply and remembers what it was asked.
pub struct DummyChatModel {
    reply: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl fmt::Debug for DummyChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyChatModel").field("reply", &self.reply).finish()
    }
}

impl DummyChatModel {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests().pop()
    }
}

#[async_trait::async_trait]
impl ChatModel for DummyChatModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(self.reply.clone())
    }
}

/// Offline speech model that replays fixed chunks.
pub struct DummySpeechModel {
    chunks: Vec<Bytes>,
    requests: Mutex<Vec<SpeechRequest>>,
}

impl fmt::Debug for DummySpeechModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummySpeechModel")
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl DummySpeechModel {
    pub fn new(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<SpeechRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait::async_trait]
impl SpeechModel for DummySpeechModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let chunks: Vec<Result<Bytes>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(stream::iter(chunks).boxed())
    }
}
