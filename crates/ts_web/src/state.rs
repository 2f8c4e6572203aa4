use serde::Serialize;
use std::sync::Arc;
use ts_core::config::SpeechConfig;
use ts_core::{ArticleExtractor, ChatModel, Config, NewsSource, Result, SpeechModel};
use ts_inference::{create_chat_model, create_speech_model, AudioGenerator, IdeaGenerator, ScriptWriter};
use ts_news::{HttpArticleExtractor, NewsApiClient};

/// Which provider credentials are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub news: bool,
    pub chat: bool,
    pub speech: bool,
}

impl ProviderStatus {
    pub fn from_config(config: &Config) -> Self {
        Self {
            news: config.news.api_key.is_some(),
            chat: config.chat.api_key.is_some(),
            speech: config.speech.api_key.is_some(),
        }
    }
}

pub struct AppState {
    pub news: Arc<dyn NewsSource>,
    pub extractor: Arc<dyn ArticleExtractor>,
    pub ideas: IdeaGenerator,
    pub scripts: ScriptWriter,
    pub audio: AudioGenerator,
    pub providers: ProviderStatus,
}

impl AppState {
    pub fn new(
        news: Arc<dyn NewsSource>,
        extractor: Arc<dyn ArticleExtractor>,
        chat: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechModel>,
        speech_config: &SpeechConfig,
    ) -> Self {
        Self {
            news,
            extractor,
            ideas: IdeaGenerator::new(chat.clone()),
            scripts: ScriptWriter::new(chat),
            audio: AudioGenerator::new(speech, speech_config),
            providers: ProviderStatus {
                news: true,
                chat: true,
                speech: true,
            },
        }
    }

    /// Wires the real provider clients. Missing credentials surface per request, not here.
    pub fn from_config(config: &Config) -> Result<Self> {
        let state = Self::new(
            Arc::new(NewsApiClient::new(&config.news)?),
            Arc::new(HttpArticleExtractor::new()?),
            create_chat_model(config)?,
            create_speech_model(config)?,
            &config.speech,
        );
        Ok(state.with_providers(ProviderStatus::from_config(config)))
    }

    pub fn with_providers(mut self, providers: ProviderStatus) -> Self {
        self.providers = providers;
        self
    }
}
