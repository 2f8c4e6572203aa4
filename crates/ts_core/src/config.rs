use std::env;
use std::fmt;

use crate::types::{Voice, DEFAULT_TTS_MODEL};

pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2/";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// News search provider settings.
#[derive(Clone, PartialEq)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Chat-completion provider settings.
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Text-to-speech provider settings.
#[derive(Clone, PartialEq)]
pub struct SpeechConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_voice: Voice,
    pub default_model: String,
}

/// Process-wide configuration, built once and handed to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub news: NewsConfig,
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    pub addr: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_NEWS_BASE_URL.to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            default_voice: Voice::Nova,
            default_model: DEFAULT_TTS_MODEL.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            news: NewsConfig::default(),
            chat: ChatConfig::default(),
            speech: SpeechConfig::default(),
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if present.
    ///
    /// Missing credentials are not an error here; the stage that needs one
    /// reports it when invoked.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let default_voice = match get("TTS_DEFAULT_VOICE") {
            Some(v) => v.parse().unwrap_or_else(|_| {
                tracing::warn!("⚠️ Unknown TTS_DEFAULT_VOICE {:?}, using {}", v, defaults.speech.default_voice);
                defaults.speech.default_voice
            }),
            None => defaults.speech.default_voice,
        };

        Self {
            news: NewsConfig {
                api_key: get("NEWS_API_KEY"),
                base_url: get("NEWS_API_BASE_URL").unwrap_or(defaults.news.base_url),
            },
            chat: ChatConfig {
                api_key: get("GROQ_API_KEY"),
                base_url: get("GROQ_BASE_URL").unwrap_or(defaults.chat.base_url),
                model: get("GROQ_MODEL").unwrap_or(defaults.chat.model),
            },
            speech: SpeechConfig {
                api_key: get("OPENAI_API_KEY"),
                base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.speech.base_url),
                default_voice,
                default_model: get("TTS_DEFAULT_MODEL").unwrap_or(defaults.speech.default_model),
            },
            addr: get("TRENDSPARK_ADDR").unwrap_or(defaults.addr),
        }
    }
}

fn redacted(key: &Option<String>) -> Option<&'static str> {
    key.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_voice", &self.default_voice)
            .field("default_model", &self.default_model)
            .finish()
    }
}
