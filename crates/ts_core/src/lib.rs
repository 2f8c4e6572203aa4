pub mod config;
pub mod error;
pub mod models;
pub mod text;
pub mod types;

pub use config::Config;
pub use error::{Error, ErrorKind};
pub use models::{ArticleExtractor, AudioStream, ChatModel, NewsSource, SpeechModel};
pub use types::{
    AudioAsset, ExtractedDocument, IdeaSet, Script, Stage, TrendItem, TrendQuery, Voice,
};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::types::*;
    pub use crate::{Config, Error, ErrorKind, Result};
}
