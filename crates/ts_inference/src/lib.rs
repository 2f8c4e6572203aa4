pub mod audio;
pub mod ideas;
pub mod models;
pub mod script;

pub use audio::{AudioGenerator, SynthesizedAudio, TtsOptions};
pub use ideas::IdeaGenerator;
pub use models::{create_chat_model, create_speech_model};
pub use script::{ScriptBrief, ScriptWriter};

pub mod prelude {
    pub use super::audio::{AudioGenerator, TtsOptions};
    pub use super::ideas::IdeaGenerator;
    pub use super::models::{create_chat_model, create_speech_model};
    pub use super::script::{ScriptBrief, ScriptWriter};
    pub use ts_core::{ChatModel, Error, Result, SpeechModel};
}
