use std::sync::Arc;
use ts_core::{ChatModel, Config, Result, SpeechModel};

pub mod dummy;
pub mod groq;
pub mod openai;

pub use dummy::{DummyChatModel, DummySpeechModel};
pub use groq::GroqChatModel;
pub use openai::OpenAiSpeechModel;

/// Builds the chat model described by `config`. A missing key is reported on first use.
pub fn create_chat_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(GroqChatModel::new(&config.chat)?))
}

pub fn create_speech_model(config: &Config) -> Result<Arc<dyn SpeechModel>> {
    Ok(Arc::new(OpenAiSpeechModel::new(&config.speech)?))
}

/// Formats a provider error body as `"<label> API Error (<status>): <message>"`,
/// with a hint appended for authentication and rate-limit failures.
pub(crate) fn provider_error_message(label: &str, key_name: &str, status: u16, raw_body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(raw_body)
        .ok()
        .and_then(|body| {
            body.pointer("/error/message")
                .or_else(|| body.get("message"))
                .or_else(|| body.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .or_else(|| Some(raw_body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| "request failed".to_string());

    let mut message = format!("{} API Error ({}): {}", label, status, detail);
    match status {
        401 => message.push_str(&format!(" Check {} API Key.", key_name)),
        429 => message.push_str(" Rate limit hit."),
        _ => {}
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message_shapes() {
        assert_eq!(
            provider_error_message("Groq", "Groq", 401, r#"{"error":{"message":"Invalid API Key"}}"#),
            "Groq API Error (401): Invalid API Key Check Groq API Key."
        );
        assert_eq!(
            provider_error_message("OpenAI", "OpenAI", 500, r#"{"message":"boom"}"#),
            "OpenAI API Error (500): boom"
        );
        assert_eq!(
            provider_error_message("Groq", "Groq", 503, "upstream down"),
            "Groq API Error (503): upstream down"
        );
        assert_eq!(
            provider_error_message("Groq", "Groq", 429, ""),
            "Groq API Error (429): request failed Rate limit hit."
        );
    }

    #[test]
    fn test_factories_defer_missing_keys() {
        let config = Config::default();
        let chat = create_chat_model(&config).unwrap();
        let speech = create_speech_model(&config).unwrap();
        assert_eq!(chat.name(), "Groq");
        assert_eq!(speech.name(), "OpenAI TTS");
    }
}
