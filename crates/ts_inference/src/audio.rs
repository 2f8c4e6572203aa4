use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use ts_core::config::SpeechConfig;
use ts_core::models::SpeechRequest;
use ts_core::text::{char_len, truncate_at_sentence};
use ts_core::{AudioStream, Error, Result, SpeechModel, Voice};

pub const MAX_SCRIPT_CHARS: usize = 4000;

/// Caller-supplied synthesis options; both fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtsOptions {
    pub voice: Option<String>,
    pub model: Option<String>,
}

/// Audio ready to be forwarded, plus the settings actually used.
pub struct SynthesizedAudio {
    pub voice: Voice,
    pub model: String,
    pub stream: AudioStream,
}

/// Converts a finished script to speech.
pub struct AudioGenerator {
    model: Arc<dyn SpeechModel>,
    default_voice: Voice,
    default_model: String,
}

impl AudioGenerator {
    pub fn new(model: Arc<dyn SpeechModel>, config: &SpeechConfig) -> Self {
        Self {
            model,
            default_voice: config.default_voice,
            default_model: config.default_model.clone(),
        }
    }

    pub fn default_voice(&self) -> Voice {
        self.default_voice
    }

    /// Builds the provider request: unknown voices fall back to the default, long scripts are cut.
    pub fn request(&self, script: &str, options: &TtsOptions) -> Result<SpeechRequest> {
        if script.trim().is_empty() {
            return Err(Error::Validation(
                "Missing or invalid 'scriptText' in request body.".to_string(),
            ));
        }

        let voice = Voice::resolve(options.voice.as_deref(), self.default_voice);
        if let Some(requested) = options.voice.as_deref() {
            if Voice::exact(requested).is_none() {
                warn!("🔊 Unknown voice {:?}, using {}", requested, voice);
            }
        }
        let model = options
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
            .to_string();

        let input = truncate_at_sentence(script, MAX_SCRIPT_CHARS);
        if input.len() < script.len() {
            info!("✂️ Truncating script for speech ({} -> {} chars)", char_len(script), char_len(input));
        }

        Ok(SpeechRequest {
            input: input.to_string(),
            voice,
            model,
        })
    }

    pub async fn generate(&self, script: &str, options: &TtsOptions) -> Result<SynthesizedAudio> {
        let request = self.request(script, options)?;
        info!("🔊 Generating audio with voice {}, model {}", request.voice, request.model);

        let stream = self.model.synthesize(&request).await?;
        let stream = ensure_not_empty(stream).await?;

        Ok(SynthesizedAudio {
            voice: request.voice,
            model: request.model,
            stream,
        })
    }
}

/// Waits for the first non-empty chunk so an empty body can be reported before any bytes are sent.
async fn ensure_not_empty(mut stream: AudioStream) -> Result<AudioStream> {
    let first: Bytes = loop {
        match stream.next().await {
            Some(Ok(chunk)) if chunk.is_empty() => continue,
            Some(Ok(chunk)) => break chunk,
            Some(Err(e)) => return Err(e),
            None => {
                warn!("🔊 Speech provider returned no audio");
                return Err(Error::EmptyStream(
                    "Audio service returned an empty audio stream.".to_string(),
                ));
            }
        }
    };
    Ok(stream::once(async move { Ok(first) }).chain(stream).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummySpeechModel;
    use futures_util::TryStreamExt;
    use ts_core::ErrorKind;

    fn generator(chunks: Vec<&'static str>) -> (Arc<DummySpeechModel>, AudioGenerator) {
        let model = Arc::new(DummySpeechModel::new(
            chunks
                .into_iter()
                .map(|c| Bytes::from_static(c.as_bytes()))
                .collect(),
        ));
        let generator = AudioGenerator::new(model.clone(), &SpeechConfig::default());
        (model, generator)
    }

    #[test]
    fn test_voice_fallback() {
        let (_, generator) = generator(vec![]);
        let options = TtsOptions {
            voice: Some("invalid-voice".to_string()),
            model: None,
        };
        let request = generator.request("Hello.", &options).unwrap();
        assert_eq!(request.voice, Voice::Nova);
        assert_eq!(request.model, "tts-1");

        let options = TtsOptions {
            voice: Some("onyx".to_string()),
            model: Some("tts-1-hd".to_string()),
        };
        let request = generator.request("Hello.", &options).unwrap();
        assert_eq!(request.voice, Voice::Onyx);
        assert_eq!(request.model, "tts-1-hd");
    }

    #[test]
    fn test_voice_names_are_case_sensitive() {
        let (_, generator) = generator(vec![]);
        let options = TtsOptions {
            voice: Some("SHIMMER".to_string()),
            model: None,
        };
        let request = generator.request("Hello.", &options).unwrap();
        assert_eq!(request.voice, Voice::Nova);

        let options = TtsOptions {
            voice: Some("shimmer".to_string()),
            model: None,
        };
        let request = generator.request("Hello.", &options).unwrap();
        assert_eq!(request.voice, Voice::Shimmer);
    }

    #[test]
    fn test_deployment_default_voice() {
        let config = SpeechConfig {
            default_voice: Voice::Alloy,
            ..SpeechConfig::default()
        };
        let generator = AudioGenerator::new(Arc::new(DummySpeechModel::new(vec![])), &config);
        let request = generator.request("Hi.", &TtsOptions::default()).unwrap();
        assert_eq!(request.voice, Voice::Alloy);
    }

    #[test]
    fn test_long_scripts_are_truncated() {
        let (_, generator) = generator(vec![]);
        let script = "Spoken words here. ".repeat(500);
        let request = generator.request(&script, &TtsOptions::default()).unwrap();
        assert!(char_len(&request.input) <= MAX_SCRIPT_CHARS);
        assert!(request.input.ends_with('.'));
    }

    #[test]
    fn test_blank_script_is_rejected() {
        let (_, generator) = generator(vec![]);
        let err = generator.request("  ", &TtsOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_streams_all_chunks() {
        let (model, generator) = generator(vec!["", "ID3", "data"]);
        let audio = generator.generate("Hello.", &TtsOptions::default()).await.unwrap();
        assert_eq!(audio.voice, Voice::Nova);

        let bytes: Vec<Bytes> = audio.stream.try_collect().await.unwrap();
        assert_eq!(bytes.concat(), b"ID3data");
        assert_eq!(model.last_request().unwrap().input, "Hello.");
    }

    #[tokio::test]
    async fn test_empty_audio_is_empty_stream() {
        let (_, generator) = generator(vec!["", ""]);
        let err = generator
            .generate("Hello.", &TtsOptions::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::EmptyStream);
    }
}
