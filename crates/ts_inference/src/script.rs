use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error, info};
use ts_core::models::{ChatMessage, CompletionRequest};
use ts_core::text::{char_len, truncate_at_sentence};
use ts_core::types::{DEFAULT_SCRIPT_DURATION_SECS, DEFAULT_TONE};
use ts_core::{ChatModel, Error, Result, Script};

pub const MAX_ARTICLE_CHARS: usize = 6000;
pub const MAX_IDEA_CHARS: usize = 1000;
pub const MAX_OUTPUT_TOKENS: u32 = 1500;
pub const TEMPERATURE: f32 = 0.6;

lazy_static! {
    static ref PREAMBLES: Vec<Regex> = [
        r"(?i)^here['’]?s?\s+the\s+(final\s+)?script(\s*text)?\s*:",
        r"(?i)^here\s+is\s+the\s+script\s*:",
        r"(?i)^script\s*:",
        r"(?i)^the\s+(final\s+)?script\s+is\s*:",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

/// What the script stage is asked to write.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBrief {
    pub article_text: String,
    pub ideas: String,
    pub duration_secs: Option<u32>,
    pub tone: Option<String>,
}

impl ScriptBrief {
    /// Requested duration, with zero treated as unset.
    pub fn duration(&self) -> u32 {
        self.duration_secs
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_SCRIPT_DURATION_SECS)
    }

    pub fn tone(&self) -> &str {
        self.tone
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TONE)
    }
}

/// Output token budget for a script of `duration_secs`: `ceil(d * 3.3) + 150`, capped.
pub fn token_budget(duration_secs: u32) -> u32 {
    let spoken = (u64::from(duration_secs) * 33).div_ceil(10);
    (spoken + 150).min(u64::from(MAX_OUTPUT_TOKENS)) as u32
}

/// Writes a voiceover script from an article and its idea brief.
pub struct ScriptWriter {
    model: Arc<dyn ChatModel>,
}

impl ScriptWriter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn write(&self, brief: &ScriptBrief) -> Result<Script> {
        if brief.article_text.trim().is_empty() || brief.ideas.trim().is_empty() {
            return Err(Error::Validation(
                "Missing or invalid 'text' or 'ideas' in request body.".to_string(),
            ));
        }

        let duration = brief.duration();
        let tone = brief.tone().to_string();
        info!("✍️ Writing script (duration {}s, tone {})", duration, tone);

        let request = build_request(brief);
        debug!("✍️ Script token budget: {}", request.max_tokens);

        let raw = self
            .model
            .complete(&request)
            .await?
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                error!("✍️ {} returned no script", self.model.name());
                Error::EmptyResponse("Failed to parse script from AI response.".to_string())
            })?;

        let text = clean_script(&raw);
        if text.is_empty() {
            return Err(Error::EmptyResponse(
                "Failed to parse script from AI response.".to_string(),
            ));
        }
        info!("✨ Script written ({} characters)", char_len(&text));

        Ok(Script {
            text,
            duration_secs: duration,
            tone,
        })
    }
}

pub fn build_request(brief: &ScriptBrief) -> CompletionRequest {
    let article = truncate_at_sentence(&brief.article_text, MAX_ARTICLE_CHARS);
    let ideas = truncate_at_sentence(&brief.ideas, MAX_IDEA_CHARS);
    if article.len() < brief.article_text.len() || ideas.len() < brief.ideas.len() {
        info!(
            "✂️ Truncating script inputs (article {} -> {}, ideas {} -> {})",
            char_len(&brief.article_text),
            char_len(article),
            char_len(&brief.ideas),
            char_len(ideas)
        );
    }

    let duration = brief.duration();
    CompletionRequest {
        messages: vec![ChatMessage::user(prompt(article, ideas, duration, brief.tone()))],
        temperature: TEMPERATURE,
        max_tokens: token_budget(duration),
        top_p: 1.0,
    }
}

fn prompt(article: &str, ideas: &str, duration: u32, tone: &str) -> String {
    format!(
        r#"
You are a scriptwriter creating concise and engaging voiceover scripts for short social media videos (like TikTok) based on news articles and provided creative ideas.

**Instructions:**
1.  Review the "Article Content" for factual information.
2.  Review the "Content Ideas" (hook, points, titles) for creative direction.
3.  Write a complete voiceover script, approximately **{duration} seconds** long when read aloud at a moderate pace. Adjust the level of detail and number of points covered to fit this duration.
4.  Use the provided "Catchy Hook" at the beginning and weave the "Key Talking Points" into the main body. Keep the script factually accurate according to the "Article Content".
5.  Maintain a **{tone}** tone throughout the script.
6.  End with the suggested "Call to Action (CTA)" from the ideas, or a similar one.
7.  **IMPORTANT: Your entire response MUST consist ONLY of the script text itself.** No headings, explanations, markdown, introductory sentences (like "Here is the script...") or concluding remarks. The output must be ready for text-to-speech conversion.

**Article Content:**
---
{article}
---

**Content Ideas:**
---
{ideas}
---

**Generated Script:**
"#
    )
}

/// Strips wrapping quotes, bold markers and a leading "Here's the script:" style line.
pub fn clean_script(raw: &str) -> String {
    let mut script = raw.trim();
    if script.len() >= 2 && script.starts_with('"') && script.ends_with('"') {
        script = &script[1..script.len() - 1];
    }
    let script = script.replace("**", "");

    let first_line = script.split('\n').next().unwrap_or_default();
    if PREAMBLES.iter().any(|p| p.is_match(first_line)) {
        debug!("✍️ Removing preamble line: {:?}", first_line);
        return script
            .split_once('\n')
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();
    }
    script
}
