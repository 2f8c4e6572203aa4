use std::sync::Arc;
use tracing::{error, info};
use ts_core::models::{ChatMessage, CompletionRequest};
use ts_core::text::{char_len, truncate_at_sentence};
use ts_core::{ChatModel, Error, IdeaSet, Result};

pub const MAX_ARTICLE_CHARS: usize = 7000;
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 350;

const SYSTEM_PROMPT: &str = "You are a helpful assistant creating TikTok video ideas from news text.";

/// Turns extracted article text into a creative brief.
pub struct IdeaGenerator {
    model: Arc<dyn ChatModel>,
}

impl IdeaGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn generate(&self, article_text: &str) -> Result<IdeaSet> {
        if article_text.trim().is_empty() {
            return Err(Error::Validation("Missing or empty article content".to_string()));
        }

        let request = build_request(article_text);
        info!("💡 Generating ideas with {}", self.model.name());

        let ideas = self
            .model
            .complete(&request)
            .await?
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                error!("💡 {} returned no ideas", self.model.name());
                Error::EmptyResponse("Failed to parse ideas from AI response.".to_string())
            })?;

        info!("✨ Ideas received ({} characters)", char_len(&ideas));
        Ok(IdeaSet { text: ideas })
    }
}

pub fn build_request(article_text: &str) -> CompletionRequest {
    let content = truncate_at_sentence(article_text, MAX_ARTICLE_CHARS);
    if content.len() < article_text.len() {
        info!(
            "✂️ Truncating article for ideas ({} -> {} chars)",
            char_len(article_text),
            char_len(content)
        );
    }

    CompletionRequest {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt(content))],
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
        top_p: 1.0,
    }
}

fn prompt(article: &str) -> String {
    format!(
        r#"
Based on the following news article content, generate ideas for a short (15-45 second) TikTok video. Provide the following:
1.  **Catchy Hook:** A short, attention-grabbing opening line (max 10 words).
2.  **Key Talking Points:** 3 concise bullet points summarizing the core message or most interesting aspects for a TikTok audience.
3.  **Call to Action (CTA):** A simple suggestion for viewers (e.g., "What do you think?", "Follow for more!", "Check the link in bio!").
4.  **Video Title Ideas:** 3 distinct, short, engaging title options suitable for TikTok.

Format the output clearly with headings for each section (use markdown bold for headings like **Catchy Hook:**). Ensure the ideas are directly based on the provided content.

**Article Content:**
---
{article}
---
"#
    )
}
