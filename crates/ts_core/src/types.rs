use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TREND_LIMIT: u32 = 10;
pub const MAX_TREND_LIMIT: u32 = 100;
pub const DEFAULT_SCRIPT_DURATION_SECS: u32 = 90;
pub const DEFAULT_TONE: &str = "informative";
pub const DEFAULT_TTS_MODEL: &str = "tts-1";

/// The five pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Trends,
    Extract,
    Ideas,
    Script,
    Audio,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Trends,
        Stage::Extract,
        Stage::Ideas,
        Stage::Script,
        Stage::Audio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Trends => "trends",
            Stage::Extract => "extract",
            Stage::Ideas => "ideas",
            Stage::Script => "script",
            Stage::Audio => "audio",
        }
    }

    /// Stages strictly after this one.
    pub fn downstream(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ALL.into_iter().filter(move |s| s > self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate news article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub selected: bool,
}

/// Parameters of a trends search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendQuery {
    pub keywords: Option<String>,
    pub country: String,
    pub category: String,
    pub limit: u32,
    pub sort_by: Option<String>,
}

impl Default for TrendQuery {
    fn default() -> Self {
        Self {
            keywords: None,
            country: NewsCountry::Us.as_str().to_string(),
            category: NewsCategory::Technology.as_str().to_string(),
            limit: DEFAULT_TREND_LIMIT,
            sort_by: None,
        }
    }
}

impl TrendQuery {
    pub fn keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Self::default()
        }
    }

    pub fn headlines(category: NewsCategory, country: NewsCountry) -> Self {
        Self {
            category: category.as_str().to_string(),
            country: country.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Trimmed keywords, `None` when blank.
    pub fn search_terms(&self) -> Option<&str> {
        self.keywords
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Sort order sent with keyword searches.
    pub fn effective_sort(&self) -> &str {
        match self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            Some(sort) => sort,
            None if self.search_terms().is_some() => "relevancy",
            None => "publishedAt",
        }
    }

    pub fn clamped_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_TREND_LIMIT)
    }
}

/// Cleaned plain-text body of a selected article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub url: String,
    pub text: String,
}

/// Free-form creative brief: hook, talking points, call-to-action, titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaSet {
    pub text: String,
}

/// Voiceover-ready text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
    pub duration_secs: u32,
    pub tone: String,
}

/// Synthesized speech. Dropping the asset releases the audio buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    pub audio: Bytes,
    pub voice: Voice,
    pub source_script: String,
    pub created_at: DateTime<Utc>,
}

impl AudioAsset {
    pub fn file_name(&self) -> String {
        audio_file_name(self.created_at)
    }
}

/// Suggested download name for audio produced at `at`.
pub fn audio_file_name(at: DateTime<Utc>) -> String {
    format!("trendspark_audio_{}.mp3", at.timestamp_millis())
}

/// Error returned when parsing one of the enumerated choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownChoice {}

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|c| c.as_str() == wanted)
                    .ok_or_else(|| UnknownChoice {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum!(NewsCategory, "category", {
    Technology => "technology",
    Business => "business",
    Entertainment => "entertainment",
    General => "general",
    Health => "health",
    Science => "science",
    Sports => "sports",
});

choice_enum!(NewsCountry, "country", {
    Us => "us",
    Gb => "gb",
    Ca => "ca",
    Au => "au",
    De => "de",
    Fr => "fr",
    Jp => "jp",
    Kr => "kr",
});

choice_enum!(ScriptTone, "tone", {
    Informative => "informative",
    Excited => "excited",
    Neutral => "neutral",
    Humorous => "humorous",
    Serious => "serious",
    Casual => "casual",
});

choice_enum!(
    /// Voices accepted by the speech provider.
    Voice, "voice", {
    Alloy => "alloy",
    Echo => "echo",
    Fable => "fable",
    Onyx => "onyx",
    Nova => "nova",
    Shimmer => "shimmer",
});

impl Voice {
    /// Looks up a voice by its exact provider name. Unlike `FromStr`, case and
    /// surrounding whitespace must match.
    pub fn exact(name: &str) -> Option<Voice> {
        Voice::ALL.iter().copied().find(|v| v.as_str() == name)
    }

    /// Resolves a requested voice, substituting `default` for anything that is
    /// not an exact provider name.
    pub fn resolve(requested: Option<&str>, default: Voice) -> Voice {
        requested.and_then(Voice::exact).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downstream_stages() {
        let after_extract: Vec<Stage> = Stage::Extract.downstream().collect();
        assert_eq!(after_extract, vec![Stage::Ideas, Stage::Script, Stage::Audio]);
        assert_eq!(Stage::Audio.downstream().count(), 0);
    }

    #[test]
    fn test_exact_voice_names() {
        assert_eq!(Voice::exact("fable"), Some(Voice::Fable));
        assert_eq!(Voice::exact("Fable"), None);
        assert_eq!("Fable".parse::<Voice>().ok(), Some(Voice::Fable));
    }

    #[test]
    fn test_voice_resolution() {
        assert_eq!(Voice::resolve(Some("echo"), Voice::Nova), Voice::Echo);
        assert_eq!(Voice::resolve(Some("SHIMMER"), Voice::Nova), Voice::Nova);
        assert_eq!(Voice::resolve(Some(" echo"), Voice::Alloy), Voice::Alloy);
        assert_eq!(Voice::resolve(Some("invalid-voice"), Voice::Nova), Voice::Nova);
        assert_eq!(Voice::resolve(None, Voice::Alloy), Voice::Alloy);
    }

    #[test]
    fn test_query_modes() {
        let query = TrendQuery::keywords("  rust  ");
        assert_eq!(query.search_terms(), Some("rust"));
        assert_eq!(query.effective_sort(), "relevancy");

        let query = TrendQuery::keywords("   ");
        assert_eq!(query.search_terms(), None);
        assert_eq!(query.effective_sort(), "publishedAt");

        let query = TrendQuery::headlines(NewsCategory::Science, NewsCountry::Gb).with_limit(500);
        assert_eq!(query.category, "science");
        assert_eq!(query.country, "gb");
        assert_eq!(query.clamped_limit(), MAX_TREND_LIMIT);
        assert_eq!(query.clone().with_limit(0).clamped_limit(), 1);
    }

    #[test]
    fn test_trend_item_wire_names() {
        let json = r#"{"title":"T","description":null,"url":"https://a.example/x","source":"Wire",
            "publishedAt":"2024-05-01T10:00:00Z","author":null,"imageUrl":"https://a.example/i.png"}"#;
        let item: TrendItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.source.as_deref(), Some("Wire"));
        assert_eq!(item.image_url.as_deref(), Some("https://a.example/i.png"));
        assert!(!item.selected);

        let out = serde_json::to_value(&item).unwrap();
        assert!(out.get("publishedAt").is_some());
        assert!(out.get("selected").is_none());
    }

    #[test]
    fn test_audio_file_name() {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(audio_file_name(at), "trendspark_audio_1704067200000.mp3");
    }
}
