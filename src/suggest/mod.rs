//! Engagement suggestions for extracted text.
//!
//! Suggestions are an optional extra on top of extraction: every failure to
//! obtain them (service down, non-2xx, undecodable reply, model error) is
//! downgraded to [`Suggestions::fallback`] by [`suggest_or_fallback`] and
//! never reaches the caller as an error.
//!
//! Two sources are provided:
//! - [`client::HttpSuggestionClient`] — the `/api/analyze-content` service
//! - [`analyze::LlmSuggestionSource`] — an in-process LLM call

pub mod analyze;
pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const MAX_HASHTAGS: usize = 10;
pub const MAX_CAPTION_CHARS: usize = 260;
pub const MAX_TIPS: usize = 6;

/// Hashtags, a caption and engagement tips for a piece of content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Suggestions {
    /// The fixed set shown when no suggestion source is reachable.
    pub fn fallback() -> Self {
        Self {
            hashtags: ["#content", "#growth", "#socialmedia", "#discover", "#reach", "#creator"]
                .into_iter()
                .map(String::from)
                .collect(),
            caption: "Make it relatable, short, and end with a question to spark comments."
                .to_string(),
            tips: [
                "Post at your audience peak time",
                "Use 5\u{2013}8 specific hashtags",
                "Lead with a hook in first 2 lines",
                "Reply to comments within 30 mins",
                "Pin your best comment to keep the thread alive",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    /// Enforce the output limits: at most 10 hashtags each carrying a single
    /// leading `#`, a caption of at most 260 characters, at most 6 tips.
    pub fn normalised(self) -> Self {
        let hashtags = self
            .hashtags
            .iter()
            .map(|t| t.trim().trim_start_matches('#'))
            .filter(|t| !t.is_empty())
            .take(MAX_HASHTAGS)
            .map(|t| format!("#{t}"))
            .collect();
        let caption = self.caption.chars().take(MAX_CAPTION_CHARS).collect();
        let tips = self
            .tips
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_TIPS)
            .collect();
        Self {
            hashtags,
            caption,
            tips,
        }
    }
}

#[derive(Debug, Error)]
pub enum SuggestError {
    /// The text to analyse was empty after trimming.
    #[error("No text content provided")]
    EmptyText,

    /// The LLM provider could not be created or the call failed.
    #[error("suggestion provider error: {0}")]
    Provider(String),

    /// The service was unreachable or answered with something unusable.
    #[error("suggestions unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can turn extracted text into [`Suggestions`].
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    fn name(&self) -> &str;

    async fn suggest(&self, text: &str) -> Result<Suggestions, SuggestError>;
}

/// Ask `source` for suggestions, falling back to the fixed set on any error.
pub async fn suggest_or_fallback(source: &dyn SuggestionSource, text: &str) -> Suggestions {
    match source.suggest(text).await {
        Ok(suggestions) => suggestions,
        Err(e) => {
            warn!("{} suggestions unavailable, using defaults: {}", source.name(), e);
            Suggestions::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl SuggestionSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn suggest(&self, _text: &str) -> Result<Suggestions, SuggestError> {
            Err(SuggestError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn fallback_set_is_fixed() {
        let f = Suggestions::fallback();
        assert_eq!(f.hashtags.len(), 6);
        assert_eq!(f.hashtags[2], "#socialmedia");
        assert_eq!(f.tips.len(), 5);
        assert_eq!(f.tips[1], "Use 5\u{2013}8 specific hashtags");
        assert!(f.caption.ends_with("spark comments."));
    }

    #[test]
    fn normalised_prefixes_hashtags_once() {
        let s = Suggestions {
            hashtags: vec!["rust".into(), "#async".into(), "##tokio".into(), " ".into()],
            caption: "c".into(),
            tips: vec![],
        }
        .normalised();
        assert_eq!(s.hashtags, vec!["#rust", "#async", "#tokio"]);
    }

    #[test]
    fn normalised_enforces_limits() {
        let s = Suggestions {
            hashtags: (0..15).map(|i| format!("tag{i}")).collect(),
            caption: "x".repeat(400),
            tips: (0..9).map(|i| format!("tip {i}")).collect(),
        }
        .normalised();
        assert_eq!(s.hashtags.len(), MAX_HASHTAGS);
        assert_eq!(s.caption.chars().count(), MAX_CAPTION_CHARS);
        assert_eq!(s.tips.len(), MAX_TIPS);
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let s: Suggestions = serde_json::from_str(r#"{"caption":"hi"}"#).unwrap();
        assert!(s.hashtags.is_empty());
        assert_eq!(s.caption, "hi");
    }

    #[tokio::test]
    async fn errors_fall_back_to_the_fixed_set() {
        assert_eq!(suggest_or_fallback(&Failing, "text").await, Suggestions::fallback());
    }
}
