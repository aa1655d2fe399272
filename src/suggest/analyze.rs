//! In-process analysis: ask an LLM for suggestions and recover its reply.
//!
//! Models are told to answer with strict JSON but do not always comply. A
//! reply is classified as a [`ModelReply`]:
//!
//! - `Structured` — the reply (minus any ```` ```json ```` fence) parsed as JSON
//! - `HeuristicRecovered` — not JSON; hashtags, caption and tips were
//!   scraped from the text
//! - `Unavailable` — nothing usable (empty reply)

use super::{SuggestError, SuggestionSource, Suggestions, MAX_CAPTION_CHARS, MAX_HASHTAGS, MAX_TIPS};
use crate::prompts::{analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_CAPTION: &str = "Here\u{2019}s a concise, punchy caption crafted for engagement.";
const DEFAULT_TIPS: [&str; 3] = [
    "Ask a question to spark comments",
    "Post at your audience\u{2019}s peak hours",
    "Use 5\u{2013}8 specific hashtags",
];

/// How a model reply was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Structured(Suggestions),
    HeuristicRecovered(Suggestions),
    Unavailable,
}

impl ModelReply {
    pub fn into_suggestions(self) -> Option<Suggestions> {
        match self {
            ModelReply::Structured(s) | ModelReply::HeuristicRecovered(s) => Some(s),
            ModelReply::Unavailable => None,
        }
    }
}

static RE_FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```(?:json)?\s*").unwrap());
static RE_FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());
static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"#?\w+").unwrap());
static RE_TIP_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\d+\.|[-•])\s*").unwrap());

/// Classify and decode a raw model reply.
pub fn parse_model_reply(raw: &str) -> ModelReply {
    let cleaned = strip_fences(raw.trim());
    if cleaned.is_empty() {
        return ModelReply::Unavailable;
    }

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => ModelReply::Structured(from_json(&value)),
        Err(e) => {
            debug!("Reply is not JSON ({}), recovering heuristically", e);
            ModelReply::HeuristicRecovered(recover(&cleaned))
        }
    }
}

fn strip_fences(raw: &str) -> String {
    let s = RE_FENCE_OPEN.replace(raw, "");
    RE_FENCE_CLOSE.replace(&s, "").to_string()
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(as_text).collect(),
        _ => Vec::new(),
    }
}

fn from_json(value: &Value) -> Suggestions {
    Suggestions {
        hashtags: string_list(value.get("hashtags")),
        caption: value
            .get("caption")
            .filter(|v| !v.is_null())
            .map(as_text)
            .unwrap_or_default(),
        tips: string_list(value.get("tips")),
    }
}

fn recover(cleaned: &str) -> Suggestions {
    let hashtags = RE_WORD
        .find_iter(cleaned)
        .map(|m| m.as_str().trim_start_matches('#'))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .take(MAX_HASHTAGS)
        .map(String::from)
        .collect();

    let caption = cleaned
        .lines()
        .map(str::trim)
        .find(|l| l.chars().count() > 30)
        .map(|l| l.chars().take(MAX_CAPTION_CHARS).collect())
        .unwrap_or_else(|| DEFAULT_CAPTION.to_string());

    let mut tips: Vec<String> = cleaned
        .lines()
        .filter(|l| RE_TIP_LINE.is_match(l))
        .map(|l| RE_TIP_LINE.replace(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .take(MAX_TIPS)
        .collect();
    if tips.is_empty() {
        tips = DEFAULT_TIPS.iter().map(|t| t.to_string()).collect();
    }

    Suggestions {
        hashtags,
        caption,
        tips,
    }
}

// ── LLM source ───────────────────────────────────────────────────────────

/// Suggestions straight from an LLM provider.
pub struct LlmSuggestionSource {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmSuggestionSource {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    /// A named provider (e.g. `"openai"`, `"ollama"`) with the given model.
    ///
    /// The provider reads its API key from the usual environment variable.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, SuggestError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            SuggestError::Provider(format!("cannot create provider '{}': {}", provider_name, e))
        })?;
        Ok(Self::new(provider))
    }

    /// Auto-detect a provider from the environment.
    pub fn from_env() -> Result<Self, SuggestError> {
        let (provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
            SuggestError::Provider(format!(
                "no LLM provider could be auto-detected from environment: {}",
                e
            ))
        })?;
        Ok(Self::new(provider))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SuggestionSource for LlmSuggestionSource {
    fn name(&self) -> &str {
        "llm"
    }

    async fn suggest(&self, text: &str) -> Result<Suggestions, SuggestError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SuggestError::EmptyText);
        }

        let messages = vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(analysis_prompt(text)),
        ];
        info!("Requesting suggestions from LLM ({} chars)", text.len());
        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| SuggestError::Provider(e.to_string()))?;

        match parse_model_reply(&response.content) {
            ModelReply::Structured(s) => Ok(s.normalised()),
            ModelReply::HeuristicRecovered(s) => {
                warn!("Model ignored the JSON format; suggestions were recovered heuristically");
                Ok(s.normalised())
            }
            ModelReply::Unavailable => Err(SuggestError::Unavailable("model returned an empty reply".into())),
        }
    }
}
