//! Prompts for LLM-based engagement analysis.
//!
//! Kept in one place so the wording can change without touching the reply
//! recovery logic in [`crate::suggest::analyze`], and so tests can inspect
//! the prompt without calling a model.

/// System message sent before every analysis request.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a social media strategist. \
You read content and suggest how to present it for maximum engagement. \
You always answer with strict JSON only, never prose or code fences.";

/// Build the user message asking for hashtags, a caption and tips for `text`.
pub fn analysis_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following content and respond with STRICT JSON ONLY:

TEXT:
{text}

Return a JSON object with keys exactly:
{{
  "hashtags": ["up to 10 relevant hashtags WITHOUT # prefix"],
  "caption": "one engaging caption (<= 260 chars)",
  "tips": ["3-6 actionable engagement tips"]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_schema() {
        let p = analysis_prompt("Quarterly results are in");
        assert!(p.contains("TEXT:\nQuarterly results are in\n"));
        assert!(p.contains(r#""hashtags""#));
        assert!(p.contains(r#""caption""#));
        assert!(p.contains(r#""tips""#));
        assert!(p.contains("<= 260 chars"));
    }

    #[test]
    fn system_prompt_demands_json() {
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("strict JSON"));
    }
}
