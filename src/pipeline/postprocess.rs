//! Post-processing: deterministic cleanup of OCR output.
//!
//! Tesseract output carries artefacts that are harmless to a human reader but
//! noisy downstream: ligatures and smart quotes outside ASCII, runs of
//! spaces from `preserve_interword_spaces`, and long stacks of blank lines
//! between detected blocks.
//!
//! ## Rule Order
//!
//! Bullet glyphs are outside printable ASCII, so they must be mapped to `-`
//! before the non-printable pass would turn them into spaces.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all sanitation rules to raw recognised text.
///
/// Rules (applied in order):
/// 1. Normalise bullet glyphs (`•`, `·`, `◦`) to `-`
/// 2. Replace every character outside printable ASCII, tab, LF and CR with
///    a space
/// 3. Collapse runs of spaces and tabs to one space
/// 4. Collapse 3+ consecutive newlines to exactly 2
/// 5. Trim
pub fn sanitize_ocr_text(input: &str) -> String {
    let s = normalise_bullets(input);
    let s = replace_non_printable(&s);
    let s = collapse_spaces(&s);
    let s = collapse_newlines(&s);
    s.trim().to_string()
}

// ── Rule 1: Bullet glyphs ────────────────────────────────────────────────────

fn normalise_bullets(input: &str) -> String {
    input.replace(['\u{2022}', '\u{00B7}', '\u{25E6}'], "-")
}

// ── Rule 2: Non-printable characters ─────────────────────────────────────────

fn is_kept(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | ' '..='~')
}

fn replace_non_printable(input: &str) -> String {
    input
        .chars()
        .map(|c| if is_kept(c) { c } else { ' ' })
        .collect()
}

// ── Rule 3: Horizontal whitespace ────────────────────────────────────────────

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_spaces(input: &str) -> String {
    RE_SPACES.replace_all(input, " ").to_string()
}

// ── Rule 4: Blank lines ──────────────────────────────────────────────────────

static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_newlines(input: &str) -> String {
    RE_NEWLINES.replace_all(input, "\n\n").to_string()
}
