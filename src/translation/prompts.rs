/*!
 * Prompt construction for node translation requests.
 *
 * The instruction component strictly demands the target-language plain-text
 * equivalent of the node text and nothing else; the chapter excerpt and the
 * rolling window of recent translations ground tone and terminology but are
 * never themselves translated.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::Config;
use crate::language_utils;
use crate::translation::TranslationRequest;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// System prompt sent with every node request.
const BOOK_TRANSLATOR_SYSTEM: &str = "You are a professional book translator.\n\
Translate from {source_language} to {target_language}.\n\
Preserve meaning, tone, and punctuation.\n\
Return ONLY the translated text, no quotes, no explanations, no markup.";

/// Builds translation requests for one run's language pair and model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    source_language: String,
    target_language: String,
    model: String,
    temperature: f32,
    context_chars: usize,
}

impl PromptBuilder {
    /// Create a builder from the run configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            model: config.translation.model.clone(),
            temperature: config.translation.temperature,
            context_chars: config.translation.context_chars,
        }
    }

    /// Derive the bounded chapter context excerpt from the full chapter text.
    ///
    /// Whitespace-normalized, then truncated at the configured character
    /// budget. Truncation is a plain prefix cut so the excerpt is
    /// deterministic for identical input.
    pub fn chapter_context(&self, full_text: &str) -> String {
        let normalized = normalize_whitespace(full_text);
        if normalized.chars().count() <= self.context_chars {
            return normalized;
        }
        normalized.chars().take(self.context_chars).collect()
    }

    /// Build a request for one translatable node.
    pub fn build(
        &self,
        chapter_context: &str,
        prior_translations: &str,
        node_text: &str,
    ) -> TranslationRequest {
        TranslationRequest {
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            chapter_context: chapter_context.to_string(),
            prior_translations: prior_translations.to_string(),
            text: node_text.to_string(),
        }
    }
}

/// Render the system prompt for a request
pub fn render_system_prompt(request: &TranslationRequest) -> String {
    BOOK_TRANSLATOR_SYSTEM
        .replace(
            "{source_language}",
            &language_utils::language_display_name(&request.source_language),
        )
        .replace(
            "{target_language}",
            &language_utils::language_display_name(&request.target_language),
        )
}

/// Render the user prompt for a request.
///
/// Context sections are omitted entirely when empty so short chapters do not
/// pay for blank scaffolding.
pub fn render_user_prompt(request: &TranslationRequest) -> String {
    let mut prompt = String::new();

    if !request.chapter_context.is_empty() {
        prompt.push_str("CHAPTER CONTEXT (for tone and terminology, do not translate):\n");
        prompt.push_str(&request.chapter_context);
        prompt.push_str("\n\n");
    }

    if !request.prior_translations.is_empty() {
        prompt.push_str("RECENT TRANSLATIONS (for consistency, do not repeat):\n");
        prompt.push_str(&request.prior_translations);
        prompt.push_str("\n\n");
    }

    prompt.push_str("TEXT TO TRANSLATE:\n");
    prompt.push_str(&request.text);
    prompt.push('\n');

    prompt
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}
