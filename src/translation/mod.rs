/*!
 * Translation pipeline.
 *
 * This module contains the per-node translation machinery:
 * - `translation::core`: the `Translator` seam and the Ollama-backed service
 * - `translation::prompts`: prompt construction and context truncation
 * - `translation::sanitize`: cleanup of raw model output
 * - `translation::retry`: bounded retry/backoff state machine
 * - `translation::chapter_pass`: per-chapter orchestration over the node tree
 */

// Re-export main types for easier usage
pub use self::chapter_pass::{ChapterOrchestrator, ChapterOutcome};
pub use self::core::{TranslationService, Translator};
pub use self::prompts::PromptBuilder;
pub use self::retry::{RetryPolicy, RetryingTranslator, TranslationOutcome};

// Submodules
pub mod chapter_pass;
pub mod core;
pub mod prompts;
pub mod retry;
pub mod sanitize;

/// A single node translation request.
///
/// Immutable once built; the node text is non-empty after whitespace
/// normalization because empty nodes are classified out before a request is
/// ever constructed.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Bounded excerpt of the chapter, for tone/terminology grounding
    pub chapter_context: String,
    /// Recent translations from the same chapter, newline-joined
    pub prior_translations: String,
    /// The text to translate
    pub text: String,
}
