use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module provides functions for validating ISO 639-1 (2-letter) and
/// ISO 639-3 (3-letter) language codes and resolving their English names
/// for use in prompts.

/// Validate that a language code is a known ISO 639-1 or ISO 639-3 code
pub fn validate_language_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 && Language::from_639_1(&normalized).is_some() {
        return Ok(());
    }

    if normalized.len() == 3 && Language::from_639_3(&normalized).is_some() {
        return Ok(());
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Resolve the English name of a language code for prompt text.
///
/// Falls back to the code itself when the code is unknown, so a prompt can
/// still be built for backends that understand raw codes.
pub fn language_display_name(code: &str) -> String {
    let normalized = code.trim().to_lowercase();

    let language = if normalized.len() == 2 {
        Language::from_639_1(&normalized)
    } else {
        Language::from_639_3(&normalized)
    };

    match language {
        Some(lang) => lang.to_name().to_string(),
        None => code.to_string(),
    }
}
