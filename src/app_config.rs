use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Abort EPUB output when any node failed
    #[serde(default)]
    pub abort_on_error: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend and pipeline tuning
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name (e.g., "mistral", "llama3.2:3b")
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retries per node after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff time in milliseconds for exponential backoff
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff wait in milliseconds
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Character budget for the chapter context excerpt sent with each request
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,

    /// Number of recent translations carried into the next request (0 disables)
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum number of chapters translated concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            temperature: default_temperature(),
            retries: default_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            context_chars: default_context_chars(),
            context_window: default_context_window(),
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_backoff_cap_ms() -> u64 {
    4000
}

fn default_context_chars() -> usize {
    500
}

fn default_context_window() -> usize {
    3
}

fn default_workers() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            abort_on_error: false,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language)
            .map_err(|e| anyhow!("Invalid source language: {}", e))?;

        language_utils::validate_language_code(&self.target_language)
            .map_err(|e| anyhow!("Invalid target language: {}", e))?;

        if self.source_language.trim().to_lowercase() == self.target_language.trim().to_lowercase()
        {
            return Err(anyhow!(
                "Source and target languages must differ: {}",
                self.source_language
            ));
        }

        let translation = &self.translation;

        if translation.model.trim().is_empty() {
            return Err(anyhow!("Model name cannot be empty"));
        }

        if translation.endpoint.trim().is_empty() {
            return Err(anyhow!("Endpoint cannot be empty"));
        }

        if !(0.0..=2.0).contains(&translation.temperature) {
            return Err(anyhow!(
                "Temperature must be between 0.0 and 2.0, got {}",
                translation.temperature
            ));
        }

        if translation.workers == 0 {
            return Err(anyhow!("Workers must be at least 1"));
        }

        if translation.backoff_base_ms == 0 {
            return Err(anyhow!("Backoff base must be at least 1 ms"));
        }

        Ok(())
    }
}
