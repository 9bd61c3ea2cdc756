/*!
 * # epubtrans - EPUB translation with local AI
 *
 * A Rust library for translating the prose of an EPUB book, text node by
 * text node, using a local Ollama model.
 *
 * ## Features
 *
 * - Parses EPUB chapters into a mutable node tree
 * - Classifies text nodes with prioritized heuristics so markup, code
 *   blocks, metadata, and structural noise are never rewritten
 * - Per-node retry with capped exponential backoff and stable failure kinds
 * - Partial failures are contained and reported, never fatal
 * - Commit/abort output policy: with abort-on-error, a run with failures
 *   writes the report but never the transformed EPUB
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `epub`: EPUB container reading and writing
 * - `chapter`: Chapter node tree and text node classification
 * - `translation`: AI-powered translation pipeline:
 *   - `translation::core`: Translator seam and Ollama-backed service
 *   - `translation::retry`: Bounded retry/backoff state machine
 *   - `translation::prompts`: Prompt construction
 *   - `translation::sanitize`: Model output cleanup
 *   - `translation::chapter_pass`: Per-chapter orchestration
 * - `reporting`: Run report records, aggregation, and JSON serialization
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for LLM backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Deterministic mocks for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod chapter;
pub mod epub;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod reporting;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use chapter::{ChapterDocument, Classification, NodeClassifier};
pub use errors::{AppError, FailureKind, ProviderError};
pub use reporting::{RunAggregator, RunReport};
pub use translation::TranslationService;
