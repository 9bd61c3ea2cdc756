/*!
 * Mock translator implementations for testing.
 *
 * This module provides mock translators that simulate different behaviors:
 * - `MockTranslator::working()` - Always succeeds with a marked translation
 * - `MockTranslator::with_dictionary()` - Deterministic word mapping
 * - `MockTranslator::failing_transient()` - Always fails with a 503
 * - `MockTranslator::failing_configuration()` - Always fails with a 404
 * - `MockTranslator::empty()` - Succeeds with an empty body
 * - `MockTranslator::flaky()` - Fails the first N calls, then succeeds
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::translation::TranslationRequest;
use crate::translation::core::Translator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds; dictionary lookup with a marked fallback
    Working,
    /// Succeeds only for texts present in the dictionary, 503 otherwise
    DictionaryStrict,
    /// Always fails with a 503 (transient)
    FailingTransient,
    /// Always fails with a 404 (configuration)
    FailingConfiguration,
    /// Returns an empty body (response-format failure downstream)
    Empty,
    /// Fails with connection errors for the first N calls, then succeeds
    Flaky { failures: usize },
}

/// Mock translator for exercising the pipeline without a backend
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Deterministic text mapping consulted before the fallback
    dictionary: HashMap<String, String>,
    /// Number of translate calls made, shared across clones
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            dictionary: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a working mock with a fixed text mapping
    pub fn with_dictionary(pairs: &[(&str, &str)]) -> Self {
        let mut mock = Self::new(MockBehavior::Working);
        mock.dictionary = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        mock
    }

    /// Create a mock that only knows the given mapping and fails transiently
    /// on anything else
    pub fn dictionary_strict(pairs: &[(&str, &str)]) -> Self {
        let mut mock = Self::new(MockBehavior::DictionaryStrict);
        mock.dictionary = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        mock
    }

    /// Create a mock that always fails with a transient error
    pub fn failing_transient() -> Self {
        Self::new(MockBehavior::FailingTransient)
    }

    /// Create a mock that always fails with a configuration error
    pub fn failing_configuration() -> Self {
        Self::new(MockBehavior::FailingConfiguration)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that fails the first `failures` calls, then succeeds
    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::Flaky { failures })
    }

    /// Number of translate calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, request: &TranslationRequest) -> Option<String> {
        self.dictionary.get(&request.text).cloned()
    }

    fn fallback(&self, request: &TranslationRequest) -> String {
        format!("[{}] {}", request.target_language, request.text)
    }
}

impl Clone for MockTranslator {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            dictionary: self.dictionary.clone(),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Working => Ok(self
                .lookup(request)
                .unwrap_or_else(|| self.fallback(request))),

            MockBehavior::DictionaryStrict => match self.lookup(request) {
                Some(text) => Ok(text),
                None => Err(ProviderError::ApiError {
                    status_code: 503,
                    message: format!("no mapping for: {}", request.text),
                }),
            },

            MockBehavior::FailingTransient => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Simulated backend outage".to_string(),
            }),

            MockBehavior::FailingConfiguration => Err(ProviderError::ApiError {
                status_code: 404,
                message: format!("model '{}' not found", request.model),
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Flaky { failures } => {
                if count < *failures {
                    Err(ProviderError::ConnectionError(format!(
                        "simulated connection drop (call #{})",
                        count + 1
                    )))
                } else {
                    Ok(self
                        .lookup(request)
                        .unwrap_or_else(|| self.fallback(request)))
                }
            }
        }
    }
}
