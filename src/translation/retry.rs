/*!
 * Bounded retry/backoff around a single node translation.
 *
 * Modeled as an explicit state machine (attempt counter + failure-kind
 * branch) returning a terminal result value, so the retry bound and the
 * three failure kinds are each independently testable.
 */

use log::debug;
use std::time::Duration;

use crate::errors::FailureKind;
use crate::translation::TranslationRequest;
use crate::translation::core::Translator;
use crate::translation::sanitize::sanitize_response;

/// Retry and backoff tuning for node translation attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = max_retries + 1
    pub max_retries: u32,
    /// Base backoff time in milliseconds
    pub backoff_base_ms: u64,
    /// Upper bound on a single backoff wait in milliseconds
    pub backoff_cap_ms: u64,
}

impl RetryPolicy {
    /// Backoff before the attempt following `attempt` (1-based):
    /// `min(cap, base * 2^(attempt - 1))`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let wait_ms = self
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.backoff_cap_ms);
        Duration::from_millis(wait_ms)
    }
}

/// Terminal failure descriptor for one node.
#[derive(Debug, Clone)]
pub struct TranslationFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable message for the report
    pub message: String,
    /// Attempts made before giving up
    pub attempts: u32,
}

/// Terminal outcome of translating one node. Exactly one side is populated.
#[derive(Debug, Clone)]
pub enum TranslationOutcome {
    /// The sanitized translated text
    Succeeded(String),
    /// All attempts exhausted, or a non-retryable failure
    Failed(TranslationFailure),
}

/// Wraps a [`Translator`] with the bounded retry policy.
pub struct RetryingTranslator<'a> {
    translator: &'a dyn Translator,
    policy: RetryPolicy,
}

impl<'a> RetryingTranslator<'a> {
    /// Create a retrying wrapper around a translator
    pub fn new(translator: &'a dyn Translator, policy: RetryPolicy) -> Self {
        Self { translator, policy }
    }

    /// Translate one request to a terminal outcome.
    ///
    /// Transient and response-format failures retry with capped exponential
    /// backoff until `max_retries + 1` attempts are exhausted; configuration
    /// failures are terminal immediately.
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationOutcome {
        let max_attempts = self.policy.max_retries + 1;
        let mut attempt: u32 = 1;

        loop {
            let failure = match self.translator.translate(request).await {
                Ok(raw) => {
                    let clean = sanitize_response(&raw, &request.text);
                    if !clean.is_empty() {
                        return TranslationOutcome::Succeeded(clean);
                    }
                    (
                        FailureKind::ResponseFormat,
                        "backend returned no usable text".to_string(),
                    )
                }
                Err(error) => (FailureKind::from_provider_error(&error), error.to_string()),
            };

            let (kind, message) = failure;

            if !kind.is_retryable() {
                return TranslationOutcome::Failed(TranslationFailure {
                    kind,
                    message,
                    attempts: attempt,
                });
            }

            if attempt >= max_attempts {
                return TranslationOutcome::Failed(TranslationFailure {
                    kind,
                    message,
                    attempts: attempt,
                });
            }

            let delay = self.policy.backoff_delay(attempt);
            debug!(
                "Retryable {} failure, attempt {}/{}, backing off {}ms | {}",
                kind,
                attempt,
                max_attempts,
                delay.as_millis(),
                message
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
