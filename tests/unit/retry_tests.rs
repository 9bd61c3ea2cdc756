/*!
 * Tests for the retry/backoff state machine and failure-kind classification.
 */

use epubtrans::errors::{FailureKind, ProviderError};
use epubtrans::providers::mock::MockTranslator;
use epubtrans::translation::retry::{RetryPolicy, RetryingTranslator, TranslationOutcome};
use epubtrans::translation::TranslationRequest;

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_base_ms: 1,
        backoff_cap_ms: 2,
    }
}

fn request(text: &str) -> TranslationRequest {
    TranslationRequest {
        source_language: "en".to_string(),
        target_language: "fr".to_string(),
        model: "test-model".to_string(),
        temperature: 0.2,
        chapter_context: String::new(),
        prior_translations: String::new(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_translate_workingBackend_shouldSucceedFirstAttempt() {
    let mock = MockTranslator::with_dictionary(&[("Hello", "Bonjour")]);
    let retrying = RetryingTranslator::new(&mock, fast_policy(3));

    match retrying.translate(&request("Hello")).await {
        TranslationOutcome::Succeeded(text) => assert_eq!(text, "Bonjour"),
        TranslationOutcome::Failed(f) => panic!("unexpected failure: {:?}", f),
    }
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_translate_alwaysTransient_shouldUseExactlyRetriesPlusOneAttempts() {
    let mock = MockTranslator::failing_transient();
    let retrying = RetryingTranslator::new(&mock, fast_policy(3));

    match retrying.translate(&request("Hello")).await {
        TranslationOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Transient);
            assert_eq!(failure.attempts, 4);
        }
        TranslationOutcome::Succeeded(_) => panic!("should not succeed"),
    }
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_translate_configurationFailure_shouldNotRetry() {
    let mock = MockTranslator::failing_configuration();
    let retrying = RetryingTranslator::new(&mock, fast_policy(5));

    match retrying.translate(&request("Hello")).await {
        TranslationOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Configuration);
            assert_eq!(failure.attempts, 1);
        }
        TranslationOutcome::Succeeded(_) => panic!("should not succeed"),
    }
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_translate_emptyResponses_shouldFailAsResponseFormat() {
    let mock = MockTranslator::empty();
    let retrying = RetryingTranslator::new(&mock, fast_policy(2));

    match retrying.translate(&request("Hello")).await {
        TranslationOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::ResponseFormat);
            assert_eq!(failure.attempts, 3);
        }
        TranslationOutcome::Succeeded(_) => panic!("should not succeed"),
    }
}

#[tokio::test]
async fn test_translate_flakyBackend_shouldRecoverWithinBudget() {
    let mock = MockTranslator::flaky(2);
    let retrying = RetryingTranslator::new(&mock, fast_policy(3));

    match retrying.translate(&request("Hello")).await {
        TranslationOutcome::Succeeded(text) => assert_eq!(text, "[fr] Hello"),
        TranslationOutcome::Failed(f) => panic!("unexpected failure: {:?}", f),
    }
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_translate_zeroRetries_shouldAttemptOnce() {
    let mock = MockTranslator::failing_transient();
    let retrying = RetryingTranslator::new(&mock, fast_policy(0));

    match retrying.translate(&request("Hello")).await {
        TranslationOutcome::Failed(failure) => assert_eq!(failure.attempts, 1),
        TranslationOutcome::Succeeded(_) => panic!("should not succeed"),
    }
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_failureKind_shouldClassifyByVariantAndStatus() {
    assert_eq!(
        FailureKind::from_provider_error(&ProviderError::ConnectionError("timeout".into())),
        FailureKind::Transient
    );
    assert_eq!(
        FailureKind::from_provider_error(&ProviderError::ApiError {
            status_code: 503,
            message: "unavailable".into()
        }),
        FailureKind::Transient
    );
    assert_eq!(
        FailureKind::from_provider_error(&ProviderError::ApiError {
            status_code: 404,
            message: "model not found".into()
        }),
        FailureKind::Configuration
    );
    assert_eq!(
        FailureKind::from_provider_error(&ProviderError::ParseError("bad json".into())),
        FailureKind::Transient
    );
    assert_eq!(
        FailureKind::from_provider_error(&ProviderError::UnusableResponse("empty".into())),
        FailureKind::ResponseFormat
    );
}

#[test]
fn test_failureKind_messageTextMustNotMatter() {
    // Classification is variant-driven: a connection error whose message
    // happens to mention a model name is still transient.
    let error = ProviderError::ConnectionError("model not found in DNS".into());
    assert_eq!(
        FailureKind::from_provider_error(&error),
        FailureKind::Transient
    );
}
