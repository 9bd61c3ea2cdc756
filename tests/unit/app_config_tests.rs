/*!
 * Tests for configuration defaults and validation.
 */

use epubtrans::Config;

#[test]
fn test_defaultConfig_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_defaults_shouldMatchDocumentedValues() {
    let config = Config::default();
    assert_eq!(config.translation.retries, 3);
    assert_eq!(config.translation.context_chars, 500);
    assert_eq!(config.translation.workers, 4);
    assert!(!config.abort_on_error);
    assert_eq!(config.translation.endpoint, "http://localhost:11434");
}

#[test]
fn test_validate_temperatureOutOfRange_shouldFail() {
    let mut config = Config::default();
    config.translation.temperature = 2.5;
    assert!(config.validate().is_err());

    config.translation.temperature = -0.1;
    assert!(config.validate().is_err());

    config.translation.temperature = 2.0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_badLanguageCode_shouldFail() {
    let mut config = Config::default();
    config.source_language = "zz".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_sameLanguages_shouldFail() {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "en".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zeroWorkers_shouldFail() {
    let mut config = Config::default();
    config.translation.workers = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_emptyModel_shouldFail() {
    let mut config = Config::default();
    config.translation.model = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_shouldDeserializeWithPartialFields() {
    let json = r#"{
        "source_language": "en",
        "target_language": "it",
        "translation": { "model": "mistral" }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.translation.model, "mistral");
    assert_eq!(config.translation.retries, 3);
    assert_eq!(config.target_language, "it");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_shouldRoundTripThroughJson() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.translation.model, config.translation.model);
    assert_eq!(parsed.source_language, config.source_language);
}
