/*!
 * Tests for ISO language code validation and display names.
 */

use epubtrans::language_utils::{language_display_name, validate_language_code};

#[test]
fn test_validateLanguageCode_twoLetterCodes_shouldPass() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("fr").is_ok());
    assert!(validate_language_code("IT").is_ok());
    assert!(validate_language_code(" de ").is_ok());
}

#[test]
fn test_validateLanguageCode_threeLetterCodes_shouldPass() {
    assert!(validate_language_code("eng").is_ok());
    assert!(validate_language_code("fra").is_ok());
}

#[test]
fn test_validateLanguageCode_unknownCodes_shouldFail() {
    assert!(validate_language_code("zz").is_err());
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("english").is_err());
}

#[test]
fn test_languageDisplayName_shouldResolveEnglishNames() {
    assert_eq!(language_display_name("en"), "English");
    assert_eq!(language_display_name("fr"), "French");
    assert_eq!(language_display_name("ita"), "Italian");
}

#[test]
fn test_languageDisplayName_unknownCode_shouldFallBackToCode() {
    assert_eq!(language_display_name("xx"), "xx");
}
