use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module provides functions for validating ISO 639-1 (2-letter)
/// and ISO 639-3 (3-letter) language codes and resolving display names
/// for prompts and the run report.
/// Look up a language from a 2- or 3-letter code
pub fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// Validate a language code, returning it normalized to lowercase
pub fn validate_code(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();
    if lookup(&normalized).is_some() {
        Ok(normalized)
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}

/// English display name of a language code, used inside prompts.
/// Falls back to the raw code for anything isolang does not know.
pub fn display_name(code: &str) -> String {
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validateCode_withPart1Codes_shouldAccept() {
        assert_eq!(validate_code("en").unwrap(), "en");
        assert_eq!(validate_code("ZH").unwrap(), "zh");
        assert_eq!(validate_code(" fr ").unwrap(), "fr");
    }

    #[test]
    fn test_validateCode_withPart3Codes_shouldAccept() {
        assert_eq!(validate_code("deu").unwrap(), "deu");
        assert_eq!(validate_code("jpn").unwrap(), "jpn");
    }

    #[test]
    fn test_validateCode_withInvalidCode_shouldError() {
        assert!(validate_code("qq").is_err());
        assert!(validate_code("notalang").is_err());
        assert!(validate_code("").is_err());
    }

    #[test]
    fn test_displayName_shouldResolveKnownCodes() {
        assert_eq!(display_name("en"), "English");
        assert_eq!(display_name("zh"), "Chinese");
    }

    #[test]
    fn test_displayName_withUnknownCode_shouldFallBackToCode() {
        assert_eq!(display_name("xx"), "xx");
    }
}
