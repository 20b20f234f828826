//! Payload encoding checks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Predicate deciding whether a payload string is acceptable.
pub type PayloadValidator = fn(&str) -> bool;

/// True if `s` decodes as standard, padded base64.
///
/// Embedded ASCII whitespace (line breaks in wrapped encodings) is ignored.
/// The empty string is valid and decodes to zero bytes.
pub fn is_base64(s: &str) -> bool {
    if s.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD.decode(compact).is_ok()
    } else {
        STANDARD.decode(s).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_padded_base64() {
        assert!(is_base64("aGVsbG8="));
        assert!(is_base64("aGVsbG8gd29ybGQ="));
        assert!(is_base64("YWJj"));
    }

    #[test]
    fn accepts_empty() {
        assert!(is_base64(""));
    }

    #[test]
    fn accepts_wrapped_lines() {
        assert!(is_base64("aGVs\nbG8g\r\nd29y bGQ="));
    }

    #[test]
    fn rejects_garbage() {
        assert!(!is_base64("not-base64!"));
        assert!(!is_base64("abc"));
        assert!(!is_base64("a==="));
    }

    #[test]
    fn rejects_url_safe_alphabet() {
        assert!(!is_base64("-_-_"));
    }
}
