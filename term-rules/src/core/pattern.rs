//! Compiled regular expression cache.

use crate::prelude::*;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::RwLock;

/// Compiled patterns keyed by `(pattern, flags)`, shared by every run in the process.
static PATTERN_CACHE: Lazy<RwLock<HashMap<(String, String), Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns a compiled regex for `pattern` with the given flag letters.
///
/// Supported flags are `i` (case-insensitive), `m` (multi-line), `s` (dot
/// matches newline) and `u` (Unicode, always on). `g`, `y` and `d` only affect
/// iteration state and are ignored for a single test.
pub fn compile(pattern: &str, flags: &str) -> Result<Regex> {
    let key = (pattern.to_string(), flags.to_string());

    {
        let cache = PATTERN_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(regex) = cache.get(&key) {
            return Ok(regex.clone());
        }
    }

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'u' => {
                builder.unicode(true);
            }
            'g' | 'y' | 'd' => {}
            other => {
                return Err(RuleError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: format!("unsupported flag '{other}'"),
                })
            }
        }
    }

    let regex = builder.build().map_err(|e| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut cache = PATTERN_CACHE.write().unwrap_or_else(|e| e.into_inner());
    cache.insert(key, regex.clone());
    Ok(regex)
}

/// Compiles (or fetches) the pattern and tests it against `text`.
pub fn is_match(pattern: &str, flags: &str, text: &str) -> Result<bool> {
    Ok(compile(pattern, flags)?.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_flag() {
        assert!(is_match("comportamiento", "i", "Buen COMPORTAMIENTO").unwrap());
        assert!(!is_match("comportamiento", "", "Buen COMPORTAMIENTO").unwrap());
    }

    #[test]
    fn test_ignored_flags() {
        assert!(is_match(r"^\d+$", "gy", "123").unwrap());
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = compile("abc", "x").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = compile("(unclosed", "").unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_cache_reuse() {
        let first = compile(r"^OP-\d{6}$", "").unwrap();
        let second = compile(r"^OP-\d{6}$", "").unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }
}
