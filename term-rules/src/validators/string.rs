//! `string`: text length, pattern and case checks.

use crate::core::value::{format_number, is_empty, to_display};
use crate::core::{pattern, EvaluationContext, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StringOptions {
    #[serde(default)]
    allow_empty: Option<bool>,
    #[serde(default)]
    trim: Option<bool>,
    #[serde(default)]
    min_length: Option<f64>,
    #[serde(default)]
    max_length: Option<f64>,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    flags: Option<String>,
    #[serde(default)]
    uppercase: Option<bool>,
    #[serde(default)]
    lowercase: Option<bool>,
}

/// Validates text. Checks run in a fixed order and the first violation wins:
/// emptiness, `minLength`, `maxLength`, `length`, `pattern`, `uppercase`,
/// `lowercase`. The value is trimmed first unless `trim` is `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValidator;

impl StringValidator {
    fn violation(options: &StringOptions, text: &str) -> Result<Option<String>> {
        let length = text.chars().count() as f64;

        if let Some(min) = options.min_length.filter(|min| length < *min) {
            return Ok(Some(format!(
                "Debe tener al menos {} caracteres",
                format_number(min)
            )));
        }
        if let Some(max) = options.max_length.filter(|max| length > *max) {
            return Ok(Some(format!(
                "Debe tener como máximo {} caracteres",
                format_number(max)
            )));
        }
        if let Some(exact) = options.length.filter(|exact| length != *exact) {
            return Ok(Some(format!(
                "Debe tener exactamente {} caracteres",
                format_number(exact)
            )));
        }
        if let Some(pattern) = options.pattern.as_deref().filter(|p| !p.is_empty()) {
            let flags = options.flags.as_deref().unwrap_or_default();
            if !pattern::is_match(pattern, flags, text)? {
                return Ok(Some("Formato inválido".to_string()));
            }
        }
        if options.uppercase == Some(true) && text != text.to_uppercase() {
            return Ok(Some("Debe estar en mayúsculas".to_string()));
        }
        if options.lowercase == Some(true) && text != text.to_lowercase() {
            return Ok(Some("Debe estar en minúsculas".to_string()));
        }
        Ok(None)
    }
}

#[async_trait]
impl Validator for StringValidator {
    fn name(&self) -> &str {
        "string"
    }

    fn description(&self) -> Option<&str> {
        Some("Text length, pattern and case checks")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        let options: StringOptions = rule.options_as()?;

        if is_empty(scope.value) {
            return Ok(if options.allow_empty == Some(false) {
                RuleResult::failure(rule.message_or("El texto no puede estar vacío"))
            } else {
                RuleResult::pass()
            });
        }

        let raw = to_display(scope.value);
        let text = if options.trim == Some(false) {
            raw.as_ref()
        } else {
            raw.trim()
        };

        Ok(match Self::violation(&options, text)? {
            Some(default) => RuleResult::failure(rule.message_or(default)),
            None => RuleResult::pass(),
        })
    }
}
