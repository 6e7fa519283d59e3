//! `number`: numeric values with optional integer and range constraints.

use crate::core::value::{is_empty, to_display, to_number};
use crate::core::{EvaluationContext, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct NumberOptions {
    #[serde(default)]
    min: Option<Value>,
    #[serde(default)]
    max: Option<Value>,
    #[serde(default)]
    integer: Option<bool>,
}

/// Empty values pass; anything else must coerce to a number within the
/// inclusive `[min, max]` range, and to an integer when `integer` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberValidator;

#[async_trait]
impl Validator for NumberValidator {
    fn name(&self) -> &str {
        "number"
    }

    fn description(&self) -> Option<&str> {
        Some("Value must be numeric, optionally integral and within [min, max]")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        let options: NumberOptions = rule.options_as()?;
        if is_empty(scope.value) {
            return Ok(RuleResult::pass());
        }

        let n = to_number(scope.value);
        let message = if n.is_nan() {
            Some("Debe ser numérico".to_string())
        } else if options.integer.unwrap_or(false) && n.fract() != 0.0 {
            Some("Debe ser un número entero".to_string())
        } else if let Some(min) = options.min.as_ref().filter(|min| n < to_number(Some(min))) {
            Some(format!("Debe ser ≥ {}", to_display(Some(min))))
        } else if let Some(max) = options.max.as_ref().filter(|max| n > to_number(Some(max))) {
            Some(format!("Debe ser ≤ {}", to_display(Some(max))))
        } else {
            None
        };

        Ok(match message {
            Some(default) => RuleResult::failure(rule.message_or(default)),
            None => RuleResult::pass(),
        })
    }
}
