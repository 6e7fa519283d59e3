//! `required`: the value must be present and non-empty.

use crate::core::value::is_empty;
use crate::core::{EvaluationContext, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;

const DEFAULT_MESSAGE: &str = "Campo obligatorio";

/// Fails on a missing value, `null` or the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

#[async_trait]
impl Validator for RequiredValidator {
    fn name(&self) -> &str {
        "required"
    }

    fn description(&self) -> Option<&str> {
        Some("Value must be present and non-empty")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        Ok(RuleResult::check(!is_empty(scope.value), || {
            rule.message_or(DEFAULT_MESSAGE)
        }))
    }
}
