//! `in`: the value must belong to an allowed set.

use crate::core::value::{as_sequence, contains, is_empty, to_display};
use crate::core::{token, EvaluationContext, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::Value;

/// Empty values pass; anything else must be strictly equal to one of the
/// `values`. `values` may be a literal list or a token such as
/// `"$context.catalogo.segmentos"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InValidator;

#[async_trait]
impl Validator for InValidator {
    fn name(&self) -> &str {
        "in"
    }

    fn description(&self) -> Option<&str> {
        Some("Value must be one of an allowed set")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        let tokens = rule
            .option("values")
            .ok_or_else(|| RuleError::invalid_rule(&rule.rule_type, "missing `values`"))?;

        if is_empty(scope.value) {
            return Ok(RuleResult::pass());
        }

        let resolved = token::resolve(tokens, scope);
        let allowed = as_sequence(resolved.as_ref());
        Ok(RuleResult::check(contains(&allowed, scope.value), || {
            let listed = allowed
                .iter()
                .map(|value| match value {
                    Value::Null => String::new(),
                    other => to_display(Some(other)).into_owned(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            rule.message_or(format!("Debe ser uno de: {listed}"))
        }))
    }
}
