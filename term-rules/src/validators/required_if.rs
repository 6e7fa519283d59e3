//! `requiredIf`: the value is required only when a condition holds.

use crate::core::evaluator::evaluate;
use crate::core::value::{as_sequence, contains, is_empty, is_truthy, strict_equals};
use crate::core::{token, Condition, EvaluationContext, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequiredIfOptions {
    #[serde(default)]
    depends_on: Option<String>,
    #[serde(default)]
    when: Option<Condition>,
    #[serde(default)]
    equals: Option<Value>,
    #[serde(default, rename = "in")]
    in_values: Option<Value>,
}

/// Makes a field required depending on the rest of the row.
///
/// Whether the field is required comes from, in order: an inline predicate
/// attached with [`Rule::with_predicate`], a `when` condition, or the
/// `dependsOn` column compared with `equals`, with `in`, or tested for
/// truthiness.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredIfValidator;

impl RequiredIfValidator {
    async fn is_required(
        rule: &Rule,
        options: &RequiredIfOptions,
        scope: &EvaluationContext<'_>,
    ) -> Result<bool> {
        let dependency = options
            .depends_on
            .as_deref()
            .and_then(|column| scope.row.get(column));

        if let Some(predicate) = &rule.hooks.predicate {
            return Ok(predicate(dependency, scope.row));
        }
        if let Some(when) = &options.when {
            return evaluate(when, *scope).await;
        }
        if options.depends_on.is_none() {
            return Err(RuleError::invalid_rule(
                &rule.rule_type,
                "requires `dependsOn`, `when` or an inline predicate",
            ));
        }

        if let Some(expected) = &options.equals {
            let expected = token::resolve(expected, scope);
            return Ok(strict_equals(dependency, expected.as_ref()));
        }
        if let Some(candidates) = &options.in_values {
            let candidates = token::resolve(candidates, scope);
            return Ok(contains(&as_sequence(candidates.as_ref()), dependency));
        }
        Ok(is_truthy(dependency))
    }
}

#[async_trait]
impl Validator for RequiredIfValidator {
    fn name(&self) -> &str {
        "requiredIf"
    }

    fn description(&self) -> Option<&str> {
        Some("Value is required when a dependent condition holds")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        let options: RequiredIfOptions = rule.options_as()?;
        let required = Self::is_required(rule, &options, scope).await?;

        Ok(RuleResult::check(!(required && is_empty(scope.value)), || {
            rule.message_or(match &options.depends_on {
                Some(column) => format!("Campo requerido si {column} cumple condición"),
                None => "Campo requerido por condición".to_string(),
            })
        }))
    }
}
