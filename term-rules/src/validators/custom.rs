//! `custom`: delegates the check to a resolver.

use crate::core::{token, EvaluationContext, ResolverInput, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const DEFAULT_MESSAGE: &str = "Validación personalizada no superada";

/// Runs an inline validate hook, or the resolver named by `resolver` (or
/// `external`) in the validation context.
///
/// `args` are tokens resolved against the current scope (default
/// `["$value"]`). The resolver's verdict is interpreted as follows: `true`
/// passes, `false` fails, a non-empty string fails with that message, and a
/// report fails unless its `valid` is `true`, carrying its `meta` onto the
/// issue.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomValidator;

impl CustomValidator {
    fn resolve_args(rule: &Rule, scope: &EvaluationContext<'_>) -> Vec<Value> {
        let default_args = [Value::String("$value".to_string())];
        let tokens: &[Value] = match rule.option("args") {
            None => &default_args,
            Some(Value::Array(tokens)) => tokens,
            Some(single) => std::slice::from_ref(single),
        };
        tokens
            .iter()
            .map(|arg| token::resolve(arg, scope).unwrap_or(Value::Null))
            .collect()
    }
}

#[async_trait]
impl Validator for CustomValidator {
    fn name(&self) -> &str {
        "custom"
    }

    fn description(&self) -> Option<&str> {
        Some("Delegates to an inline hook or a named resolver")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        let (label, resolver) = match &rule.hooks.validate {
            Some(inline) => ("inline".to_string(), inline.clone()),
            None => {
                let name = rule
                    .first_option(&["resolver", "external"])
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .ok_or(RuleError::MissingValidateOrResolver)?;
                (name.to_string(), scope.context.resolver(name)?)
            }
        };

        let input = ResolverInput::from_scope(scope, Self::resolve_args(rule, scope));
        let outcome = resolver.resolve(input).await?;
        debug!(
            resolver.name = %label,
            resolver.passed = outcome.is_truthy(),
            "Custom rule resolved"
        );

        Ok(
            match outcome.into_failure(rule.message.as_deref(), DEFAULT_MESSAGE) {
                Some((message, meta)) => RuleResult::failure_with_meta(message, meta),
                None => RuleResult::pass(),
            },
        )
    }
}
