//! Condition evaluation.

use super::condition::{Condition, ExternalCall, Predicate};
use super::resolver::ResolverInput;
use super::token::{self, EvaluationContext};
use super::value::{
    as_sequence, coerce_number, contains, is_empty, is_truthy, strict_equals, to_number, to_text,
};
use super::{pattern, Rule};
use crate::prelude::*;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

/// Evaluates a condition tree.
///
/// Children of `all` and `any` are all evaluated (concurrently) before the
/// results are combined, so every resolver referenced by a combinator runs
/// exactly once per evaluation. The first error aborts the evaluation.
pub fn evaluate<'a>(
    condition: &'a Condition,
    ctx: EvaluationContext<'a>,
) -> BoxFuture<'a, Result<bool>> {
    async move {
        match condition {
            Condition::All(children) => {
                let results = try_join_all(children.iter().map(|child| evaluate(child, ctx))).await?;
                Ok(results.into_iter().all(|passed| passed))
            }
            Condition::Any(children) => {
                let results = try_join_all(children.iter().map(|child| evaluate(child, ctx))).await?;
                Ok(results.into_iter().any(|passed| passed))
            }
            Condition::Not(inner) => Ok(!evaluate(inner, ctx).await?),
            Condition::External(call) => run_external(call, ctx).await,
            Condition::Leaf(predicate) => evaluate_predicate(predicate, &ctx),
        }
    }
    .boxed()
}

/// Evaluates an optional condition; an absent condition holds.
pub async fn evaluate_optional(
    condition: Option<&Condition>,
    ctx: EvaluationContext<'_>,
) -> Result<bool> {
    match condition {
        Some(condition) => evaluate(condition, ctx).await,
        None => Ok(true),
    }
}

async fn run_external(call: &ExternalCall, ctx: EvaluationContext<'_>) -> Result<bool> {
    let resolver = ctx.context.resolver(&call.name)?;

    let args = if call.args.is_empty() {
        vec![
            ctx.value.cloned().unwrap_or(Value::Null),
            ctx.row.clone(),
            ctx.context.data().clone(),
            ctx.rule.map(Rule::to_value).unwrap_or(Value::Null),
        ]
    } else {
        call.args
            .iter()
            .map(|arg| token::resolve(arg, &ctx).unwrap_or(Value::Null))
            .collect()
    };

    let outcome = resolver.resolve(ResolverInput::from_scope(&ctx, args)).await?;
    let passed = outcome.is_truthy();
    debug!(
        resolver.name = %call.name,
        resolver.passed = passed,
        "External condition evaluated"
    );
    Ok(passed)
}

/// Evaluates a leaf predicate. Every family the predicate sets must hold;
/// a predicate that sets none tests the truthiness of its operand.
pub fn evaluate_predicate(predicate: &Predicate, ctx: &EvaluationContext<'_>) -> Result<bool> {
    let left_owned = token::resolve(&predicate.left_token(), ctx);
    let left = left_owned.as_ref();
    let mut applied = false;

    if let Some(expected) = &predicate.present {
        applied = true;
        if is_truthy(Some(expected)) == is_empty(left) {
            return Ok(false);
        }
    }

    if let Some(expected) = &predicate.empty {
        applied = true;
        if is_truthy(Some(expected)) != is_empty(left) {
            return Ok(false);
        }
    }

    if predicate.length_equals.is_some()
        || predicate.min_length.is_some()
        || predicate.max_length.is_some()
    {
        applied = true;
        let length = to_text(left).chars().count() as f64;
        if predicate.length_equals.is_some_and(|n| length != n)
            || predicate.min_length.is_some_and(|n| length < n)
            || predicate.max_length.is_some_and(|n| length > n)
        {
            return Ok(false);
        }
    }

    if let Some(regex) = predicate.regex.as_deref().filter(|p| !p.is_empty()) {
        applied = true;
        let compiled = pattern::compile(regex, predicate.flags.as_deref().unwrap_or_default())?;
        match left {
            Some(Value::String(text)) if compiled.is_match(text) => {}
            _ => return Ok(false),
        }
    }

    if is_truthy(predicate.in_values.as_ref()) {
        applied = true;
        let candidates = predicate
            .in_values
            .as_ref()
            .and_then(|tokens| token::resolve(tokens, ctx));
        if !contains(&as_sequence(candidates.as_ref()), left) {
            return Ok(false);
        }
    }

    if is_truthy(predicate.not_in.as_ref()) {
        applied = true;
        let candidates = predicate
            .not_in
            .as_ref()
            .and_then(|tokens| token::resolve(tokens, ctx));
        if contains(&as_sequence(candidates.as_ref()), left) {
            return Ok(false);
        }
    }

    if predicate.equals.is_some() || predicate.equals_from.is_some() {
        applied = true;
        let right = right_operand(&predicate.equals, &predicate.equals_from, ctx);
        if !strict_equals(left, right.as_ref()) {
            return Ok(false);
        }
    }

    if predicate.not_equals.is_some() || predicate.not_equals_from.is_some() {
        applied = true;
        let right = right_operand(&predicate.not_equals, &predicate.not_equals_from, ctx);
        if strict_equals(left, right.as_ref()) {
            return Ok(false);
        }
    }

    if predicate.gt.is_some()
        || predicate.gte.is_some()
        || predicate.lt.is_some()
        || predicate.lte.is_some()
    {
        applied = true;
        let Some(number) = coerce_number(left) else {
            return Ok(false);
        };
        let violated = |bound: &Option<Value>, holds: fn(f64, f64) -> bool| {
            bound
                .as_ref()
                .is_some_and(|bound| !holds(number, to_number(Some(bound))))
        };
        if violated(&predicate.gt, |n, b| n > b)
            || violated(&predicate.gte, |n, b| n >= b)
            || violated(&predicate.lt, |n, b| n < b)
            || violated(&predicate.lte, |n, b| n <= b)
        {
            return Ok(false);
        }
    }

    if let Some(expected) = &predicate.truthy {
        applied = true;
        if is_truthy(left) != is_truthy(Some(expected)) {
            return Ok(false);
        }
    }

    if let Some(expected) = &predicate.falsy {
        applied = true;
        if !is_truthy(left) != is_truthy(Some(expected)) {
            return Ok(false);
        }
    }

    Ok(applied || is_truthy(left))
}

/// The literal operand, unless a truthy `*From` token overrides it.
fn right_operand(
    literal: &Option<Value>,
    from: &Option<Value>,
    ctx: &EvaluationContext<'_>,
) -> Option<Value> {
    match from {
        Some(token) if is_truthy(Some(token)) => token::resolve(token, ctx),
        _ => literal.clone(),
    }
}
