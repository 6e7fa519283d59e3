//! Token resolution.
//!
//! Rule authors refer to data symbolically. A token is a string such as
//! `$value`, `$row.cuenta`, `$context.tenant` or `$const.limits.max`; any other
//! string, and any non-string JSON value, is a literal. Resolution never fails:
//! a path that cannot be followed resolves to `None`.

use super::{Rule, ValidationContext};
use serde_json::Value;

const VALUE_TOKEN: &str = "$value";
const ROW_TOKEN: &str = "$row";
const CONTEXT_TOKEN: &str = "$context";
const ROW_PREFIX: &str = "$row.";
const CONTEXT_PREFIX: &str = "$context.";
const CONST_PREFIX: &str = "$const.";

const PATH_SEPARATOR: char = '.';
const WILDCARD_SEGMENT: &str = "*";

/// Everything a token or condition can look at while a single rule runs.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// The value under validation (`None` when the column is absent)
    pub value: Option<&'a Value>,
    /// The whole row, as a JSON object
    pub row: &'a Value,
    /// Ambient context for the run
    pub context: &'a ValidationContext,
    /// The rule being evaluated, if any
    pub rule: Option<&'a Rule>,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a context with no rule attached.
    pub fn new(value: Option<&'a Value>, row: &'a Value, context: &'a ValidationContext) -> Self {
        Self {
            value,
            row,
            context,
            rule: None,
        }
    }

    /// Attaches the rule whose constants `$const.` tokens read from.
    pub fn with_rule(mut self, rule: &'a Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Same context, evaluated against a different value.
    pub fn with_value(mut self, value: Option<&'a Value>) -> Self {
        self.value = value;
        self
    }
}

/// Resolves a single token (or an array of tokens, element-wise).
///
/// Array elements that resolve to nothing become `null`, since a JSON array
/// cannot hold a missing value.
pub fn resolve(token: &Value, ctx: &EvaluationContext<'_>) -> Option<Value> {
    match token {
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| resolve(item, ctx).unwrap_or(Value::Null))
                .collect(),
        )),
        Value::String(s) => resolve_str(s, ctx),
        other => Some(other.clone()),
    }
}

/// Resolves a string token. Strings that are not references come back verbatim.
pub fn resolve_str(token: &str, ctx: &EvaluationContext<'_>) -> Option<Value> {
    match token {
        VALUE_TOKEN => return ctx.value.cloned(),
        ROW_TOKEN => return Some(ctx.row.clone()),
        CONTEXT_TOKEN => return Some(ctx.context.data().clone()),
        _ => {}
    }

    if let Some(path) = token.strip_prefix(ROW_PREFIX) {
        access_path(Some(ctx.row), path).cloned()
    } else if let Some(path) = token.strip_prefix(CONTEXT_PREFIX) {
        access_path(Some(ctx.context.data()), path).cloned()
    } else if let Some(path) = token.strip_prefix(CONST_PREFIX) {
        let constants = ctx.rule.and_then(|rule| rule.constants.as_ref());
        access_path(constants, path).cloned()
    } else {
        Some(Value::String(token.to_string()))
    }
}

/// Resolves a list of tokens, keeping missing results as `None`.
pub fn resolve_many(tokens: &[Value], ctx: &EvaluationContext<'_>) -> Vec<Option<Value>> {
    tokens.iter().map(|token| resolve(token, ctx)).collect()
}

/// Walks a dot-separated path.
///
/// An empty path returns the source itself and `*` segments are skipped.
/// Object segments index by key, array segments by position; walking through
/// `null` or a missing value yields `None`.
pub fn access_path<'v>(source: Option<&'v Value>, path: &str) -> Option<&'v Value> {
    let source = source.filter(|value| !value.is_null())?;
    if path.is_empty() {
        return Some(source);
    }

    path.split(PATH_SEPARATOR)
        .try_fold(source, |current, segment| {
            if segment == WILDCARD_SEGMENT {
                return Some(current);
            }
            match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
        })
}
