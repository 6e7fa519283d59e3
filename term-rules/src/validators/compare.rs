//! `compare`: binary comparison between two token-resolved operands.
//!
//! ```json
//! {"type": "compare", "operator": "lte", "right": "$row.salario", "skipIfEmpty": true}
//! ```

use crate::core::value::{contains, is_empty, is_truthy, strict_equals, to_number};
use crate::core::{token, EvaluationContext, Rule, RuleResult, Validator};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Option keys naming the left operand, in priority order.
pub const LEFT_OPERAND_KEYS: &[&str] = &["left", "target"];

/// Option keys naming the right operand, in priority order.
pub const RIGHT_OPERAND_KEYS: &[&str] = &[
    "right",
    "compareTo",
    "rightFrom",
    "value",
    "expected",
    "equals",
];

const DEFAULT_OPERATOR: &str = "eq";

/// Supported comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    /// Strict equality (`eq`, `equals`)
    Eq,
    /// Strict inequality (`ne`, `notEquals`)
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Right operand is an array containing the left one
    In,
    /// Right operand is an array not containing the left one
    NotIn,
    /// Both strings; left contains right
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOperator {
    /// Applies the operator. Ordering operators coerce both sides to numbers.
    pub fn apply(&self, left: Option<&Value>, right: Option<&Value>) -> bool {
        let numbers = || (to_number(left), to_number(right));
        let strings = || match (left, right) {
            (Some(Value::String(a)), Some(Value::String(b))) => Some((a.as_str(), b.as_str())),
            _ => None,
        };
        match self {
            CompareOperator::Eq => strict_equals(left, right),
            CompareOperator::Ne => !strict_equals(left, right),
            CompareOperator::Gt => {
                let (a, b) = numbers();
                a > b
            }
            CompareOperator::Gte => {
                let (a, b) = numbers();
                a >= b
            }
            CompareOperator::Lt => {
                let (a, b) = numbers();
                a < b
            }
            CompareOperator::Lte => {
                let (a, b) = numbers();
                a <= b
            }
            CompareOperator::In => match right {
                Some(Value::Array(items)) => contains(items, left),
                _ => false,
            },
            CompareOperator::NotIn => match right {
                Some(Value::Array(items)) => !contains(items, left),
                _ => false,
            },
            CompareOperator::Contains => strings().is_some_and(|(a, b)| a.contains(b)),
            CompareOperator::StartsWith => strings().is_some_and(|(a, b)| a.starts_with(b)),
            CompareOperator::EndsWith => strings().is_some_and(|(a, b)| a.ends_with(b)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "eq",
            CompareOperator::Ne => "ne",
            CompareOperator::Gt => "gt",
            CompareOperator::Gte => "gte",
            CompareOperator::Lt => "lt",
            CompareOperator::Lte => "lte",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "notIn",
            CompareOperator::Contains => "contains",
            CompareOperator::StartsWith => "startsWith",
            CompareOperator::EndsWith => "endsWith",
        }
    }
}

impl FromStr for CompareOperator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "eq" | "equals" => CompareOperator::Eq,
            "ne" | "notEquals" => CompareOperator::Ne,
            "gt" => CompareOperator::Gt,
            "gte" => CompareOperator::Gte,
            "lt" => CompareOperator::Lt,
            "lte" => CompareOperator::Lte,
            "in" => CompareOperator::In,
            "notIn" => CompareOperator::NotIn,
            "contains" => CompareOperator::Contains,
            "startsWith" => CompareOperator::StartsWith,
            "endsWith" => CompareOperator::EndsWith,
            other => {
                return Err(RuleError::UnsupportedOperator {
                    operator: other.to_string(),
                })
            }
        })
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compares a left operand (default `$value`) with a right operand.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareValidator;

#[async_trait]
impl Validator for CompareValidator {
    fn name(&self) -> &str {
        "compare"
    }

    fn description(&self) -> Option<&str> {
        Some("Compares two token-resolved operands")
    }

    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
        let operator_key = match rule.option("operator") {
            None => DEFAULT_OPERATOR.to_string(),
            Some(Value::String(key)) => key.clone(),
            Some(other) => other.to_string(),
        };
        let operator: CompareOperator = operator_key.parse()?;

        let default_left = Value::String("$value".to_string());
        let left_token = rule.first_option(LEFT_OPERAND_KEYS).unwrap_or(&default_left);
        let left = token::resolve(left_token, scope);
        let right = rule
            .first_option(RIGHT_OPERAND_KEYS)
            .and_then(|right_token| token::resolve(right_token, scope));

        if is_truthy(rule.option("skipIfEmpty")) && is_empty(left.as_ref()) {
            return Ok(RuleResult::skipped("left operand is empty"));
        }

        Ok(RuleResult::check(
            operator.apply(left.as_ref(), right.as_ref()),
            || rule.message_or(format!("La comparación {operator_key} no se cumple")),
        ))
    }
}
