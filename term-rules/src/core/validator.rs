//! Validator trait and related types for rule types.

use super::{EvaluationContext, Rule};
use crate::prelude::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// The status of a rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// The value satisfies the rule
    Passed,
    /// The value violates the rule
    Failed,
    /// The rule did not apply to this value
    Skipped,
}

impl RuleStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, RuleStatus::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuleStatus::Failed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RuleStatus::Skipped)
    }
}

/// The result of evaluating one rule against one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub status: RuleStatus,
    /// Failure message, or the reason a rule was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Extra data from a resolver, copied onto the issue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl RuleResult {
    /// Creates a passing result.
    pub fn pass() -> Self {
        Self {
            status: RuleStatus::Passed,
            message: None,
            meta: None,
        }
    }

    /// Creates a failed result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: RuleStatus::Failed,
            message: Some(message.into()),
            meta: None,
        }
    }

    /// Creates a failed result carrying resolver metadata.
    pub fn failure_with_meta(message: impl Into<String>, meta: Option<Value>) -> Self {
        Self {
            status: RuleStatus::Failed,
            message: Some(message.into()),
            meta,
        }
    }

    /// Creates a skipped result.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: RuleStatus::Skipped,
            message: Some(reason.into()),
            meta: None,
        }
    }

    /// Passes when `ok`, otherwise fails with `message`.
    pub fn check(ok: bool, message: impl FnOnce() -> String) -> Self {
        if ok {
            Self::pass()
        } else {
            Self::failure(message())
        }
    }
}

/// The implementation behind one rule type.
///
/// Validators are stateless and shared across rows; everything they need
/// arrives through the rule and the evaluation scope. Returning `Err` aborts
/// the whole run and is reserved for configuration problems; a value that
/// violates the rule is an `Ok` failed result.
///
/// # Examples
///
/// ```rust
/// use term_rules::core::{EvaluationContext, Rule, RuleResult, Validator};
/// use term_rules::prelude::*;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct Cuit;
///
/// #[async_trait]
/// impl Validator for Cuit {
///     fn name(&self) -> &str {
///         "cuit"
///     }
///
///     async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult> {
///         let ok = scope
///             .value
///             .and_then(|v| v.as_str())
///             .is_some_and(|s| s.len() == 11 && s.chars().all(|c| c.is_ascii_digit()));
///         Ok(RuleResult::check(ok, || rule.message_or("CUIT inválido")))
///     }
/// }
/// ```
#[async_trait]
pub trait Validator: Debug + Send + Sync {
    /// Rule type name this validator answers to.
    fn name(&self) -> &str;

    /// Short human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Validates `scope.value` (within `scope.row`) against `rule`.
    async fn validate(&self, rule: &Rule, scope: &EvaluationContext<'_>) -> Result<RuleResult>;
}
