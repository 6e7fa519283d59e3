//! Caller-supplied resolvers for checks the engine cannot perform itself.
//!
//! A resolver answers a domain question ("does this DNI exist in the core
//! banking system?") for a `custom` rule or an `external` condition. Resolvers
//! are registered by name on the [`ValidationContext`](super::ValidationContext)
//! and may be asynchronous.

use crate::prelude::*;
use crate::core::value::is_truthy;
use crate::core::{EvaluationContext, Rule};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Everything a resolver is called with.
///
/// `custom` rules fill every field; `external` conditions pass their resolved
/// argument tokens in `args` (by default `[value, row, context, rule]`) and
/// the surrounding scope in the other fields.
#[derive(Debug, Clone)]
pub struct ResolverInput {
    /// The value under validation
    pub value: Option<Value>,
    /// The whole row
    pub row: Value,
    /// Ambient context data
    pub context: Arc<Value>,
    /// The rule that triggered the call
    pub rule: Option<Rule>,
    /// Resolved argument tokens
    pub args: Vec<Value>,
}

impl ResolverInput {
    /// Captures the scope of an evaluation along with resolved arguments.
    pub fn from_scope(scope: &EvaluationContext<'_>, args: Vec<Value>) -> Self {
        Self {
            value: scope.value.cloned(),
            row: scope.row.clone(),
            context: scope.context.shared_data(),
            rule: scope.rule.cloned(),
            args,
        }
    }

    /// Returns the argument at `index`, `None` past the end.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Returns the argument at `index` as a string slice, if it is one.
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(Value::as_str)
    }

    /// Returns a field of the row.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.row.get(name)
    }
}

/// A structured resolver verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverReport {
    /// Verdict; a report without one is treated as passing by conditions and
    /// as failing by `custom` rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ResolverReport {
    pub fn valid() -> Self {
        Self {
            valid: Some(true),
            ..Default::default()
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            message: Some(message.into()),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// What a resolver returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverOutcome {
    Valid,
    Invalid,
    /// A failure message. An empty message counts as a pass.
    Message(String),
    Report(ResolverReport),
}

impl ResolverOutcome {
    /// Verdict as seen by an `external` condition.
    pub fn is_truthy(&self) -> bool {
        match self {
            ResolverOutcome::Valid => true,
            ResolverOutcome::Invalid => false,
            ResolverOutcome::Message(message) => !message.is_empty(),
            ResolverOutcome::Report(report) => report.valid.unwrap_or(true),
        }
    }

    /// Verdict as seen by a `custom` rule.
    ///
    /// Returns `None` when the rule passes, otherwise the failure message and
    /// metadata. The message is the resolver's own, then `rule_message`, then
    /// `default_message`.
    pub fn into_failure(
        self,
        rule_message: Option<&str>,
        default_message: &str,
    ) -> Option<(String, Option<Value>)> {
        let fallback = || {
            rule_message
                .filter(|m| !m.is_empty())
                .unwrap_or(default_message)
                .to_string()
        };
        match self {
            ResolverOutcome::Valid => None,
            ResolverOutcome::Invalid => Some((fallback(), None)),
            ResolverOutcome::Message(message) if message.is_empty() => None,
            ResolverOutcome::Message(message) => Some((message, None)),
            ResolverOutcome::Report(report) => {
                if report.valid == Some(true) {
                    return None;
                }
                let message = report
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(fallback);
                Some((message, report.meta))
            }
        }
    }
}

impl From<bool> for ResolverOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            ResolverOutcome::Valid
        } else {
            ResolverOutcome::Invalid
        }
    }
}

impl From<String> for ResolverOutcome {
    fn from(message: String) -> Self {
        ResolverOutcome::Message(message)
    }
}

impl From<&str> for ResolverOutcome {
    fn from(message: &str) -> Self {
        ResolverOutcome::Message(message.to_string())
    }
}

impl From<ResolverReport> for ResolverOutcome {
    fn from(report: ResolverReport) -> Self {
        ResolverOutcome::Report(report)
    }
}

impl From<Value> for ResolverOutcome {
    /// Interprets an arbitrary JSON result: booleans and strings map directly,
    /// objects read `valid`/`message`/`meta`, anything else by truthiness.
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(valid) => valid.into(),
            Value::String(message) => ResolverOutcome::Message(message),
            Value::Object(mut map) => {
                let valid = map.remove("valid").map(|v| is_truthy(Some(&v)));
                let message = match map.remove("message") {
                    Some(Value::String(s)) => Some(s),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                let meta = map.remove("meta").filter(|m| !m.is_null());
                ResolverOutcome::Report(ResolverReport {
                    valid,
                    message,
                    meta,
                })
            }
            other => is_truthy(Some(&other)).into(),
        }
    }
}

/// A named domain check.
///
/// # Examples
///
/// ```rust
/// use term_rules::core::{Resolver, ResolverInput, ResolverOutcome};
/// use term_rules::prelude::*;
/// use async_trait::async_trait;
///
/// struct KnownAccounts(Vec<String>);
///
/// #[async_trait]
/// impl Resolver for KnownAccounts {
///     async fn resolve(&self, input: ResolverInput) -> Result<ResolverOutcome> {
///         let account = input.arg_str(0).unwrap_or_default();
///         Ok(self.0.iter().any(|known| known == account).into())
///     }
/// }
/// ```
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Performs the check.
    ///
    /// Return `Err` only when the check could not run at all; a negative
    /// answer is an `Ok` outcome.
    async fn resolve(&self, input: ResolverInput) -> Result<ResolverOutcome>;
}

/// Adapts an async closure into a [`Resolver`].
pub struct FnResolver<F> {
    func: F,
}

impl<F> FnResolver<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut, O> Resolver for FnResolver<F>
where
    F: Fn(ResolverInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
    O: Into<ResolverOutcome> + Send,
{
    async fn resolve(&self, input: ResolverInput) -> Result<ResolverOutcome> {
        (self.func)(input).await.map(Into::into)
    }
}

/// Adapts a synchronous closure into a [`Resolver`].
pub struct SyncResolver<F> {
    func: F,
}

impl<F> SyncResolver<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, O> Resolver for SyncResolver<F>
where
    F: Fn(&ResolverInput) -> O + Send + Sync,
    O: Into<ResolverOutcome> + Send,
{
    async fn resolve(&self, input: ResolverInput) -> Result<ResolverOutcome> {
        Ok((self.func)(&input).into())
    }
}

/// Resolvers available to a run, by name.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a resolver.
    pub fn register(&mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) {
        self.resolvers.insert(name.into(), resolver);
    }

    /// Looks up a resolver, failing with [`RuleError::ResolverNotFound`].
    pub fn get(&self, name: &str) -> Result<Arc<dyn Resolver>> {
        self.resolvers
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::resolver_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &names)
            .finish()
    }
}
