//! Rule documents.

use super::{Condition, Resolver, ResolverInput, ResolverOutcome, Severity, SyncResolver};
use crate::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Inline predicate for `requiredIf`: receives the `dependsOn` value and the row.
pub type RequiredIfPredicate = Arc<dyn Fn(Option<&Value>, &Value) -> bool + Send + Sync>;

/// One rule applied to a column or a row.
///
/// In documents a rule is either a bare type name (`"required"`) or an object
/// with a `type` and type-specific options:
///
/// ```json
/// {"type": "number", "min": 100, "max": 2000, "message": "Fuera de rango",
///  "onlyIf": {"field": "tipo", "equals": "planta"}}
/// ```
///
/// Options the engine itself does not interpret are kept in
/// [`options`](Rule::options) for the rule's validator.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Validator name
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Message used when the rule fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Caller-defined code copied onto issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    /// Copied onto issues as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// `false` disables the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Gate: the rule only runs for rows where this holds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_if: Option<Condition>,
    /// Values reachable through `$const.<path>` tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<Value>,
    /// Validator-specific options
    #[serde(flatten)]
    pub options: Map<String, Value>,
    #[serde(skip)]
    pub hooks: RuleHooks,
}

/// Behaviour attached in code rather than in a document.
#[derive(Clone, Default)]
pub struct RuleHooks {
    /// Inline check for `custom` rules
    pub validate: Option<Arc<dyn Resolver>>,
    /// Inline "is required" test for `requiredIf` rules
    pub predicate: Option<RequiredIfPredicate>,
}

impl fmt::Debug for RuleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleHooks")
            .field("validate", &self.validate.is_some())
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Rule");
        s.field("type", &self.rule_type);
        if let Some(message) = &self.message {
            s.field("message", message);
        }
        if let Some(only_if) = &self.only_if {
            s.field("only_if", only_if);
        }
        if !self.options.is_empty() {
            s.field("options", &self.options);
        }
        if self.hooks.validate.is_some() || self.hooks.predicate.is_some() {
            s.field("hooks", &self.hooks);
        }
        s.finish_non_exhaustive()
    }
}

impl Rule {
    /// Creates a rule of the given type with no options.
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            message: None,
            code: None,
            severity: None,
            enabled: None,
            only_if: None,
            constants: None,
            options: Map::new(),
            hooks: RuleHooks::default(),
        }
    }

    /// Parses a rule entry: a bare type name or a rule object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(rule_type) => Ok(Rule::new(rule_type)),
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| RuleError::Definition(format!("invalid rule: {e}"))),
            other => Err(RuleError::Definition(format!(
                "a rule must be a type name or an object, found {other}"
            ))),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<Value>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_severity(mut self, severity: impl Into<Severity>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    /// Sets a validator option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_only_if(mut self, condition: impl Into<Condition>) -> Self {
        self.only_if = Some(condition.into());
        self
    }

    pub fn with_constants(mut self, constants: Value) -> Self {
        self.constants = Some(constants);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = Some(false);
        self
    }

    /// Attaches an inline check for a `custom` rule.
    pub fn with_validate(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.hooks.validate = Some(resolver);
        self
    }

    /// Attaches a synchronous inline check for a `custom` rule.
    pub fn with_validate_fn<F, O>(self, func: F) -> Self
    where
        F: Fn(&ResolverInput) -> O + Send + Sync + 'static,
        O: Into<ResolverOutcome> + Send + 'static,
    {
        self.with_validate(Arc::new(SyncResolver::new(func)))
    }

    /// Attaches an inline "is required" test for a `requiredIf` rule.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> bool + Send + Sync + 'static,
    {
        self.hooks.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// Returns an option, treating `null` as absent.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key).filter(|value| !value.is_null())
    }

    /// Returns the first present option among synonymous keys.
    pub fn first_option(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|key| self.option(key))
    }

    /// Deserializes the validator options into a typed struct.
    pub fn options_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.options.clone()))
            .map_err(|e| RuleError::invalid_rule(&self.rule_type, e.to_string()))
    }

    /// The rule's own message, or `default` when it has none.
    pub fn message_or(&self, default: impl Into<String>) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => default.into(),
        }
    }

    /// JSON form of the rule as passed to resolvers.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for Rule {
    fn from(rule_type: &str) -> Self {
        Rule::new(rule_type)
    }
}

impl From<String> for Rule {
    fn from(rule_type: String) -> Self {
        Rule::new(rule_type)
    }
}

/// Deserializes a single rule entry (name or object).
pub(crate) fn deserialize_rule_entry<'de, D>(deserializer: D) -> std::result::Result<Rule, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Rule::from_value(value).map_err(RuleError::into_de_error)
}

/// Deserializes a list of rule entries (names or objects).
pub(crate) fn deserialize_rule_entries<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<Rule>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| Rule::from_value(value).map_err(RuleError::into_de_error))
        .collect()
}
