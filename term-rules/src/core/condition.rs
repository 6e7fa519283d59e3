//! The boolean condition language used by `onlyIf`, `when` and `requiredIf`.
//!
//! A condition document is one of:
//!
//! - a bare array, meaning "all of these";
//! - `{"all": [...]}`, `{"any": [...]}` or `{"not": {...}}`;
//! - `{"external": "name", "args": [...]}` (or `"resolver"` instead of
//!   `"external"`), delegating to a resolver from the validation context;
//! - a leaf predicate such as `{"field": "score", "gte": 80}`.
//!
//! `null` and `{}` are vacuously true.
//!
//! # Examples
//!
//! ```rust
//! use term_rules::core::{Condition, Predicate};
//! use serde_json::json;
//!
//! let parsed: Condition = serde_json::from_value(json!({
//!     "all": [
//!         {"field": "estado", "equals": "aprobado"},
//!         {"any": [{"field": "score", "gte": 80}, {"field": "categoria", "in": ["gold"]}]}
//!     ]
//! })).unwrap();
//!
//! let built = Condition::all([
//!     Predicate::field("estado").equals("aprobado").into(),
//!     Condition::any([
//!         Predicate::field("score").gte(80).into(),
//!         Predicate::field("categoria").one_of(["gold"]).into(),
//!     ]),
//! ]);
//!
//! assert_eq!(parsed, built);
//! ```

use crate::prelude::*;
use crate::core::value::is_truthy;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A recursive condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// True iff every child is true; an empty list is true.
    All(Vec<Condition>),
    /// True iff at least one child is true; an empty list is false.
    Any(Vec<Condition>),
    /// Negation of the inner condition.
    Not(Box<Condition>),
    /// Delegation to a named resolver.
    External(ExternalCall),
    /// A predicate over a single resolved value.
    Leaf(Predicate),
}

/// A call to a resolver from a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCall {
    /// Resolver name in the validation context
    pub name: String,
    /// Argument tokens. When empty the resolver receives
    /// `[value, row, context, rule]`.
    pub args: Vec<Value>,
}

/// Leaf predicate.
///
/// The left operand is `target`, else `left`, else `$row.<field>`, else
/// `$value`. Every comparison family that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Value>,

    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub present: Option<Value>,
    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub empty: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_equals: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,

    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub in_values: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Value>,

    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub equals_from: Option<Value>,
    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub not_equals: Option<Value>,
    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub not_equals_from: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,

    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub truthy: Option<Value>,
    #[serde(default, deserialize_with = "explicit", skip_serializing_if = "Option::is_none")]
    pub falsy: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)` so "key present" survives.
fn explicit<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Condition {
    /// A condition that is always true.
    pub fn always() -> Self {
        Condition::All(Vec::new())
    }

    /// All of the given conditions.
    pub fn all(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::All(children.into_iter().collect())
    }

    /// Any of the given conditions.
    pub fn any(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Any(children.into_iter().collect())
    }

    /// Negates a condition.
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: impl Into<Condition>) -> Self {
        Condition::Not(Box::new(inner.into()))
    }

    /// Delegates to a named resolver with the given argument tokens.
    pub fn external<I, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::External(ExternalCall {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    /// Builds a condition from its JSON form.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Condition::always()),
            Value::Array(items) => Ok(Condition::All(
                items
                    .into_iter()
                    .map(Condition::from_value)
                    .collect::<Result<_>>()?,
            )),
            Value::Object(map) => Self::from_object(map),
            other => Err(RuleError::Definition(format!(
                "a condition must be an object or an array, found {other}"
            ))),
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Result<Self> {
        if map.is_empty() {
            return Ok(Condition::always());
        }

        if is_truthy(map.get("all")) {
            return Self::children(map.remove("all"), "all").map(Condition::All);
        }
        if is_truthy(map.get("any")) {
            return Self::children(map.remove("any"), "any").map(Condition::Any);
        }
        if is_truthy(map.get("not")) {
            let inner = map.remove("not").unwrap_or(Value::Null);
            return Ok(Condition::Not(Box::new(Condition::from_value(inner)?)));
        }

        let external = ["external", "resolver"]
            .into_iter()
            .find(|key| is_truthy(map.get(*key)));
        if let Some(key) = external {
            let name = match map.remove(key) {
                Some(Value::String(name)) => name,
                other => {
                    return Err(RuleError::Definition(format!(
                        "resolver name must be a string, found {}",
                        other.unwrap_or(Value::Null)
                    )))
                }
            };
            let args = match map.remove("args") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(args)) => args,
                Some(single) => vec![single],
            };
            return Ok(Condition::External(ExternalCall { name, args }));
        }

        serde_json::from_value(Value::Object(map))
            .map(Condition::Leaf)
            .map_err(|e| RuleError::Definition(format!("invalid condition predicate: {e}")))
    }

    fn children(value: Option<Value>, key: &str) -> Result<Vec<Condition>> {
        match value {
            Some(Value::Array(items)) => items.into_iter().map(Condition::from_value).collect(),
            _ => Err(RuleError::Definition(format!(
                "`{key}` must hold an array of conditions"
            ))),
        }
    }

    /// Returns the JSON form of this condition.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Condition::Leaf(predicate)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Condition::from_value(value).map_err(RuleError::into_de_error)
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Condition::All(children) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("all", children)?;
                map.end()
            }
            Condition::Any(children) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("any", children)?;
                map.end()
            }
            Condition::Not(inner) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("not", inner)?;
                map.end()
            }
            Condition::External(call) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("external", &call.name)?;
                map.serialize_entry("args", &call.args)?;
                map.end()
            }
            Condition::Leaf(predicate) => predicate.serialize(serializer),
        }
    }
}

impl Predicate {
    /// A predicate over `$row.<name>`.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            ..Default::default()
        }
    }

    /// A predicate over an arbitrary token.
    pub fn target(token: impl Into<Value>) -> Self {
        Self {
            target: Some(token.into()),
            ..Default::default()
        }
    }

    /// A predicate over the current value.
    pub fn value() -> Self {
        Self::target("$value")
    }

    pub fn present(mut self, expected: bool) -> Self {
        self.present = Some(Value::Bool(expected));
        self
    }

    pub fn empty(mut self, expected: bool) -> Self {
        self.empty = Some(Value::Bool(expected));
        self
    }

    pub fn length_equals(mut self, length: usize) -> Self {
        self.length_equals = Some(length as f64);
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length as f64);
        self
    }

    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length as f64);
        self
    }

    /// Requires the left operand to be a string matching `pattern`.
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(flags.into());
        self
    }

    /// Membership in a literal list (`in` in documents).
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_values = Some(Value::Array(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Membership in whatever a token resolves to.
    pub fn in_token(mut self, token: impl Into<Value>) -> Self {
        self.in_values = Some(token.into());
        self
    }

    pub fn not_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.not_in = Some(Value::Array(values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn equals(mut self, expected: impl Into<Value>) -> Self {
        self.equals = Some(expected.into());
        self
    }

    pub fn equals_from(mut self, token: impl Into<Value>) -> Self {
        self.equals_from = Some(token.into());
        self
    }

    pub fn not_equals(mut self, expected: impl Into<Value>) -> Self {
        self.not_equals = Some(expected.into());
        self
    }

    pub fn not_equals_from(mut self, token: impl Into<Value>) -> Self {
        self.not_equals_from = Some(token.into());
        self
    }

    pub fn gt(mut self, bound: impl Into<Value>) -> Self {
        self.gt = Some(bound.into());
        self
    }

    pub fn gte(mut self, bound: impl Into<Value>) -> Self {
        self.gte = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<Value>) -> Self {
        self.lt = Some(bound.into());
        self
    }

    pub fn lte(mut self, bound: impl Into<Value>) -> Self {
        self.lte = Some(bound.into());
        self
    }

    pub fn truthy(mut self, expected: bool) -> Self {
        self.truthy = Some(Value::Bool(expected));
        self
    }

    pub fn falsy(mut self, expected: bool) -> Self {
        self.falsy = Some(Value::Bool(expected));
        self
    }

    /// Token naming the left operand.
    pub fn left_token(&self) -> Value {
        if let Some(target) = &self.target {
            return target.clone();
        }
        if let Some(left) = &self.left {
            return left.clone();
        }
        match self.field.as_deref() {
            Some(field) if !field.is_empty() => Value::String(format!("$row.{field}")),
            _ => Value::String("$value".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_is_all() {
        let condition: Condition =
            serde_json::from_value(json!([{"field": "a", "present": true}])).unwrap();
        assert!(matches!(condition, Condition::All(ref c) if c.len() == 1));
    }

    #[test]
    fn test_external_and_resolver_keys() {
        let a: Condition = serde_json::from_value(json!({"external": "x"})).unwrap();
        let b: Condition = serde_json::from_value(json!({"resolver": "x", "args": []})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Condition::external("x", Vec::<Value>::new()));
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let condition: Condition =
            serde_json::from_value(json!({"field": "x", "equals": null})).unwrap();
        let Condition::Leaf(predicate) = condition else {
            panic!("expected leaf");
        };
        assert_eq!(predicate.equals, Some(Value::Null));
        assert_eq!(predicate.gt, None);
    }

    #[test]
    fn test_empty_and_null_are_always() {
        assert_eq!(Condition::from_value(json!({})).unwrap(), Condition::always());
        assert_eq!(Condition::from_value(Value::Null).unwrap(), Condition::always());
    }

    #[test]
    fn test_malformed_combinator() {
        let err = Condition::from_value(json!({"all": {"field": "x"}})).unwrap_err();
        assert!(matches!(err, RuleError::Definition(_)));
        assert!(Condition::from_value(json!("texto")).is_err());
    }

    #[test]
    fn test_serialize_round_trips_structure() {
        let condition = Condition::not(Predicate::field("estado").equals("bloqueado"));
        let value = condition.to_value();
        assert_eq!(value, json!({"not": {"field": "estado", "equals": "bloqueado"}}));
        assert_eq!(Condition::from_value(value).unwrap(), condition);
    }

    #[test]
    fn test_left_token_precedence() {
        assert_eq!(Predicate::field("a").left_token(), json!("$row.a"));
        assert_eq!(Predicate::default().left_token(), json!("$value"));
        let mut p = Predicate::field("a");
        p.left = Some(json!("$context.x"));
        assert_eq!(p.left_token(), json!("$context.x"));
        p.target = Some(json!(5));
        assert_eq!(p.left_token(), json!(5));
    }
}
