//! Rule definition documents.
//!
//! A definition declares per-column rules and optional row-level validations:
//!
//! ```json
//! {
//!   "columns": {
//!     "id": {"rules": ["required"]},
//!     "comentario": {"rules": [{"type": "string", "minLength": 5}]}
//!   },
//!   "rowValidations": [
//!     {
//!       "when": {"field": "estado", "equals": "aprobado"},
//!       "assertions": [{"column": "aprobador", "rule": "required"}]
//!     }
//!   ]
//! }
//! ```
//!
//! Columns are evaluated in document order.

use super::rule::{deserialize_rule_entries, deserialize_rule_entry};
use super::{Condition, Rule};
use crate::prelude::*;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

/// A complete rule definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    /// Column rules, in declaration order
    #[serde(
        default,
        serialize_with = "serialize_columns",
        deserialize_with = "deserialize_columns"
    )]
    pub columns: Vec<ColumnDefinition>,
    /// Row-level validations, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_validations: Vec<RowValidation>,
}

/// The rules declared for one column.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub name: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ColumnBody {
    #[serde(default, deserialize_with = "deserialize_rule_entries")]
    rules: Vec<Rule>,
}

/// A group of assertions gated by a shared condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowValidation {
    /// Gate evaluated with the whole row as the current value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

/// A rule applied to one column (or the whole row) of every matching row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(deserialize_with = "deserialize_rule_entry")]
    pub rule: Rule,
}

impl Assertion {
    /// An assertion over a single column.
    pub fn column(column: impl Into<String>, rule: impl Into<Rule>) -> Self {
        Self {
            column: Some(column.into()),
            field: None,
            target: None,
            rule: rule.into(),
        }
    }

    /// An assertion over the whole row.
    pub fn row(rule: impl Into<Rule>) -> Self {
        Self {
            column: None,
            field: None,
            target: None,
            rule: rule.into(),
        }
    }

    /// The column this assertion validates, `None` for the whole row.
    ///
    /// Looks at `column`, then the rule's own `field`/`target` options, then
    /// the assertion's `field` and `target`.
    pub fn target_column(&self) -> Option<&str> {
        let from_rule = |key: &str| self.rule.option(key).and_then(Value::as_str);
        self.column
            .as_deref()
            .or_else(|| from_rule("field"))
            .or_else(|| from_rule("target"))
            .or(self.field.as_deref())
            .or(self.target.as_deref())
            .filter(|name| !name.is_empty())
    }
}

impl RuleDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or extends) a column's rules.
    pub fn column<I, R>(mut self, name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        let name = name.into();
        let rules = rules.into_iter().map(Into::into);
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.rules.extend(rules),
            None => self.columns.push(ColumnDefinition {
                name,
                rules: rules.collect(),
            }),
        }
        self
    }

    /// Adds a row-level validation.
    pub fn row_validation(
        mut self,
        when: Option<Condition>,
        assertions: impl IntoIterator<Item = Assertion>,
    ) -> Self {
        self.row_validations.push(RowValidation {
            when,
            assertions: assertions.into_iter().collect(),
        });
        self
    }

    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RuleError::Definition(e.to_string()))
    }

    /// Parses a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| RuleError::Definition(e.to_string()))
    }

    /// Builds a definition from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| RuleError::Definition(e.to_string()))
    }

    /// Loads a definition file; `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    #[instrument(skip_all, fields(definition.path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read rule definition {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let definition = if is_yaml {
            Self::from_yaml(&text)
        } else {
            Self::from_json(&text)
        }
        .with_context(|| format!("Failed to parse rule definition {}", path.display()))?;

        debug!(
            definition.columns = definition.columns.len(),
            definition.row_validations = definition.row_validations.len(),
            definition.format = if is_yaml { "yaml" } else { "json" },
            "Loaded rule definition"
        );
        Ok(definition)
    }

    /// Number of rules declared, column and row-level.
    pub fn rule_count(&self) -> usize {
        let column_rules: usize = self.columns.iter().map(|c| c.rules.len()).sum();
        let row_rules: usize = self
            .row_validations
            .iter()
            .map(|rv| rv.assertions.len())
            .sum();
        column_rules + row_rules
    }
}

fn serialize_columns<S>(columns: &[ColumnDefinition], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(columns.len()))?;
    for column in columns {
        map.serialize_entry(
            &column.name,
            &ColumnBody {
                rules: column.rules.clone(),
            },
        )?;
    }
    map.end()
}

fn deserialize_columns<'de, D>(deserializer: D) -> std::result::Result<Vec<ColumnDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ColumnsVisitor;

    impl<'de> Visitor<'de> for ColumnsVisitor {
        type Value = Vec<ColumnDefinition>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of column names to {\"rules\": [...]}")
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, body)) = access.next_entry::<String, ColumnBody>()? {
                columns.push(ColumnDefinition {
                    name,
                    rules: body.rules,
                });
            }
            Ok(columns)
        }
    }

    deserializer.deserialize_map(ColumnsVisitor)
}
