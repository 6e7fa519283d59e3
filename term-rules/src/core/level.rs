//! Rule severity levels.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The severity attached to a rule and copied onto every issue it raises.
///
/// Levels are ordered by severity: Error > Warning > Info. Severity is
/// informational only; any issue, whatever its level, makes a run invalid.
///
/// # Examples
///
/// ```rust
/// use term_rules::core::{Level, Rule};
///
/// let rule = Rule::new("string")
///     .with_option("maxLength", 280)
///     .with_severity(Level::Warning);
///
/// assert!(Level::Error > Level::Warning);
/// assert_eq!(rule.severity.and_then(|s| s.level()), Some(Level::Warning));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Worth knowing, not worth blocking on
    Info = 0,
    /// Should be reviewed
    #[default]
    Warning = 1,
    /// Must be fixed
    Error = 2,
}

impl Level {
    /// Returns the string representation of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }

    /// Checks if this level is at least as severe as another level.
    pub fn is_at_least(&self, other: Level) -> bool {
        *self >= other
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rule's declared severity, as written in the document.
///
/// `info`, `warning` and `error` parse as a [`Level`]; any other value
/// (`"critical"`, `3`, ...) is kept verbatim and copied onto issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Severity {
    Level(Level),
    Other(Value),
}

impl Severity {
    /// The known level, if the severity is one.
    pub fn level(&self) -> Option<Level> {
        match self {
            Severity::Level(level) => Some(*level),
            Severity::Other(_) => None,
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        Severity::Level(level)
    }
}

impl From<&str> for Severity {
    fn from(text: &str) -> Self {
        serde_json::from_value(Value::String(text.to_string()))
            .unwrap_or_else(|_| Severity::Other(Value::String(text.to_string())))
    }
}

impl PartialEq<Level> for Severity {
    fn eq(&self, other: &Level) -> bool {
        self.level() == Some(*other)
    }
}
