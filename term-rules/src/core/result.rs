//! Validation result types.

use super::{Level, Severity};
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Counters collected during a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// Rows validated
    pub rows: usize,
    /// Rule evaluations attempted (including skipped ones)
    pub total_rules: usize,
    pub passed_rules: usize,
    pub failed_rules: usize,
    /// Rules disabled, gated out by `onlyIf`, or skipped by their validator
    pub skipped_rules: usize,
    /// Row validations whose `when` gate did not hold
    pub gated_row_validations: usize,
    /// Wall time in milliseconds
    pub execution_time_ms: u64,
}

impl ValidationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the counters of another run (or row) into this one.
    pub fn merge(&mut self, other: &ValidationMetrics) {
        self.rows += other.rows;
        self.total_rules += other.total_rules;
        self.passed_rules += other.passed_rules;
        self.failed_rules += other.failed_rules;
        self.skipped_rules += other.skipped_rules;
        self.gated_row_validations += other.gated_row_validations;
    }

    /// Returns the pass rate of evaluated (non-skipped) rules as a percentage.
    pub fn success_rate(&self) -> f64 {
        let evaluated = self.passed_rules + self.failed_rules;
        if evaluated == 0 {
            100.0
        } else {
            (self.passed_rules as f64 / evaluated as f64) * 100.0
        }
    }
}

/// One failed rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 1-based row index
    pub row: usize,
    /// Column name; `None` (serialized as `null`) for whole-row assertions
    pub column: Option<String>,
    /// Rule type that failed
    pub rule: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ValidationIssue {
    /// Creates an issue with no code, severity or metadata.
    pub fn new(
        row: usize,
        column: Option<impl Into<String>>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.map(Into::into),
            rule: rule.into(),
            message: message.into(),
            code: None,
            severity: None,
            meta: None,
        }
    }
}

/// The outcome of validating a dataset.
///
/// Serializes as `{"valid": bool, "errors": [...]}`; run metrics are kept
/// out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    #[serde(skip)]
    pub metrics: ValidationMetrics,
}

impl ValidationResult {
    /// Builds a result from an ordered issue list.
    pub fn from_issues(errors: Vec<ValidationIssue>, metrics: ValidationMetrics) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            metrics,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Issues raised for a 1-based row index.
    pub fn errors_for_row(&self, row: usize) -> Vec<&ValidationIssue> {
        self.errors.iter().filter(|issue| issue.row == row).collect()
    }

    /// Issues raised for a column (`None` selects whole-row assertions).
    pub fn errors_for_column(&self, column: Option<&str>) -> Vec<&ValidationIssue> {
        self.errors
            .iter()
            .filter(|issue| issue.column.as_deref() == column)
            .collect()
    }

    /// Issues whose rule declared the given severity.
    pub fn issues_by_severity(&self, level: Level) -> Vec<&ValidationIssue> {
        self.errors
            .iter()
            .filter(|issue| issue.severity.as_ref().is_some_and(|s| *s == level))
            .collect()
    }

    /// Returns true if any issue carries `Level::Error`.
    pub fn has_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|issue| issue.severity.as_ref().is_some_and(|s| *s == Level::Error))
    }

    /// Formats the result as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Formats the result as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
