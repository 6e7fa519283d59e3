//! Dataset rule engine.

use super::evaluator::evaluate_optional;
use super::validation_context::CURRENT_CONTEXT;
use super::{
    EvaluationContext, Row, Rule, RuleDefinition, RuleResult, RuleStatus, ValidationContext,
    ValidationIssue, ValidationMetrics, ValidationResult,
};
use crate::logging::{truncate_field, LogConfig};
use crate::prelude::*;
use crate::sources::csv::parse_csv;
use crate::validators::ValidatorRegistry;
use crate::{log_debug, log_row, log_rule};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Execution settings for a [`DatasetValidator`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rows validated concurrently; results are always reported in row order
    pub max_concurrent_rows: usize,
    pub log_config: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_rows: 1,
            log_config: LogConfig::default(),
        }
    }
}

/// Validates datasets against a rule definition.
///
/// For every row, column rules run in declaration order, then each row
/// validation whose `when` condition holds runs its assertions in order.
/// Failures are collected in that order (row-major) whatever the
/// configured concurrency.
///
/// # Examples
///
/// ```rust
/// use term_rules::core::{DatasetValidator, RuleDefinition, ValidationContext};
/// use serde_json::json;
///
/// # async fn example() -> term_rules::prelude::Result<()> {
/// let definition = RuleDefinition::from_value(json!({
///     "columns": {"a": {"rules": ["required"]}}
/// }))?;
/// let validator = DatasetValidator::builder(definition).parallel().build();
///
/// let rows = vec![
///     json!({"a": "1"}).as_object().cloned().unwrap_or_default(),
///     json!({"a": ""}).as_object().cloned().unwrap_or_default(),
/// ];
/// let result = validator.validate(rows, &ValidationContext::new()).await?;
///
/// assert!(!result.valid);
/// assert_eq!(result.errors[0].row, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DatasetValidator {
    definition: Arc<RuleDefinition>,
    registry: ValidatorRegistry,
    config: EngineConfig,
}

#[derive(Debug, Default)]
struct RowOutcome {
    issues: Vec<ValidationIssue>,
    metrics: ValidationMetrics,
}

impl DatasetValidator {
    /// Creates a validator with the built-in registry and default settings.
    pub fn new(definition: RuleDefinition) -> Self {
        Self::builder(definition).build()
    }

    pub fn builder(definition: RuleDefinition) -> DatasetValidatorBuilder {
        DatasetValidatorBuilder::new(definition)
    }

    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates rows against the definition.
    ///
    /// Configuration problems (unknown rule type, unknown resolver,
    /// unsupported operator, malformed rule options) abort the run with an
    /// error; data failures are collected into the result.
    #[instrument(skip_all, fields(
        definition.columns = self.definition.columns.len(),
        definition.row_validations = self.definition.row_validations.len(),
        engine.concurrency = self.config.max_concurrent_rows
    ))]
    pub async fn validate<I>(&self, rows: I, context: &ValidationContext) -> Result<ValidationResult>
    where
        I: IntoIterator<Item = Row>,
    {
        let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
        info!(
            dataset.rows = rows.len(),
            definition.rules = self.definition.rule_count(),
            "Starting dataset validation"
        );
        let start_time = Instant::now();

        let outcomes: Vec<RowOutcome> = CURRENT_CONTEXT
            .scope(context.clone(), self.run_rows(&rows, context))
            .await?;

        let mut metrics = ValidationMetrics::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            metrics.merge(&outcome.metrics);
            errors.extend(outcome.issues);
        }
        metrics.execution_time_ms = start_time.elapsed().as_millis() as u64;

        if self.config.log_config.log_metrics {
            info!(
                dataset.rows = metrics.rows,
                metrics.total = metrics.total_rules,
                metrics.passed = metrics.passed_rules,
                metrics.failed = metrics.failed_rules,
                metrics.skipped = metrics.skipped_rules,
                metrics.issues = errors.len(),
                metrics.duration_ms = metrics.execution_time_ms,
                "Dataset validation completed"
            );
        } else {
            info!(metrics.issues = errors.len(), "Dataset validation completed");
        }

        Ok(ValidationResult::from_issues(errors, metrics))
    }

    /// Parses CSV text and validates the resulting rows.
    pub async fn validate_csv(&self, text: &str, context: &ValidationContext) -> Result<ValidationResult> {
        let rows = parse_csv(text)?;
        self.validate(rows, context).await
    }

    async fn run_rows(&self, rows: &[Value], context: &ValidationContext) -> Result<Vec<RowOutcome>> {
        stream::iter(rows.iter().enumerate())
            .map(|(index, row)| self.validate_row(index + 1, row, context))
            .buffered(self.config.max_concurrent_rows.max(1))
            .try_collect()
            .await
    }

    async fn validate_row(
        &self,
        row_number: usize,
        row: &Value,
        context: &ValidationContext,
    ) -> Result<RowOutcome> {
        let mut outcome = RowOutcome::default();
        outcome.metrics.rows = 1;

        for column in &self.definition.columns {
            let scope = EvaluationContext::new(row.get(&column.name), row, context);
            for rule in &column.rules {
                let result = self.apply_rule(rule, scope).await?;
                self.record(&mut outcome, row_number, Some(column.name.as_str()), rule, result);
            }
        }

        for (index, validation) in self.definition.row_validations.iter().enumerate() {
            let gate = EvaluationContext::new(Some(row), row, context);
            if !evaluate_optional(validation.when.as_ref(), gate).await? {
                outcome.metrics.gated_row_validations += 1;
                log_rule!(
                    self.config.log_config,
                    row = row_number,
                    row_validation = index,
                    "Row validation gated out"
                );
                continue;
            }

            for assertion in &validation.assertions {
                let column = assertion.target_column();
                let value = match column {
                    Some(name) => row.get(name),
                    None => Some(row),
                };
                let scope = EvaluationContext::new(value, row, context);
                let result = self.apply_rule(&assertion.rule, scope).await?;
                self.record(&mut outcome, row_number, column, &assertion.rule, result);
            }
        }

        log_row!(
            self.config.log_config,
            row = row_number,
            row.issues = outcome.issues.len(),
            "Row validated"
        );
        Ok(outcome)
    }

    async fn apply_rule(&self, rule: &Rule, scope: EvaluationContext<'_>) -> Result<RuleResult> {
        if !rule.is_enabled() {
            return Ok(RuleResult::skipped("rule disabled"));
        }

        let scope = scope.with_rule(rule);
        if !evaluate_optional(rule.only_if.as_ref(), scope).await? {
            return Ok(RuleResult::skipped("onlyIf condition not met"));
        }

        let validator = self.registry.get(&rule.rule_type)?;
        validator.validate(rule, &scope).await
    }

    fn record(
        &self,
        outcome: &mut RowOutcome,
        row_number: usize,
        column: Option<&str>,
        rule: &Rule,
        result: RuleResult,
    ) {
        outcome.metrics.total_rules += 1;
        match result.status {
            RuleStatus::Passed => outcome.metrics.passed_rules += 1,
            RuleStatus::Skipped => {
                outcome.metrics.skipped_rules += 1;
                log_rule!(
                    self.config.log_config,
                    row = row_number,
                    column = ?column,
                    rule.name = %rule.rule_type,
                    reason = ?result.message,
                    "Rule skipped"
                );
            }
            RuleStatus::Failed => {
                outcome.metrics.failed_rules += 1;
                let message = result
                    .message
                    .filter(|message| !message.is_empty())
                    .or_else(|| rule.message.clone().filter(|message| !message.is_empty()))
                    .unwrap_or_else(|| format!("La regla \"{}\" no se cumple", rule.rule_type));

                log_debug!(
                    self.config.log_config,
                    row = row_number,
                    column = ?column,
                    rule.name = %rule.rule_type,
                    issue.message = %truncate_field(&message, self.config.log_config.max_field_length),
                    "Rule failed"
                );

                let mut issue = ValidationIssue::new(row_number, column, &rule.rule_type, message);
                issue.code = rule.code.clone();
                issue.severity = rule.severity.clone();
                issue.meta = result.meta;
                outcome.issues.push(issue);
            }
        }
    }
}

/// Builder for [`DatasetValidator`].
#[derive(Debug)]
pub struct DatasetValidatorBuilder {
    definition: RuleDefinition,
    registry: Option<ValidatorRegistry>,
    config: EngineConfig,
}

impl DatasetValidatorBuilder {
    pub fn new(definition: RuleDefinition) -> Self {
        Self {
            definition,
            registry: None,
            config: EngineConfig::default(),
        }
    }

    /// Uses a custom validator registry instead of the built-in one.
    pub fn registry(mut self, registry: ValidatorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets how many rows may be validated concurrently (minimum 1).
    pub fn max_concurrent_rows(mut self, rows: usize) -> Self {
        self.config.max_concurrent_rows = rows.max(1);
        self
    }

    /// Validates one row per available CPU concurrently.
    pub fn parallel(self) -> Self {
        let cpus = num_cpus::get();
        self.max_concurrent_rows(cpus)
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.config.log_config = log_config;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> DatasetValidator {
        DatasetValidator {
            definition: Arc::new(self.definition),
            registry: self.registry.unwrap_or_else(ValidatorRegistry::builtin),
            config: self.config,
        }
    }
}

/// Validates rows with the built-in validators and default settings.
pub async fn validate_dataset<I>(
    rows: I,
    definition: &RuleDefinition,
    context: &ValidationContext,
) -> Result<ValidationResult>
where
    I: IntoIterator<Item = Row>,
{
    DatasetValidator::new(definition.clone())
        .validate(rows, context)
        .await
}
