//! Core rule evaluation types.
//!
//! ## Overview
//!
//! - **[`RuleDefinition`]**: per-column rules plus gated row-level assertions
//! - **[`Rule`]**: one rule invocation (`type` plus options, `onlyIf` gate,
//!   message, code and severity)
//! - **[`Condition`]**: the boolean DSL (`all`, `any`, `not`, `external`,
//!   leaf predicates) used by `onlyIf`, `when` and `requiredIf`
//! - **[`token`]**: `$value`, `$row.<path>`, `$context.<path>` and
//!   `$const.<path>` references
//! - **[`Validator`]**: the contract every rule type implements
//! - **[`DatasetValidator`]**: runs a definition over rows and collects an
//!   ordered list of [`ValidationIssue`]s
//!
//! ## Architecture
//!
//! ```text
//! DatasetValidator
//!     ├── columns (declaration order)
//!     │   └── Rule ── onlyIf? ── Validator
//!     └── rowValidations
//!         └── when? ── Assertion ── Rule ── onlyIf? ── Validator
//! ```
//!
//! ## Example
//!
//! ```rust
//! use term_rules::core::{validate_dataset, RuleDefinition, ValidationContext};
//! use serde_json::json;
//!
//! # async fn example() -> term_rules::prelude::Result<()> {
//! let definition = RuleDefinition::from_value(json!({
//!     "columns": {
//!         "monto": {"rules": [{"type": "number", "min": 100, "max": 2000}]}
//!     },
//!     "rowValidations": [{
//!         "when": {"field": "canal", "equals": "online"},
//!         "assertions": [{"column": "codigo", "rule": "required"}]
//!     }]
//! }))?;
//!
//! let row = json!({"monto": "50", "canal": "online", "codigo": ""});
//! let rows = row.as_object().cloned().into_iter();
//! let result = validate_dataset(rows, &definition, &ValidationContext::new()).await?;
//!
//! assert_eq!(result.errors.len(), 2);
//! assert_eq!(result.errors[0].message, "Debe ser ≥ 100");
//! assert_eq!(result.errors[1].column.as_deref(), Some("codigo"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Rule Status
//!
//! - **Passed**: the value satisfies the rule
//! - **Failed**: an issue is recorded
//! - **Skipped**: the rule is disabled, its `onlyIf` did not hold, or the
//!   validator declined to apply (e.g. `compare` with `skipIfEmpty`)

mod condition;
mod definition;
mod engine;
pub mod evaluator;
mod level;
pub mod pattern;
mod resolver;
mod result;
mod rule;
pub mod token;
pub mod validation_context;
mod validator;
pub mod value;

pub use condition::{Condition, ExternalCall, Predicate};
pub use definition::{Assertion, ColumnDefinition, RowValidation, RuleDefinition};
pub use engine::{validate_dataset, DatasetValidator, DatasetValidatorBuilder, EngineConfig};
pub use level::{Level, Severity};
pub use resolver::{
    FnResolver, Resolver, ResolverInput, ResolverOutcome, ResolverRegistry, ResolverReport,
    SyncResolver,
};
pub use result::{ValidationIssue, ValidationMetrics, ValidationResult};
pub use rule::{RequiredIfPredicate, Rule, RuleHooks};
pub use token::EvaluationContext;
pub use validation_context::{current_validation_context, ValidationContext};
pub use validator::{RuleResult, RuleStatus, Validator};

/// A dataset row: column name to value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;
