//! # term-rules - Declarative rule validation for tabular data
//!
//! term-rules validates datasets (rows of named fields) against a rule
//! definition: per-column rules, `onlyIf` gating, cross-field row
//! assertions and delegation to caller-supplied resolvers for checks the
//! engine cannot know about ("does this account exist").
//!
//! ## Quick Start
//!
//! ```rust
//! use term_rules::prelude::*;
//! use term_rules::core::{DatasetValidator, RuleDefinition, ValidationContext};
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let definition = RuleDefinition::from_json(r#"{
//!     "columns": {
//!         "dni": {"rules": [
//!             "required",
//!             {"type": "custom", "resolver": "dniExisteEnCore", "message": "DNI inexistente"}
//!         ]},
//!         "plan": {"rules": [{"type": "in", "values": ["basic", "premium"]}]}
//!     }
//! }"#)?;
//!
//! let context = ValidationContext::new().with_sync_resolver("dniExisteEnCore", |input| {
//!     input.arg_str(0) == Some("12345678")
//! });
//!
//! let validator = DatasetValidator::builder(definition).parallel().build();
//! let result = validator
//!     .validate_csv("dni,plan\n12345678,basic\n99999999,gold\n", &context)
//!     .await?;
//!
//! assert!(!result.valid);
//! for issue in &result.errors {
//!     println!("fila {} [{:?}] {}", issue.row, issue.column, issue.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Features
//!
//! ### Built-in rule types
//!
//! `required`, `number`, `string`, `in`, `compare`, `requiredIf` and
//! `custom`, dispatched through a [`validators::ValidatorRegistry`] that
//! accepts additional [`core::Validator`] implementations.
//!
//! ### Conditions
//!
//! `onlyIf`, `when` and `requiredIf.when` share one condition language:
//! `all` / `any` / `not` combinators, `external` resolver calls and leaf
//! predicates over `$value`, `$row.<path>`, `$context.<path>` and
//! `$const.<path>` tokens.
//!
//! ### Deterministic output
//!
//! Issues are ordered by row, then column declaration, then row-level
//! assertion, whatever the row concurrency configured on the engine.
//!
//! ### Observability
//!
//! Runs emit structured `tracing` events. See [`logging`] for the
//! [`LogConfig`](logging::LogConfig) knobs and subscriber setup.
//!
//! ## Error Handling
//!
//! Configuration errors (unknown rule type or resolver, unsupported
//! operator, invalid options or patterns) abort a run with a
//! [`RuleError`](error::RuleError). Data failures never do; they are
//! collected as [`ValidationIssue`](core::ValidationIssue)s.

pub mod core;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod sources;
pub mod validators;
