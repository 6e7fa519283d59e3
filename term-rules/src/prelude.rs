//! Prelude for commonly used types and traits in term-rules.

pub use crate::core::{
    validate_dataset, Condition, DatasetValidator, Level, Rule, RuleDefinition, ValidationContext,
    ValidationResult,
};
pub use crate::error::{ErrorContext, Result, RuleError};
pub use crate::logging::LogConfig;
