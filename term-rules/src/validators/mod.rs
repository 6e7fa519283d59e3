//! Built-in validators and the registry that dispatches rules to them.
//!
//! Each rule type is implemented by a [`Validator`](crate::core::Validator)
//! registered under its type name:
//!
//! | type         | validator                 |
//! |--------------|---------------------------|
//! | `required`   | [`RequiredValidator`]     |
//! | `number`     | [`NumberValidator`]       |
//! | `string`     | [`StringValidator`]       |
//! | `in`         | [`InValidator`]           |
//! | `compare`    | [`CompareValidator`]      |
//! | `requiredIf` | [`RequiredIfValidator`]   |
//! | `custom`     | [`CustomValidator`]       |
//!
//! Additional rule types are added by registering more validators:
//!
//! ```rust
//! use term_rules::validators::ValidatorRegistry;
//! # use term_rules::core::{EvaluationContext, Rule, RuleResult, Validator};
//! # use term_rules::prelude::*;
//! # use async_trait::async_trait;
//! # #[derive(Debug)]
//! # struct Cbu;
//! # #[async_trait]
//! # impl Validator for Cbu {
//! #     fn name(&self) -> &str { "cbu" }
//! #     async fn validate(&self, _: &Rule, _: &EvaluationContext<'_>) -> Result<RuleResult> {
//! #         Ok(RuleResult::pass())
//! #     }
//! # }
//!
//! let mut registry = ValidatorRegistry::builtin();
//! registry.register(Cbu);
//! assert!(registry.contains("cbu"));
//! assert!(registry.contains("requiredIf"));
//! ```

mod compare;
mod custom;
mod membership;
mod number;
mod required;
mod required_if;
mod string;

pub use compare::{CompareOperator, CompareValidator, LEFT_OPERAND_KEYS, RIGHT_OPERAND_KEYS};
pub use custom::CustomValidator;
pub use membership::InValidator;
pub use number::NumberValidator;
pub use required::RequiredValidator;
pub use required_if::RequiredIfValidator;
pub use string::StringValidator;

use crate::core::Validator;
use crate::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps rule type names to validators.
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// A registry with no validators at all.
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// A registry with the seven built-in rule types.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(RequiredValidator);
        registry.register(NumberValidator);
        registry.register(StringValidator);
        registry.register(InValidator);
        registry.register(CompareValidator);
        registry.register(RequiredIfValidator);
        registry.register(CustomValidator);
        registry
    }

    /// Registers a validator under its own name, replacing any previous one.
    pub fn register<V: Validator + 'static>(&mut self, validator: V) -> &mut Self {
        self.register_arc(Arc::new(validator))
    }

    /// Registers a shared validator under its own name.
    pub fn register_arc(&mut self, validator: Arc<dyn Validator>) -> &mut Self {
        self.validators
            .insert(validator.name().to_string(), validator);
        self
    }

    /// Registers a validator under an alias.
    pub fn register_as(&mut self, name: impl Into<String>, validator: Arc<dyn Validator>) -> &mut Self {
        self.validators.insert(name.into(), validator);
        self
    }

    /// Looks up the validator for a rule type.
    pub fn get(&self, rule_type: &str) -> Result<&Arc<dyn Validator>> {
        self.validators
            .get(rule_type)
            .ok_or_else(|| RuleError::validator_not_found(rule_type))
    }

    pub fn contains(&self, rule_type: &str) -> bool {
        self.validators.contains_key(rule_type)
    }

    /// Registered rule type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = ValidatorRegistry::builtin();
        assert_eq!(
            registry.names(),
            ["compare", "custom", "in", "number", "required", "requiredIf", "string"]
        );
    }

    #[test]
    fn test_unknown_type() {
        let registry = ValidatorRegistry::default();
        assert!(matches!(
            registry.get("iban"),
            Err(RuleError::ValidatorNotFound { ref rule_type }) if rule_type == "iban"
        ));
        assert!(ValidatorRegistry::empty().get("required").is_err());
    }

    #[test]
    fn test_alias() {
        let mut registry = ValidatorRegistry::empty();
        registry.register_as("obligatorio", Arc::new(RequiredValidator));
        assert_eq!(registry.get("obligatorio").unwrap().name(), "required");
        assert_eq!(registry.len(), 1);
    }
}
