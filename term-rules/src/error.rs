//! Error types for the term-rules engine.
//!
//! Every error in this crate is a [`RuleError`]. They describe *configuration*
//! problems (a rule definition that references an unknown validator, a
//! context that lacks a resolver, a malformed option) or I/O problems while
//! loading inputs. A row failing a correctly specified rule is never an
//! error: it becomes a [`ValidationIssue`](crate::core::ValidationIssue) in the
//! run's result instead.

use thiserror::Error;

/// The main error type for the term-rules library.
#[derive(Error, Debug)]
pub enum RuleError {
    /// A rule names a type that has no registered validator.
    #[error("Validator \"{rule_type}\" is not registered")]
    ValidatorNotFound {
        /// The rule type that could not be dispatched
        rule_type: String,
    },

    /// A condition or custom rule names a resolver the context does not provide.
    #[error("Resolver \"{name}\" was not found in the validation context")]
    ResolverNotFound {
        /// Name of the missing resolver
        name: String,
    },

    /// A `compare` rule uses an operator outside the supported set.
    #[error("Unsupported comparison operator \"{operator}\"")]
    UnsupportedOperator {
        /// The operator as written in the rule
        operator: String,
    },

    /// A `custom` rule provides neither an inline validate hook nor a resolver name.
    #[error("Custom rules require either an inline validate function or a resolver")]
    MissingValidateOrResolver,

    /// A rule's options could not be interpreted by its validator.
    #[error("Invalid options for rule \"{rule_type}\": {message}")]
    InvalidRule {
        /// Type of the offending rule
        rule_type: String,
        /// What was wrong with it
        message: String,
    },

    /// A regular expression in a rule or condition could not be compiled.
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Compiler diagnostic
        message: String,
    },

    /// A resolver reported that it could not perform its check at all.
    #[error("Resolver \"{name}\" failed: {message}")]
    ResolverFailed {
        /// Name of the failing resolver
        name: String,
        /// Failure description
        message: String,
    },

    /// A rule definition document could not be parsed.
    #[error("Invalid rule definition: {0}")]
    Definition(String),

    /// Error while materializing rows from a data source.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON (de)serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error related to runtime configuration (logging setup, engine settings).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Another error annotated with what was being attempted.
    #[error("{context}: {source}")]
    Context {
        /// Description of the operation that failed
        context: String,
        /// The underlying error
        #[source]
        source: Box<RuleError>,
    },
}

/// A type alias for `Result<T, RuleError>`.
pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// Converts into a serde error for a nested document element. A
    /// `Definition` error keeps only its message, since the enclosing
    /// document adds the prefix again.
    pub(crate) fn into_de_error<E: serde::de::Error>(self) -> E {
        match self {
            RuleError::Definition(message) => E::custom(message),
            other => E::custom(other),
        }
    }

    /// Creates a validator-not-found error.
    pub fn validator_not_found(rule_type: impl Into<String>) -> Self {
        Self::ValidatorNotFound {
            rule_type: rule_type.into(),
        }
    }

    /// Creates a resolver-not-found error.
    pub fn resolver_not_found(name: impl Into<String>) -> Self {
        Self::ResolverNotFound { name: name.into() }
    }

    /// Creates an invalid-rule error.
    pub fn invalid_rule(rule_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule_type: rule_type.into(),
            message: message.into(),
        }
    }

    /// Creates a resolver failure. Resolvers return this when a capability is
    /// missing (e.g. a backing service is unreachable), not for business rejections.
    pub fn resolver_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolverFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true for errors caused by a malformed rule definition or an
    /// incomplete validation context.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            RuleError::ValidatorNotFound { .. }
            | RuleError::ResolverNotFound { .. }
            | RuleError::UnsupportedOperator { .. }
            | RuleError::MissingValidateOrResolver
            | RuleError::InvalidRule { .. }
            | RuleError::InvalidPattern { .. }
            | RuleError::ResolverFailed { .. }
            | RuleError::Definition(_)
            | RuleError::Configuration(_) => true,
            RuleError::Context { source, .. } => source.is_configuration_error(),
            RuleError::DataSource { .. } | RuleError::Io(_) | RuleError::Json(_) => false,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<RuleError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| RuleError::Context {
            context: msg.to_string(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| RuleError::Context {
            context: f(),
            source: Box::new(e.into()),
        })
    }
}
