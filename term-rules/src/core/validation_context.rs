//! Ambient context shared by every row of a validation run.
//!
//! The context carries caller data (what `$context.<path>` tokens read) and
//! the named resolvers that `custom` rules and `external` conditions call. It
//! is read-only during a run and cheap to clone.

use super::resolver::{FnResolver, Resolver, ResolverInput, ResolverOutcome, ResolverRegistry, SyncResolver};
use crate::prelude::*;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Runtime context for validation operations.
///
/// # Examples
///
/// ```rust
/// use term_rules::core::ValidationContext;
/// use serde_json::json;
///
/// let ctx = ValidationContext::new()
///     .with_data(json!({"tenant": "ar"}))
///     .with_sync_resolver("dniExisteEnCore", |input| {
///         matches!(input.arg_str(0), Some("12345678") | Some("87654321"))
///     });
///
/// assert_eq!(ctx.data()["tenant"], "ar");
/// assert!(ctx.resolvers().contains("dniExisteEnCore"));
/// ```
#[derive(Debug, Clone)]
pub struct ValidationContext {
    data: Arc<Value>,
    resolvers: ResolverRegistry,
}

impl ValidationContext {
    /// Creates an empty context: no data, no resolvers.
    pub fn new() -> Self {
        Self {
            data: Arc::new(Value::Object(Map::new())),
            resolvers: ResolverRegistry::new(),
        }
    }

    /// Replaces the ambient data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Arc::new(data);
        self
    }

    /// Registers a resolver implementation.
    pub fn with_resolver(mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.register(name, resolver);
        self
    }

    /// Registers an async closure as a resolver.
    pub fn with_resolver_fn<F, Fut, O>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(ResolverInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
        O: Into<ResolverOutcome> + Send + 'static,
    {
        self.with_resolver(name, Arc::new(FnResolver::new(func)))
    }

    /// Registers a synchronous closure as a resolver.
    pub fn with_sync_resolver<F, O>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&ResolverInput) -> O + Send + Sync + 'static,
        O: Into<ResolverOutcome> + Send + 'static,
    {
        self.with_resolver(name, Arc::new(SyncResolver::new(func)))
    }

    /// Replaces the whole resolver registry.
    pub fn with_resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Ambient data as seen by `$context` tokens.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Shared handle to the ambient data.
    pub fn shared_data(&self) -> Arc<Value> {
        Arc::clone(&self.data)
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    /// Looks up a resolver by name.
    pub fn resolver(&self, name: &str) -> Result<Arc<dyn Resolver>> {
        self.resolvers.get(name)
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

// Task-local storage for the context of the run in progress, so resolvers
// can reach it without threading it through their own state.
tokio::task_local! {
    pub static CURRENT_CONTEXT: ValidationContext;
}

/// Gets the context of the validation run in progress.
///
/// Returns an empty context outside of a run.
pub fn current_validation_context() -> ValidationContext {
    CURRENT_CONTEXT
        .try_with(|ctx| ctx.clone())
        .unwrap_or_default()
}
