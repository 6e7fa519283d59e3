//! Logging utilities and configuration for term-rules.
//!
//! The engine emits `tracing` events; nothing is printed unless the host
//! application installs a subscriber (see [`setup::init_logging`]).

use tracing::Level;

/// Per-run logging configuration for the validation engine.
///
/// Rule-level events can be numerous (one per failing rule per row), so
/// they are opt-in.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Most verbose level the engine emits per-issue events at
    pub base_level: Level,
    /// Whether to log every failed or skipped rule
    pub log_rule_details: bool,
    /// Whether to log each row as it completes
    pub log_row_progress: bool,
    /// Whether to include run metrics in the completion event
    pub log_metrics: bool,
    /// Maximum length for logged values
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_rule_details: false,
            log_row_progress: false,
            log_metrics: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging rule definitions.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_rule_details: true,
            log_row_progress: true,
            log_metrics: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_rule_details: false,
            log_row_progress: false,
            log_metrics: false,
            max_field_length: 128,
        }
    }

    /// Whether `debug`-level engine events are wanted.
    pub fn debug_enabled(&self) -> bool {
        // tracing orders levels by verbosity: TRACE > DEBUG > INFO.
        self.base_level >= Level::DEBUG
    }
}

/// Macro for debug events gated on the configured base level.
#[macro_export]
macro_rules! log_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional rule-level logging.
#[macro_export]
macro_rules! log_rule {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_rule_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional per-row progress logging.
#[macro_export]
macro_rules! log_row {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_row_progress {
            tracing::trace!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` characters.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    match value.char_indices().nth(max_length) {
        None => value.to_string(),
        Some((cut, _)) => {
            let truncated = &value[..cut];
            format!("{truncated}...(truncated)")
        }
    }
}

/// Subscriber setup for applications embedding the engine.
pub mod setup {
    use crate::error::{Result, RuleError};
    use tracing::Level;

    /// Configuration for installing a global `tracing` subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for the term_rules crate specifically
        pub rules_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                rules_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                rules_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                rules_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_rules_level(mut self, level: Level) -> Self {
            self.rules_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},term_rules={}",
                    self.level.as_str().to_lowercase(),
                    self.rules_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global subscriber. `RUST_LOG` takes precedence over the
    /// configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use term_rules::logging::setup::{LoggingConfig, init_logging};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| RuleError::Configuration(format!("failed to install subscriber: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_rule_details);
        assert!(config.log_metrics);
        assert_eq!(config.max_field_length, 256);
    }

    #[test]
    fn test_log_config_presets() {
        assert!(LogConfig::verbose().log_rule_details);
        let production = LogConfig::production();
        assert_eq!(production.base_level, Level::WARN);
        assert!(!production.log_metrics);
    }

    #[test]
    fn test_debug_gate_follows_base_level() {
        assert!(LogConfig::verbose().debug_enabled());
        assert!(!LogConfig::default().debug_enabled());
        assert!(!LogConfig::production().debug_enabled());
        let trace = LogConfig {
            base_level: Level::TRACE,
            ..LogConfig::default()
        };
        assert!(trace.debug_enabled());
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        assert_eq!(truncate_field("Córdoba", 2), "Có...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(LoggingConfig::default().env_filter(), "info,term_rules=debug");
        assert_eq!(
            LoggingConfig::default().with_env_filter("warn").env_filter(),
            "warn"
        );
    }

    #[test]
    fn test_double_init_is_an_error() {
        let first = setup::init_logging(LoggingConfig::default());
        let second = setup::init_logging(LoggingConfig::default());
        assert!(first.is_ok() || second.is_err());
        assert!(matches!(second, Err(crate::error::RuleError::Configuration(_))));
    }
}
