//! Logging utilities and configuration for term-stats.
//!
//! The library only emits `tracing` events and spans. Installing a subscriber
//! is left to the application; [`setup::init_logging`] is a convenience for
//! binaries and tests.

use tracing::Level;

/// Logging configuration for statistics operations.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Most verbose level term-stats emits; query and value events need `DEBUG` or `TRACE`
    pub base_level: Level,
    /// Whether to log the text of every query sent to the engine
    pub log_queries: bool,
    /// Whether to log decoded statistic values
    pub log_decoded_values: bool,
    /// Maximum length for logged query text
    pub max_query_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_queries: true,
            log_decoded_values: false,
            max_query_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_queries: true,
            log_decoded_values: true,
            max_query_length: 4096,
        }
    }

    /// True when `base_level` admits debug events.
    pub fn debug_enabled(&self) -> bool {
        self.base_level >= Level::DEBUG
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_queries: false,
            log_decoded_values: false,
            max_query_length: 128,
        }
    }
}

/// Logs a query at debug level when query logging is enabled and
/// `base_level` admits debug events.
#[macro_export]
macro_rules! log_query {
    ($config:expr, $query:expr) => {
        if $config.log_queries && $config.debug_enabled() {
            tracing::debug!(
                query = %$crate::logging::truncate_field($query, $config.max_query_length),
                "Executing statistics query"
            );
        }
    };
}

/// Logs decoded values at debug level when value logging is enabled and
/// `base_level` admits debug events.
#[macro_export]
macro_rules! log_decode {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_decoded_values && $config.debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
///
/// The cut lands on a character boundary at or below `max_length` bytes.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        value.to_string()
    } else {
        let mut end = max_length;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...(truncated)", &value[..end])
    }
}

/// Utilities for installing a `tracing` subscriber.
pub mod setup {
    use tracing::Level;

    /// Configuration for the subscriber installed by [`init_logging`].
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for term-stats specifically
        pub stats_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                stats_level: Level::DEBUG,
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
                stats_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Sets the log level for term-stats components.
        pub fn with_stats_level(mut self, level: Level) -> Self {
            self.stats_level = level;
            self
        }

        /// Sets whether to use JSON output format.
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
                    "{},term_stats={}",
                    self.level.as_str().to_lowercase(),
                    self.stats_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global `fmt` subscriber honoring `RUST_LOG` when set.
    ///
    /// Fails if a global subscriber has already been installed.
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
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
            .try_init()?;

        Ok(())
    }
}
