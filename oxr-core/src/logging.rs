//! Structured logging setup.
//!
//! Tracing-based logging with multi-level output, structured fields,
//! environment variable configuration (`RUST_LOG`) and Pretty/Compact/JSON
//! formats.

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level: most detailed debugging information.
    Trace,
    /// Debug level: detailed debugging information.
    Debug,
    /// Info level: important events.
    Info,
    /// Warn level: potential issues.
    Warn,
    /// Error level: error information.
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable formatted output.
    Pretty,
    /// Compact format.
    Compact,
    /// JSON format for production environments.
    Json,
}

/// Log configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level.
    pub level: LogLevel,
    /// Log format.
    pub format: LogFormat,
    /// Whether to show thread IDs.
    pub show_thread_ids: bool,
    /// Whether to show the target module.
    pub show_target: bool,
    /// Whether to show span events (enter/close).
    pub show_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            show_thread_ids: false,
            show_target: true,
            show_span_events: false,
        }
    }
}

impl LogConfig {
    /// Configuration for development environments.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            show_span_events: true,
            ..Self::default()
        }
    }

    /// Configuration for production environments.
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            show_thread_ids: true,
            ..Self::default()
        }
    }

    /// Configuration for test environments.
    pub fn test() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            show_target: false,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "oxr_core={},oxr_client={}",
                self.level, self.level
            ))
        })
    }

    fn span_events(&self) -> FmtSpan {
        if self.show_span_events {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

macro_rules! build_layer {
    ($config:expr, $fmt:ident) => {
        fmt::layer()
            .$fmt()
            .with_thread_ids($config.show_thread_ids)
            .with_target($config.show_target)
            .with_span_events($config.span_events())
            .with_filter($config.env_filter())
    };
}

/// Initializes the logging system. Panics if a global subscriber is already
/// installed; use [`try_init_logging`] in tests.
///
/// ```no_run
/// use oxr_core::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::development());
/// ```
pub fn init_logging(config: &LogConfig) {
    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(build_layer!(config, pretty))
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(build_layer!(config, compact))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(build_layer!(config, json))
                .init();
        }
    }
}

/// Attempts to initialize the logging system, ignoring duplicate
/// initialization. Suitable for test environments.
pub fn try_init_logging(config: &LogConfig) {
    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_layer!(config, pretty))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(build_layer!(config, compact))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_layer!(config, json))
            .try_init(),
    };

    let _ = result;
}
