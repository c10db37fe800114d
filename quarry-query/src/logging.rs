//! Logging setup for quarry.
//!
//! Library code only emits `tracing` events; nothing is printed unless the
//! application installs a subscriber. With the `tracing-subscriber` feature,
//! [`init`] installs one configured from the environment.
//!
//! # Environment Variables
//!
//! - `QUARRY_DEBUG=true|1|yes` - Enable debug logging
//! - `QUARRY_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `QUARRY_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use quarry_query::logging;
//!
//! // Call once at startup
//! logging::init();
//!
//! // Or force a level regardless of the environment
//! logging::init_with_level("debug");
//! ```
//!
//! Compiled SQL is logged at `trace`, batches and compiled-query summaries at
//! `debug`.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Everything, including compiled SQL text.
    Trace,
    /// Query summaries and association batches.
    Debug,
    /// Generated scripts.
    Info,
    /// Skipped statements and other recoverable problems.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Parse a level name (case-insensitive).
    pub fn parse(level: &str) -> Option<Self> {
        match level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Lowercase name, as accepted by an env filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    fn parse(format: &str) -> Self {
        match format.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Check if `QUARRY_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("QUARRY_DEBUG")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The configured log level.
///
/// `QUARRY_LOG_LEVEL` wins when valid; otherwise `debug` if `QUARRY_DEBUG`
/// is enabled, else `warn`.
pub fn get_log_level() -> LogLevel {
    env::var("QUARRY_LOG_LEVEL")
        .ok()
        .and_then(|level| LogLevel::parse(&level))
        .unwrap_or(if is_debug_enabled() {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
}

/// The configured log format from `QUARRY_LOG_FORMAT`.
pub fn get_log_format() -> LogFormat {
    env::var("QUARRY_LOG_FORMAT")
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default()
}

/// Initialize logging from the environment.
///
/// Does nothing unless `QUARRY_DEBUG` or `QUARRY_LOG_LEVEL` is set. Only the
/// first call of [`init`], [`init_with_level`] or [`init_debug`] has an effect.
pub fn init() {
    if !is_debug_enabled() && env::var("QUARRY_LOG_LEVEL").is_err() {
        return;
    }
    install(get_log_level(), get_log_format());
}

/// Initialize logging at `level`, ignoring the level variables.
///
/// Unknown level names fall back to `warn`.
pub fn init_with_level(level: &str) {
    install(LogLevel::parse(level).unwrap_or(LogLevel::Warn), get_log_format());
}

/// Initialize debug-level logging.
pub fn init_debug() {
    install(LogLevel::Debug, get_log_format());
}

fn install(level: LogLevel, format: LogFormat) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level_name = level.as_str();
            let filter = EnvFilter::try_new(format!(
                "quarry={0},quarry_query={0},quarry_migrate={0}",
                level_name
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level = level_name, format = ?format, "quarry logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = (level, format);
        }
    });
}

/// Debug event emitted only when `QUARRY_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! quarry_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace event emitted only when `QUARRY_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! quarry_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
