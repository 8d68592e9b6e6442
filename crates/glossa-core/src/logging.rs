//! Structured logging schema and tracing initialization for glossa.
//!
//! All crates use these constants for structured logging fields so log
//! aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, operation continued (cascade step, search sync) |
//! | INFO  | Lifecycle events, mutation completions |
//! | DEBUG | Decision points (edge diffs, cascade no-ops, cache misses) |
//! | TRACE | Per-item iteration (each invalidated descendant, each edge) |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::defaults;

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "db", "search"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "term_service", "cascade", "tag_usage", "search_sync", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_term", "propagate", "soft_delete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Term UUID being operated on.
pub const TERM_ID: &str = "term_id";

/// Glossary UUID being operated on.
pub const GLOSSARY_ID: &str = "glossary_id";

/// FQN before a structural change.
pub const OLD_FQN: &str = "old_fqn";

/// FQN after a structural change.
pub const NEW_FQN: &str = "new_fqn";

/// Tag FQN of a label.
pub const TAG_FQN: &str = "tag_fqn";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of rows rewritten or deleted.
pub const ROWS: &str = "rows";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of cache entries invalidated.
pub const INVALIDATED: &str = "invalidated";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily rolling file output)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: [`defaults::LOG_FILTER`])
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub file: Option<String>,
    pub ansi: Option<bool>,
    pub default_filter: Option<String>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let file = std::env::var("LOG_FILE").ok().filter(|f| !f.is_empty());
        let ansi = std::env::var("LOG_ANSI")
            .ok()
            .map(|v| v == "true" || v == "1");

        Self {
            format,
            file,
            ansi,
            default_filter: None,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = Some(filter.into());
        self
    }
}

/// Install the global tracing subscriber.
///
/// Returns the non-blocking writer guard when logging to a file; the caller
/// must hold it for the life of the process or buffered lines are lost.
/// Calling this twice fails because the global subscriber is already set.
pub fn init_tracing(
    config: LogConfig,
) -> crate::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let default_filter = config
        .default_filter
        .clone()
        .unwrap_or_else(|| defaults::LOG_FILTER.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let init_err = |e: tracing_subscriber::util::TryInitError| {
        crate::Error::Config(format!("tracing already initialized: {}", e))
    };

    let guard = if let Some(ref path) = config.file {
        let path = std::path::Path::new(path);
        let file_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(defaults::LOG_FILE_NAME);
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match config.format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .try_init()
                .map_err(init_err)?,
            LogFormat::Text => {
                // No ANSI in files unless explicitly requested
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(config.ansi.unwrap_or(false));
                registry.with(layer).try_init().map_err(init_err)?
            }
        }
        Some(guard)
    } else {
        match config.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(init_err)?,
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = config.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).try_init().map_err(init_err)?
            }
        }
        None
    };

    tracing::info!(
        subsystem = "core",
        component = "logging",
        log_format = ?config.format,
        log_file = config.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_snake_case() {
        for name in [
            SUBSYSTEM, COMPONENT, OPERATION, TERM_ID, GLOSSARY_ID, OLD_FQN, NEW_FQN, TAG_FQN,
            ROWS, DURATION_MS, INVALIDATED, ERROR_MSG,
        ] {
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::default()
            .with_format(LogFormat::Json)
            .with_file("/tmp/glossa/engine.log")
            .with_default_filter("glossa_engine=debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file.as_deref(), Some("/tmp/glossa/engine.log"));
        assert_eq!(config.default_filter.as_deref(), Some("glossa_engine=debug"));
    }

    #[test]
    fn test_default_config_is_text_stdout() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.file.is_none());
    }
}
