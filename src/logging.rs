//! Structured logging for promptlib
//!
//! Logging is opt-in: the binary only installs a subscriber when
//! `PROMPTLIB_LOG_LEVEL` is set. Everything goes to stderr so command output
//! on stdout stays pipeable.

use anyhow::Result;
use std::env;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

pub const LEVEL_VAR: &str = "PROMPTLIB_LOG_LEVEL";

/// Logging configuration for different environments
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
    pub colored: bool,
    /// Include file and line of the event
    pub with_location: bool,
    /// Emit span open/close events
    pub with_spans: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines, one object per event
    Json,
    /// Multi-line human-readable
    Pretty,
    /// Compact single-line format
    Compact,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Pretty,
            colored: is_terminal::IsTerminal::is_terminal(&std::io::stderr()),
            with_location: false,
            with_spans: false,
        }
    }
}

fn flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl LogConfig {
    /// Whether the user asked for logging at all
    pub fn requested() -> bool {
        env::var(LEVEL_VAR).is_ok()
    }

    /// Create logging configuration from `PROMPTLIB_LOG_*` variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let level = lookup(LEVEL_VAR).unwrap_or_else(|| "error".to_string());

        let format = match lookup("PROMPTLIB_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let colored = lookup("PROMPTLIB_LOG_COLOR")
            .map(|v| flag(&v))
            .unwrap_or_else(|| is_terminal::IsTerminal::is_terminal(&std::io::stderr()));

        let with_location = lookup("PROMPTLIB_LOG_LOCATION")
            .map(|v| flag(&v))
            .unwrap_or(false);

        let with_spans = lookup("PROMPTLIB_LOG_SPANS")
            .map(|v| flag(&v))
            .unwrap_or(false);

        Self {
            level,
            format,
            colored,
            with_location,
            with_spans,
        }
    }
}

/// Install the global tracing subscriber
pub fn init_logging(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("error"));

    let span_events = if config.with_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.colored)
        .with_span_events(span_events)
        .with_file(config.with_location)
        .with_line_number(config.with_location);

    match config.format {
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logging: {}", e))?,
        LogFormat::Pretty => subscriber
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize pretty logging: {}", e))?,
        LogFormat::Compact => subscriber
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize compact logging: {}", e))?,
    }

    debug!(
        level = %config.level,
        format = ?config.format,
        colored = config.colored,
        "Logging initialized"
    );

    Ok(())
}

/// Log a command execution with timing
pub fn log_command_execution<T>(command_name: &str, duration_ms: u64, result: &Result<T>) {
    let span = tracing::info_span!(
        "command_execution",
        command = command_name,
        duration_ms = duration_ms,
        success = result.is_ok()
    );
    let _enter = span.enter();

    match result {
        Ok(_) => info!(
            command = command_name,
            duration_ms = duration_ms,
            "Command completed"
        ),
        Err(e) => error!(
            command = command_name,
            duration_ms = duration_ms,
            error = %e,
            "Command failed"
        ),
    }
}

/// Log a store operation; `record_id` is absent for whole-document operations
pub fn log_storage_operation(
    operation: &str,
    record_id: Option<&str>,
    success: bool,
    duration_ms: Option<u64>,
) {
    let span = tracing::info_span!(
        "storage_operation",
        operation = operation,
        record_id = record_id,
        success = success,
        duration_ms = duration_ms
    );
    let _enter = span.enter();

    if success {
        debug!(
            operation = operation,
            record_id = record_id,
            duration_ms = duration_ms,
            "Storage operation completed"
        );
    } else {
        warn!(
            operation = operation,
            record_id = record_id,
            duration_ms = duration_ms,
            "Storage operation failed"
        );
    }
}

/// Log a timing or count measured inside a command
pub fn log_performance_metric(metric_name: &str, value: f64, unit: &str, context: Option<&str>) {
    trace!(
        metric = metric_name,
        value = value,
        unit = unit,
        context = context,
        "Performance metric recorded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn init_test_logging() {
        INIT.call_once(|| {
            let config = LogConfig {
                level: "debug".to_string(),
                format: LogFormat::Compact,
                colored: false,
                with_location: false,
                with_spans: false,
            };
            let _ = init_logging(config);
        });
    }

    #[test]
    fn test_log_config_from_lookup() {
        let config = LogConfig::from_lookup(|name| match name {
            "PROMPTLIB_LOG_LEVEL" => Some("debug".to_string()),
            "PROMPTLIB_LOG_FORMAT" => Some("json".to_string()),
            "PROMPTLIB_LOG_COLOR" => Some("false".to_string()),
            "PROMPTLIB_LOG_LOCATION" => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.colored);
        assert!(config.with_location);
        assert!(!config.with_spans);
    }

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::from_lookup(|_| None);
        assert_eq!(config.level, "error");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_command_execution_logging() {
        init_test_logging();

        let result: Result<()> = Ok(());
        log_command_execution("ls", 3, &result);

        let result: Result<()> = Err(anyhow::anyhow!("test error"));
        log_command_execution("show", 5, &result);
    }

    #[test]
    fn test_storage_operation_logging() {
        init_test_logging();

        log_storage_operation("add", Some("code-review-1a2b3c4d"), true, Some(4));
        log_storage_operation("save", None, false, Some(10));
    }

    #[test]
    fn test_performance_metric_logging() {
        init_test_logging();

        log_performance_metric("filter_time", 0.4, "ms", Some("ls"));
    }
}
