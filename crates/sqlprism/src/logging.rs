//! Logging configuration for SQLPrism
//!
//! Installs a global `tracing` subscriber. The compiler logs stage
//! boundaries at `debug`, each applied optimizer rule at `trace`, finished
//! compiles at `info` and rejected input at `warn`.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "sqlprism.log";

/// Log output destination
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a daily rotated file
    File(PathBuf),
    /// Output to both stdout and file
    Both(PathBuf),
}

/// Log format style
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Human-readable multi-line format (default)
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the sqlprism crates, or a full `EnvFilter` directive
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// Create config with info level and stdout output
    pub fn info() -> Self {
        Self::default()
    }

    /// Create config with debug level: one event per compile stage
    pub fn debug() -> Self {
        Self::default().with_level("debug")
    }

    /// Create config with trace level: also logs every applied rewrite rule
    pub fn trace() -> Self {
        Self::default().with_level("trace")
    }

    /// Create config with warn level: only rejected input
    pub fn warn() -> Self {
        Self::default().with_level("warn")
    }

    /// Set log output to a daily rotated file
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Set log output to both stdout and file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set log level filter
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Filter directive for this configuration. A bare level applies to the
    /// sqlprism crates only.
    pub fn directive(&self) -> String {
        if self.level.contains('=') || self.level.contains(',') {
            self.level.clone()
        } else {
            format!(
                "sqlprism={level},sqlprism_core={level}",
                level = self.level
            )
        }
    }

    /// Initialize global logging with this configuration
    ///
    /// `RUST_LOG` takes precedence over the configured level. Returns a guard
    /// for file output that must be kept alive; dropping it flushes and stops
    /// the background writer.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the level is not a valid filter or a
    /// global subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlprism::logging::LogConfig;
    ///
    /// // Keep the guard alive for the lifetime of your application
    /// let _guard = LogConfig::debug().init()?;
    /// # Ok::<(), sqlprism::Error>(())
    /// ```
    pub fn init(self) -> Result<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directive()))
            .map_err(|e| Error::InvalidInput(format!("Invalid log level: {}", e)))?;

        let already_set =
            |e: tracing_subscriber::util::TryInitError| Error::InvalidInput(e.to_string());

        match self.output {
            LogOutput::Stdout => {
                match self.format {
                    LogFormat::Pretty => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().pretty())
                        .try_init()
                        .map_err(already_set)?,
                    LogFormat::Compact => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().compact())
                        .try_init()
                        .map_err(already_set)?,
                }
                Ok(None)
            }
            LogOutput::File(path) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(rolling_file(&path));

                match self.format {
                    LogFormat::Pretty => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).pretty())
                        .try_init()
                        .map_err(already_set)?,
                    LogFormat::Compact => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).compact())
                        .try_init()
                        .map_err(already_set)?,
                }
                Ok(Some(guard))
            }
            LogOutput::Both(path) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(rolling_file(&path));

                // Compact on both sinks keeps the layer types uniform
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().compact())
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false).compact())
                    .try_init()
                    .map_err(already_set)?;

                Ok(Some(guard))
            }
        }
    }
}

fn rolling_file(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    tracing_appender::rolling::daily(directory, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(matches!(config.output, LogOutput::Stdout));
        assert!(matches!(config.format, LogFormat::Pretty));
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::trace()
            .with_file("/tmp/sqlprism-test.log")
            .with_format(LogFormat::Compact);
        assert_eq!(config.level, "trace");
        assert!(matches!(config.output, LogOutput::File(_)));
        assert!(matches!(config.format, LogFormat::Compact));

        let config = LogConfig::warn().with_both("logs/app.log");
        assert!(matches!(config.output, LogOutput::Both(ref p) if p.ends_with("app.log")));
    }

    #[test]
    fn test_directive_scopes_bare_levels() {
        assert_eq!(
            LogConfig::debug().directive(),
            "sqlprism=debug,sqlprism_core=debug"
        );
        assert_eq!(
            LogConfig::default().with_level("sqlprism_core=trace").directive(),
            "sqlprism_core=trace"
        );
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = LogConfig::default().with_level("sqlprism=verbose").init();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
