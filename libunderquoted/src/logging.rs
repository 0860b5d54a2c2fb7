//! Logging setup for the underquoted binary
//!
//! Log lines always go to stderr so stdout stays free for command output.
//! The format and level come from command-line flags, falling back to the
//! `UNDERQUOTED_LOG_FORMAT` and `UNDERQUOTED_LOG_LEVEL` environment variables.
//! `RUST_LOG`, when set, takes precedence over both.
//!
//! # Examples
//!
//! ```no_run
//! use libunderquoted::logging::{LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::new(LogFormat::Json, "info".to_string(), false);
//! config.init();
//! ```

use std::str::FromStr;

/// Environment variable selecting the log format
pub const LOG_FORMAT_ENV: &str = "UNDERQUOTED_LOG_FORMAT";

/// Environment variable selecting the minimum log level
pub const LOG_LEVEL_ENV: &str = "UNDERQUOTED_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for cron mail and pipes)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Configuration for logging initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// Create a new logging configuration
    ///
    /// * `format` - Log output format
    /// * `level` - Minimum log level (error, warn, info, debug, trace)
    /// * `verbose` - Forces debug level
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Resolve settings from flags, then the environment, then defaults
    ///
    /// `format` given on the command line wins over `UNDERQUOTED_LOG_FORMAT`;
    /// an unparseable environment value is ignored.
    pub fn resolve(format: Option<LogFormat>, verbose: bool) -> Self {
        Self::resolve_with(format, verbose, |key| std::env::var(key).ok())
    }

    /// Same as [`LoggingConfig::resolve`] with an explicit variable lookup
    pub fn resolve_with<F>(format: Option<LogFormat>, verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = format
            .or_else(|| lookup(LOG_FORMAT_ENV).and_then(|s| s.parse().ok()))
            .unwrap_or(LogFormat::Text);

        let level = lookup(LOG_LEVEL_ENV)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self::new(format, level, verbose)
    }

    /// The filter directive used when `RUST_LOG` is unset
    pub fn directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber
    ///
    /// Call once at program start; later calls are ignored.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directive()));

        // try_init: a second installation (tests, embedding) is not fatal
        let _ = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false)
                .with_level(true)
                .try_init(),
        };
    }
}
