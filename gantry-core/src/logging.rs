//! Logging setup for the engine and its host applications.
//!
//! Built on `tracing`; defaults to JSON on STDOUT. The engine itself only
//! emits through the `tracing` macros, so hosts that configure their own
//! subscriber can skip this module entirely.
//!
//! ```no_run
//! use gantry_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .init();
//! info!("engine starting");
//! ```

use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub use tracing::{debug, error, info, trace, warn};

/// Minimum severity to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Line format: structured JSON, plain text, or pretty for development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
    Pretty,
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File(String),
    RollingFile {
        directory: String,
        prefix: String,
        rotation: Rotation,
    },
}

/// Rotation strategy for rolling file output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Hourly,
    Daily,
    Never,
}

impl Rotation {
    fn to_tracing_rotation(&self) -> tracing_appender::rolling::Rotation {
        match self {
            Rotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
            Rotation::Daily => tracing_appender::rolling::Rotation::DAILY,
            Rotation::Never => tracing_appender::rolling::Rotation::NEVER,
        }
    }
}

/// Logging configuration, built up fluently and applied once via `init`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub targets: bool,
    pub thread_ids: bool,
    pub spans: bool,
    pub colors: bool,
    /// Custom filter directive string, overriding `level` when set.
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.spans = enable;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    /// Directive string such as "gantry=debug,tokio=info".
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Installs the global subscriber. The returned guard must stay alive
    /// for the life of the program; dropping it flushes buffered lines.
    pub fn init(self) -> Option<WorkerGuard> {
        let env_filter = match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives)
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
        };

        match &self.output {
            LogOutput::Stdout => {
                let (writer, guard) = tracing_appender::non_blocking(io::stdout());
                self.install(writer, env_filter);
                Some(guard)
            }
            LogOutput::Stderr => {
                let (writer, guard) = tracing_appender::non_blocking(io::stderr());
                self.install(writer, env_filter);
                Some(guard)
            }
            LogOutput::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path);
                match file {
                    Ok(file) => {
                        let (writer, guard) = tracing_appender::non_blocking(file);
                        self.install(writer, env_filter);
                        Some(guard)
                    }
                    // Unusable log file falls back to stderr rather than
                    // aborting startup.
                    Err(_) => {
                        let (writer, guard) = tracing_appender::non_blocking(io::stderr());
                        self.install(writer, env_filter);
                        Some(guard)
                    }
                }
            }
            LogOutput::RollingFile {
                directory,
                prefix,
                rotation,
            } => {
                let appender = tracing_appender::rolling::RollingFileAppender::new(
                    rotation.to_tracing_rotation(),
                    directory,
                    prefix,
                );
                let (writer, guard) = tracing_appender::non_blocking(appender);
                self.install(writer, env_filter);
                Some(guard)
            }
        }
    }

    fn install<W>(&self, writer: W, env_filter: EnvFilter)
    where
        W: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Send + Sync + 'static,
    {
        let fmt_span = if self.spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(self.spans)
                    .with_span_list(self.spans)
                    .with_target(self.targets)
                    .with_thread_ids(self.thread_ids)
                    .with_span_events(fmt_span);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .init();
            }
            LogFormat::Plain => {
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(self.targets)
                    .with_thread_ids(self.thread_ids)
                    .with_ansi(self.colors)
                    .with_span_events(fmt_span);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .init();
            }
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_target(self.targets)
                    .with_thread_ids(self.thread_ids)
                    .with_ansi(self.colors)
                    .with_span_events(fmt_span);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .init();
            }
        }
    }
}

impl Default for LogConfig {
    /// JSON to STDOUT at INFO.
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            targets: true,
            thread_ids: false,
            spans: false,
            colors: false,
            env_filter: None,
        }
    }
}
