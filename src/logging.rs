//! Structured logging setup.
//!
//! JSON formatting for production, pretty output for development, optional
//! file output with daily rotation. Diagnostics go to stderr by default so
//! report output on stdout stays machine-readable.

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: "preflight".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => config.format,
            };
        }

        if let Ok(output) = env::var("LOG_OUTPUT") {
            config.output = match output.to_lowercase().as_str() {
                "stdout" => LogOutput::Stdout,
                "stderr" => LogOutput::Stderr,
                "file" => LogOutput::File,
                _ => config.output,
            };
        }

        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        config
    }
}

/// Initialize logging. The returned guard must be held for the lifetime of
/// the process so buffered logs are flushed on exit.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match config.output {
        LogOutput::Stdout => {
            let (non_blocking, guard) = tracing_appender::non_blocking(io::stdout());
            (non_blocking, Some(guard))
        }
        LogOutput::Stderr => {
            let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());
            (non_blocking, Some(guard))
        }
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).context("failed to create log directory")?;
            let file_appender =
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (non_blocking, Some(guard))
        }
    };

    let registry = tracing_subscriber::registry();
    match config.format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().with_writer(writer).with_target(true))
                .with(env_filter)
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(fmt::layer().with_writer(writer).with_target(true))
                .with(env_filter)
                .init();
        }
    }

    tracing::debug!(format = ?config.format, output = ?config.output, "logging initialized");
    Ok(guard)
}
