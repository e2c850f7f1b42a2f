//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! Every pass gets its own subscriber: a console layer on stderr plus an
//! optional append-only log file. The subscriber is returned as a
//! [`Dispatch`] and scoped to the pass with
//! [`tracing::dispatcher::with_default`], so running the convert pass and a
//! physio pass in one process never mixes their log files.
//!
//! # Log Levels
//!
//! - `error`: tool failures, fatal load errors
//! - `warn`: skipped folders and files, missing anat directories
//! - `info`: matches, tool invocations, pass counters
//! - `debug`/`trace`: reserved for troubleshooting

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use serde::Deserialize;
use tracing::Dispatch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Default log file of the convert pass, relative to the working directory.
pub const CONVERT_LOG_FILE: &str = "bids_conversion.log";
/// Default log file of the physio dry run, inside the archive root.
pub const PHYSIO_DRY_RUN_LOG_FILE: &str = "bidsphysio_dryrun.log";
/// Default log file of the physio real run, inside the archive root.
pub const PHYSIO_LOG_FILE: &str = "bidsphysio.log";

/// Log level choices shared by the CLI and the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for machine parsing.
    Json,
}

/// Configuration for one pass subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset or ignored.
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` override `level_filter`.
    pub use_env_filter: bool,
    /// Include timestamps on the console. The log file always has them.
    pub with_timestamps: bool,
    /// Include the target (module path).
    pub with_target: bool,
    /// Use ANSI colors on the console. The log file never has them.
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append-only log file next to the console output.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::INFO,
            use_env_filter: true,
            with_timestamps: false,
            with_target: false,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    /// Set output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log file path (console only when None).
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

/// Build the subscriber for one pass, writing console output to stderr.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn build_dispatch(config: &LogConfig) -> io::Result<Dispatch> {
    build_dispatch_with_writer(config, io::stderr)
}

/// Build the subscriber for one pass with a custom console writer (useful
/// for testing).
///
/// # Errors
///
/// Returns an error if the log file or its parent directory cannot be
/// created.
pub fn build_dispatch_with_writer<W>(config: &LogConfig, console: W) -> io::Result<Dispatch>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let mut layers = vec![format_layer(
        config.format,
        console,
        config.with_ansi,
        config.with_timestamps,
        config.with_target,
    )];
    if let Some(path) = &config.log_file {
        let file = open_log_file(path)?;
        layers.push(format_layer(
            config.format,
            SharedFileWriter::new(file),
            false,
            true,
            config.with_target,
        ));
    }

    let subscriber = tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(config));
    Ok(Dispatch::new(subscriber))
}

fn format_layer<W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
    timestamps: bool,
    target: bool,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_target(target);
    match format {
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
        LogFormat::Compact if timestamps => layer.compact().with_ansi(ansi).boxed(),
        LogFormat::Compact => layer.compact().with_ansi(ansi).without_time().boxed(),
        LogFormat::Pretty if timestamps => layer.with_ansi(ansi).boxed(),
        LogFormat::Pretty => layer.with_ansi(ansi).without_time().boxed(),
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl SharedFileWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

struct SharedFileGuard {
    file: Arc<Mutex<File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}

/// Build an `EnvFilter` from the configured level, optionally respecting
/// `RUST_LOG`.
fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let level = config.level_filter.to_string().to_lowercase();
    let directives = format!(
        "{level},bids_cli={level},bids_core={level},bids_ingest={level},bids_model={level}"
    );
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
    } else {
        EnvFilter::new(directives)
    }
}
