//! Structured logging setup, simplified from the reference codebase's
//! `core::log` module down to this crate's needs: no custom event
//! formatter (that exists upstream to render TUI span fields this crate
//! doesn't have) and no rolling file appender, just a plain `fmt` layer
//! pointed at one of a few destinations.

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, Clone, Default)]
pub enum WriterConfig {
    #[default]
    Stdout,
    Stderr,
    File(PathBuf),
}

/// Logging configuration for [`install_global`].
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
}

impl Default for TracingConfig {
    fn default() -> Self { Self { writer_config: WriterConfig::default(), level_filter: LevelFilter::WARN } }
}

/// Installs a process-wide `tracing` subscriber built from `config`.
///
/// Logging and user-facing terminal output are deliberately different
/// sinks: the editor core only ever writes diagnostic spans through
/// `tracing`, never to the raw-mode terminal the edited line is drawn on,
/// so turning logging on cannot corrupt the line being edited.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed, or
/// if the configured log file cannot be opened.
pub fn install_global(config: &TracingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::builder().with_default_directive(config.level_filter.into()).from_env_lossy();

    match &config.writer_config {
        WriterConfig::Stdout => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stdout).try_init()?;
        }
        WriterConfig::Stderr => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).try_init()?;
        }
        WriterConfig::File(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::sync::Mutex::new(file)).try_init()?;
        }
    }
    Ok(())
}
