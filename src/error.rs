use std::io;
use std::path::PathBuf;

use hapbench_logs::TemplateError;

/// Startup problems; nothing is processed when one of these occurs
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config file {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid {bound} time '{value}', expected RFC 3339: {source}")]
    TimeBound {
        bound: &'static str,
        value: String,
        source: chrono::ParseError,
    },

    #[error("error parsing extras template: {0}")]
    Template(#[from] TemplateError),
}

/// I/O failures while streaming; these abort the run
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("error reading input: {0}")]
    Read(#[source] io::Error),

    #[error("error writing output: {0}")]
    Write(#[source] io::Error),
}
