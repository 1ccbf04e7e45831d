//! Run configuration
//!
//! Options come from an optional TOML file and the command line; command
//! line values win. The merged options are validated once into a
//! [`RunConfig`] that stays read-only for the whole run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::warn;

use hapbench_logs::{ExtrasTemplate, LogFormat, OffsetMode, RecordFilter};

use crate::error::ConfigError;

/// Unvalidated run options, as written in a config file or on the command line
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Only keep requests with this HTTP method
    pub method: Option<String>,

    /// Skip records before this RFC 3339 time
    pub start: Option<String>,

    /// Stop at the first record after this RFC 3339 time
    pub end: Option<String>,

    /// Space requests one second apart
    pub normalized: Option<bool>,

    /// Extras column template
    pub extras: Option<String>,

    /// Log line format
    pub format: Option<LogFormat>,
}

impl RunOptions {
    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer `self` over `base`; values set in `self` take precedence
    pub fn over(self, base: RunOptions) -> RunOptions {
        RunOptions {
            method: self.method.or(base.method),
            start: self.start.or(base.start),
            end: self.end.or(base.end),
            normalized: self.normalized.or(base.normalized),
            extras: self.extras.or(base.extras),
            format: self.format.or(base.format),
        }
    }
}

/// Validated configuration for one run
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: Option<PathBuf>,
    pub format: LogFormat,
    pub filter: RecordFilter,
    pub offset_mode: OffsetMode,
    pub extras: Option<ExtrasTemplate>,
}

impl RunConfig {
    /// Validate options: parse time bounds and compile the extras template
    pub fn from_options(options: RunOptions, input: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut filter = RecordFilter::new();

        if let Some(method) = options.method.as_deref() {
            filter = filter.with_method(method);
        }

        let start = parse_bound("start", options.start.as_deref())?;
        let end = parse_bound("end", options.end.as_deref())?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                warn!(%start, %end, "start time is after end time; no records will be emitted");
            }
        }
        if let Some(start) = start {
            filter = filter.with_start(start);
        }
        if let Some(end) = end {
            filter = filter.with_end(end);
        }

        let extras = match options.extras.as_deref() {
            Some(source) if !source.is_empty() => Some(ExtrasTemplate::compile(source)?),
            _ => None,
        };

        let offset_mode = if options.normalized.unwrap_or(false) {
            OffsetMode::Normalized
        } else {
            OffsetMode::Real
        };

        Ok(Self {
            input,
            format: options.format.unwrap_or_default(),
            filter,
            offset_mode,
            extras,
        })
    }
}

/// Parse an optional RFC 3339 bound; empty strings mean "no bound"
fn parse_bound(
    bound: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<FixedOffset>>, ConfigError> {
    match value {
        None | Some("") => Ok(None),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(Some)
            .map_err(|source| ConfigError::TimeBound {
                bound,
                value: text.to_string(),
                source,
            }),
    }
}
