use hapbench_types::LogFormat;

/// A line that could not be turned into a record
///
/// Recoverable: callers skip the line and keep going.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line does not match the {format} log grammar")]
    NoMatch { format: LogFormat, line: String },

    #[error("invalid accept date '{date}': {source}")]
    InvalidDate {
        date: String,
        line: String,
        source: chrono::ParseError,
    },
}

impl ParseError {
    /// The offending input line
    pub fn line(&self) -> &str {
        match self {
            Self::NoMatch { line, .. } | Self::InvalidDate { line, .. } => line,
        }
    }
}

/// Invalid extras template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("unsupported action '{{{{{action}}}}}', expected a field reference like {{{{.HttpUri}}}}")]
    InvalidAction { action: String },

    #[error("unknown field '{name}'")]
    UnknownField { name: String },
}
