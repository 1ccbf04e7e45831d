//! Extras template
//!
//! Renders record fields into the free-form "extras" column. The syntax is
//! literal text with `{{.FieldName}}` placeholders, where `FieldName` is any
//! name from [`RECORD_FIELDS`]. Templates are validated when compiled, so
//! rendering cannot fail.

use hapbench_types::{LogRecord, RECORD_FIELDS};

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(&'static str),
}

/// A compiled extras template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtrasTemplate {
    segments: Vec<Segment>,
}

impl ExtrasTemplate {
    /// Compile a template string
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find(OPEN) {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }

            let inner_start = open + OPEN.len();
            let close = rest[inner_start..]
                .find(CLOSE)
                .ok_or(TemplateError::Unterminated {
                    offset: offset + open,
                })?;

            let action = rest[inner_start..inner_start + close].trim();
            segments.push(Segment::Field(resolve_field(action)?));

            let consumed = inner_start + close + CLOSE.len();
            rest = &rest[consumed..];
            offset += consumed;
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Render the template against a record
    pub fn render(&self, record: &LogRecord) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    if let Some(value) = record.field(name) {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}

/// Map a `.Name` action to its static field name
fn resolve_field(action: &str) -> Result<&'static str, TemplateError> {
    let name = action
        .strip_prefix('.')
        .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .ok_or_else(|| TemplateError::InvalidAction {
            action: action.to_string(),
        })?;

    RECORD_FIELDS
        .iter()
        .copied()
        .find(|field| *field == name)
        .ok_or_else(|| TemplateError::UnknownField {
            name: name.to_string(),
        })
}
