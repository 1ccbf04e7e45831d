//! HAProxy log processing for hapbench
//!
//! This crate provides line parsing, record filtering, offset bookkeeping,
//! and extras template rendering.

mod error;
mod filter;
mod grammar;
mod offset;
mod parser;
mod template;

pub use error::{ParseError, TemplateError};
pub use filter::{RecordFilter, SkipReason, Verdict};
pub use grammar::{DateLayout, Grammar};
pub use offset::{OffsetClock, OffsetMode};
pub use parser::LogParser;
pub use template::ExtrasTemplate;

// Re-export types used in our public API
pub use hapbench_types::{LogFormat, LogRecord, RECORD_FIELDS};
