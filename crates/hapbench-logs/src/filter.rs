use chrono::{DateTime, FixedOffset};

use hapbench_types::LogRecord;

/// Why a record was left out of the output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    BeforeStart,
    IncompleteUri,
    MethodMismatch,
}

/// Outcome of checking a record against the run filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Skip(SkipReason),
    /// The record is past the end bound; nothing after it is wanted
    Stop,
}

/// Record filter for a run: method plus a time window
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    /// Lowercased method to keep (None = all)
    method: Option<String>,

    /// Records strictly before this are skipped
    start: Option<DateTime<FixedOffset>>,

    /// Records strictly after this end the run
    end: Option<DateTime<FixedOffset>>,
}

impl RecordFilter {
    /// A filter that accepts every complete record
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep records with this HTTP method (case-insensitive)
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = if method.is_empty() {
            None
        } else {
            Some(method.to_lowercase())
        };
        self
    }

    /// Skip records before this time
    pub fn with_start(mut self, start: DateTime<FixedOffset>) -> Self {
        self.start = Some(start);
        self
    }

    /// Stop at the first record after this time
    pub fn with_end(mut self, end: DateTime<FixedOffset>) -> Self {
        self.end = Some(end);
        self
    }

    /// Check a record against this filter
    pub fn check(&self, record: &LogRecord) -> Verdict {
        if let Some(start) = &self.start
            && record.time < *start
        {
            return Verdict::Skip(SkipReason::BeforeStart);
        }

        if let Some(end) = &self.end
            && record.time > *end
        {
            return Verdict::Stop;
        }

        if !record.uri_complete {
            return Verdict::Skip(SkipReason::IncompleteUri);
        }

        if let Some(method) = &self.method
            && !record.http_method.eq_ignore_ascii_case(method)
        {
            return Verdict::Skip(SkipReason::MethodMismatch);
        }

        Verdict::Accept
    }

    /// The method filter, lowercased
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Check if filter is empty (accepts every complete record)
    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.start.is_none() && self.end.is_none()
    }
}
