// Error taxonomy shared by the agenda pipeline and the calendar sources.
use std::fmt;
use thiserror::Error;

/// Errors surfaced by the agenda pipeline.
///
/// Only `UnresolvedCalendarAlias` and `Config` abort a run. The other variants
/// are reported per record or per calendar and the run continues without them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgendaError {
    #[error("record has no usable start field (DTSTART, DTSTART;VALUE=DATE or DTSTAMP)")]
    MalformedRecord,

    #[error("cannot parse timestamp '{value}': {reason}")]
    TimestampParse { value: String, reason: String },

    #[error("calendar '{0}' has no configured label")]
    UnresolvedCalendarAlias(String),

    #[error("fetching calendar '{calendar}' failed: {reason}")]
    SourceFetchFailure { calendar: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AgendaError {
    pub fn timestamp(value: &str, reason: impl Into<String>) -> Self {
        AgendaError::TimestampParse {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn fetch(calendar: &str, reason: impl fmt::Display) -> Self {
        AgendaError::SourceFetchFailure {
            calendar: calendar.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error must stop the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgendaError::UnresolvedCalendarAlias(_) | AgendaError::Config(_)
        )
    }
}

/// Why a single record did not become a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    Malformed,
    BadTimestamp,
    NoKeyword,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed => write!(f, "malformed"),
            SkipReason::BadTimestamp => write!(f, "bad timestamp"),
            SkipReason::NoKeyword => write!(f, "no keyword"),
        }
    }
}
