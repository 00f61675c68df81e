// File: ./src/agenda/filter.rs
use crate::model::Meeting;

/// Whether the meeting title contains any keyword, as a literal
/// case-sensitive substring.
pub fn is_relevant<S: AsRef<str>>(meeting: &Meeting, keywords: &[S]) -> bool {
    keywords
        .iter()
        .any(|k| meeting.summary.contains(k.as_ref()))
}
