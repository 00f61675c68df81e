// File: ./src/model/meeting.rs
use std::fmt;

/// A relevant calendar event, ready to be placed in the agenda.
///
/// `start` is the canonical UTC timestamp (`YYYYMMDDTHHMMSSffffffZ`). Its fixed
/// width makes string order equal to chronological order, so it doubles as the
/// grouping and sorting key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub start: String,
    pub display_start: String,
    pub summary: String,
    pub calendar_label: String,
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} ({})",
            self.summary, self.display_start, self.calendar_label
        )
    }
}
