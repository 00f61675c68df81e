// File: ./src/agenda/render.rs
//! Org-mode serialization of the grouped meetings.
use crate::agenda::aggregate::MeetingsByStart;
use crate::model::Meeting;
use std::fmt::Write;

/// Backslashes would be read as org escapes; they become spaces.
pub fn sanitize_summary(summary: &str) -> String {
    summary.replace('\\', " ")
}

fn render_meeting(out: &mut String, meeting: &Meeting) {
    let title = sanitize_summary(&meeting.summary);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "* {}", meeting.calendar_label);
    let _ = writeln!(out, "** CAL {}, {}", meeting.display_start, title);
    let _ = writeln!(out, "SCHEDULED: {}", meeting.display_start);
}

/// Renders every meeting as a three-line org entry, groups in start order,
/// meetings within a group in the order they were added.
pub fn render(groups: &MeetingsByStart) -> String {
    let mut out = String::new();
    for (_, group) in groups.groups() {
        for meeting in group {
            render_meeting(&mut out, meeting);
        }
    }
    out
}
