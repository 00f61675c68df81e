// File: ./src/agenda/aggregate.rs
use crate::model::Meeting;
use std::collections::BTreeMap;

/// Meetings grouped by their canonical start key.
///
/// Groups iterate in ascending key order, which is chronological because the
/// key is fixed-width UTC. Inside a group, meetings stay in insertion order and
/// duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingsByStart {
    groups: BTreeMap<String, Vec<Meeting>>,
}

impl MeetingsByStart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, meeting: Meeting) {
        self.groups
            .entry(meeting.start.clone())
            .or_default()
            .push(meeting);
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Meeting])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All meetings in output order.
    pub fn meetings(&self) -> impl Iterator<Item = &Meeting> {
        self.groups.values().flatten()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Extend<Meeting> for MeetingsByStart {
    fn extend<I: IntoIterator<Item = Meeting>>(&mut self, iter: I) {
        for m in iter {
            self.push(m);
        }
    }
}

/// Groups meetings by start key and orders the groups chronologically.
pub fn aggregate<I>(meetings: I) -> MeetingsByStart
where
    I: IntoIterator<Item = Meeting>,
{
    let mut grouped = MeetingsByStart::new();
    grouped.extend(meetings);
    grouped
}
