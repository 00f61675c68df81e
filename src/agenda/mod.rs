// File: ./src/agenda/mod.rs
//! The record-to-agenda pipeline: extract, normalize, filter, group, render.
pub mod aggregate;
pub mod filter;
pub mod render;

pub use aggregate::{MeetingsByStart, aggregate};
pub use filter::is_relevant;
pub use render::render;

use crate::config::Config;
use crate::error::{AgendaError, SkipReason};
use crate::model::{Meeting, RawRecord, extract, normalize};
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Result of pushing one record through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted(Meeting),
    Skipped(SkipReason),
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub records: usize,
    pub accepted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl Report {
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        self.records += 1;
        match outcome {
            RecordOutcome::Accepted(_) => self.accepted += 1,
            RecordOutcome::Skipped(reason) => *self.skipped.entry(*reason).or_default() += 1,
        }
    }
}

/// Grouped meetings plus what happened to the records that didn't make it.
#[derive(Debug, Clone, Default)]
pub struct Agenda {
    pub meetings: MeetingsByStart,
    pub report: Report,
}

impl Agenda {
    pub fn push(&mut self, outcome: RecordOutcome) {
        self.report.record(&outcome);
        if let RecordOutcome::Accepted(meeting) = outcome {
            self.meetings.push(meeting);
        }
    }

    pub fn render(&self) -> String {
        render(&self.meetings)
    }
}

/// Runs a single record through extraction, normalization and filtering.
///
/// Only an unknown calendar is an error; everything else that goes wrong with
/// the record is a skip.
pub fn process_record<S: AsRef<str>>(
    record: &RawRecord,
    config: &Config,
    keywords: &[S],
    target_tz: &Tz,
) -> Result<RecordOutcome, AgendaError> {
    let label = config.alias_for(&record.calendar)?;

    let extracted = match extract(&record.data) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("Skipping record from <{}>: {}", record.calendar, e);
            log::debug!("{}\n---------", record.data);
            return Ok(RecordOutcome::Skipped(SkipReason::Malformed));
        }
    };

    let meeting = match normalize(&extracted, label, target_tz) {
        Ok(m) => m,
        Err(e) => {
            log::warn!(
                "Skipping '{}' from <{}>: {}",
                extracted.summary,
                record.calendar,
                e
            );
            return Ok(RecordOutcome::Skipped(SkipReason::BadTimestamp));
        }
    };

    if !is_relevant(&meeting, keywords) {
        return Ok(RecordOutcome::Skipped(SkipReason::NoKeyword));
    }

    log::debug!("{}\n---------", record.data);
    log::debug!(">> {} - {}", meeting, meeting.start);
    Ok(RecordOutcome::Accepted(meeting))
}

/// Builds the agenda for all records fetched in this run.
pub fn build_agenda(records: &[RawRecord], config: &Config) -> Result<Agenda, AgendaError> {
    let target_tz = config.target_zone()?;
    if config.keywords.is_empty() {
        log::warn!("No keywords configured, the agenda will be empty");
    }

    let mut agenda = Agenda::default();
    for record in records {
        let outcome = process_record(record, config, config.keywords.as_slice(), &target_tz)?;
        agenda.push(outcome);
    }

    log::info!(
        "Got {} meetings from {} events ({} without keyword, {} malformed, {} bad timestamps)",
        agenda.report.accepted,
        agenda.report.records,
        agenda.report.skipped(SkipReason::NoKeyword),
        agenda.report.skipped(SkipReason::Malformed),
        agenda.report.skipped(SkipReason::BadTimestamp),
    );
    Ok(agenda)
}

/// Convenience wrapper: records in, org text out.
pub fn render_agenda(records: &[RawRecord], config: &Config) -> Result<String, AgendaError> {
    Ok(build_agenda(records, config)?.render())
}
