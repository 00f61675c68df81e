// File: ./src/source.rs
//! Calendar sources: where raw records come from.
//!
//! A source returns the event records of one calendar for a time window. The
//! CalDAV implementation lives in `client`; local `.ics` exports are read by
//! `IcsFileSource`.
use crate::config::{CalendarAlias, Config};
use crate::error::AgendaError;
use crate::model::normalize::{parse_date, start_instant};
use crate::model::{RawRecord, extract};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use icalendar::{Calendar, CalendarComponent};
use std::future::Future;

/// Half-open interval `[start, end)` of instants to fetch events for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// `days` days from `start`. Fails if the end is not representable.
    pub fn new(start: DateTime<Utc>, days: u32) -> Result<Self, AgendaError> {
        let end = Duration::try_days(i64::from(days))
            .and_then(|d| start.checked_add_signed(d))
            .ok_or_else(|| AgendaError::Config(format!("lookahead of {} days is out of range", days)))?;
        Ok(Self { start, end })
    }

    pub fn from_now(days: u32) -> Result<Self, AgendaError> {
        Self::new(Utc::now(), days)
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }

    /// Whether `[start, end)` overlaps the window.
    pub fn overlaps(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
        *start < self.end && *end > self.start
    }
}

pub trait CalendarSource {
    /// Fetches the records of one calendar. Recurring events are expected to
    /// be expanded into their instances by the source.
    fn fetch(
        &self,
        calendar: &CalendarAlias,
        window: &FetchWindow,
    ) -> impl Future<Output = Result<Vec<RawRecord>, AgendaError>>;
}

/// Fetches every configured calendar, one after the other.
///
/// A calendar that fails is logged and contributes no records.
pub async fn collect_records<S: CalendarSource>(
    source: &S,
    config: &Config,
    window: &FetchWindow,
) -> Vec<RawRecord> {
    log::info!("Get events from {} to {}", window.start, window.end);

    let mut records = Vec::new();
    for calendar in &config.calendars {
        log::info!("process calendar <{}>", calendar.name);
        match source.fetch(calendar, window).await {
            Ok(fetched) => {
                log::debug!("<{}>: {} records", calendar.name, fetched.len());
                records.extend(fetched);
            }
            Err(e) => log::error!("{}", e),
        }
    }
    records
}

/// Splits an iCalendar document into one text blob per `VEVENT`.
///
/// Each blob is the event's own text, cut at its `BEGIN:VEVENT`/`END:VEVENT`
/// lines, so nothing is added to or normalized in the record. The calendar
/// parser only cross-checks the cut. If no event is found, the text is used
/// whole and the record parser reports what it cannot use.
pub fn split_events(data: &str) -> Vec<String> {
    let text = format!("{}\r\n", data.trim());
    let events = split_events_by_line(&text);

    match text.parse::<Calendar>() {
        Ok(calendar) => {
            let parsed = calendar
                .components
                .iter()
                .filter(|c| matches!(c, CalendarComponent::Event(_)))
                .count();
            if parsed != events.len() {
                log::warn!(
                    "Calendar parser sees {} events, line scan found {}",
                    parsed,
                    events.len()
                );
            }
        }
        Err(e) => log::debug!("Calendar parser rejected data: {}", e),
    }

    if events.is_empty() {
        log::warn!("No VEVENT found in calendar data, using it as one record");
        return vec![data.to_string()];
    }
    events
}

fn split_events_by_line(text: &str) -> Vec<String> {
    let mut events = Vec::new();
    let mut current: Option<String> = None;
    let mut depth = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(buf) = current.as_mut() {
            buf.push_str(line);
            buf.push_str("\r\n");
            if trimmed.eq_ignore_ascii_case("BEGIN:VEVENT") {
                depth += 1;
            } else if trimmed.eq_ignore_ascii_case("END:VEVENT") {
                depth -= 1;
                if depth == 0
                    && let Some(done) = current.take()
                {
                    events.push(done);
                }
            }
        } else if trimmed.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(format!("{}\r\n", line));
            depth = 1;
        }
    }
    events
}

/// Reads calendars from local `.ics` files (the `file` of each calendar).
///
/// No recurrence expansion happens here: a recurring event shows up once, at
/// its first start, if that start is inside the window.
#[derive(Debug, Clone, Default)]
pub struct IcsFileSource;

impl IcsFileSource {
    pub fn new() -> Self {
        Self
    }
}

impl CalendarSource for IcsFileSource {
    async fn fetch(
        &self,
        calendar: &CalendarAlias,
        window: &FetchWindow,
    ) -> Result<Vec<RawRecord>, AgendaError> {
        let path = calendar
            .file
            .as_ref()
            .ok_or_else(|| AgendaError::fetch(&calendar.name, "no ics file configured"))?;

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AgendaError::fetch(&calendar.name, format!("{}: {}", path.display(), e)))?;

        Ok(records_in_window(calendar, &contents, window))
    }
}

/// Splits a whole `.ics` document and keeps the events inside `window`.
pub fn records_in_window(
    calendar: &CalendarAlias,
    contents: &str,
    window: &FetchWindow,
) -> Vec<RawRecord> {
    split_events(contents)
        .into_iter()
        .filter(|event| event_in_window(event, window))
        .map(|event| RawRecord::new(&calendar.name, event))
        .collect()
}

/// Window check for sources that cannot filter server-side. Events whose
/// start cannot be read are kept so the pipeline reports them.
pub fn event_in_window(data: &str, window: &FetchWindow) -> bool {
    let Ok(extracted) = extract(data) else {
        return true;
    };
    let Ok(start) = start_instant(&extracted) else {
        return true;
    };

    if !extracted.is_day_span {
        return window.contains(&start);
    }

    let end = extracted
        .day_span_end
        .as_deref()
        .and_then(|d| parse_date(d).ok())
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(start + Duration::days(1));
    window.overlaps(&start, &end)
}
