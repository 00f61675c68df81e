// File: ./src/model/extract.rs
//! Pulls the start, day-span markers and title out of a raw record.
use crate::error::AgendaError;
use crate::model::record::{Property, RecordFields, unescape_text};

/// Suffix that turns a bare `YYYYMMDD` into the canonical timestamp grammar.
pub const DAY_SPAN_TIME_SUFFIX: &str = "T000000Z";

/// Where the start value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartSource {
    /// `DTSTART:` in UTC.
    Utc,
    /// `DTSTART;TZID=<zone>:` local wall time.
    Zoned(String),
    /// `DTSTART;VALUE=DATE:` whole-day event.
    DaySpan,
    /// `DTSTAMP:` used when the event has no start of its own.
    Stamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Timestamp text. Canonical grammar except for `StartSource::Zoned`,
    /// where it is the zone-local `YYYYMMDDTHHMMSS` value.
    pub start: String,
    pub source: StartSource,
    pub is_day_span: bool,
    /// Exclusive end date (`YYYYMMDD`) of a day span, as reported by the source.
    pub day_span_end: Option<String>,
    pub summary: String,
}

/// Extracts the fields needed to build a meeting from a record's text.
pub fn extract(data: &str) -> Result<Extracted, AgendaError> {
    let fields = RecordFields::parse(data);
    extract_fields(&fields)
}

pub fn extract_fields(fields: &RecordFields) -> Result<Extracted, AgendaError> {
    if fields.count("DTSTART") > 1 {
        log::debug!("Record has several DTSTART lines, using the first usable one");
    }

    let summary = fields
        .first("SUMMARY")
        .map(|p| unescape_text(&p.value).trim().to_string())
        .unwrap_or_default();

    let is_utc_start = |p: &Property| p.param("TZID").is_none() && !p.is_date_only();

    if let Some(p) = fields.first_where("DTSTART", is_utc_start)
        && !p.value.is_empty()
    {
        return Ok(Extracted {
            start: p.value.clone(),
            source: StartSource::Utc,
            is_day_span: false,
            day_span_end: None,
            summary,
        });
    }

    if let Some(p) = fields.first_where("DTSTART", |p| !p.is_date_only() && p.param("TZID").is_some())
        && !p.value.is_empty()
    {
        let zone = p.param("TZID").unwrap_or_default().to_string();
        return Ok(Extracted {
            start: p.value.clone(),
            source: StartSource::Zoned(zone),
            is_day_span: false,
            day_span_end: None,
            summary,
        });
    }

    if let Some(p) = fields.first_where("DTSTART", Property::is_date_only)
        && !p.value.is_empty()
    {
        let day_span_end = fields
            .first_where("DTEND", Property::is_date_only)
            .map(|e| e.value.clone())
            .filter(|v| !v.is_empty());
        return Ok(Extracted {
            start: format!("{}{}", p.value, DAY_SPAN_TIME_SUFFIX),
            source: StartSource::DaySpan,
            is_day_span: true,
            day_span_end,
            summary,
        });
    }

    if let Some(p) = fields.first_where("DTSTAMP", |p| !p.has_params())
        && !p.value.is_empty()
    {
        log::debug!("No DTSTART in record '{}', falling back to DTSTAMP", summary);
        return Ok(Extracted {
            start: p.value.clone(),
            source: StartSource::Stamp,
            is_day_span: false,
            day_span_end: None,
            summary,
        });
    }

    Err(AgendaError::MalformedRecord)
}
