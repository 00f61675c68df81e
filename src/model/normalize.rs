// File: ./src/model/normalize.rs
//! Turns extracted fields into a `Meeting` with a localized org timestamp.
use crate::error::AgendaError;
use crate::model::extract::{Extracted, StartSource};
use crate::model::meeting::Meeting;
use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Formatting of the canonical start key.
pub const CANONICAL_FORMAT: &str = "%Y%m%dT%H%M%S%6fZ";
const ORG_TIMED_FORMAT: &str = "<%Y-%m-%d %a %H:%M>";
const ORG_DAY_FORMAT: &str = "<%Y-%m-%d %a>";
const SPAN_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses `YYYYMMDDTHHMMSS[ffffff]Z` (UTC, up to six fractional digits).
pub fn parse_canonical(value: &str) -> Result<DateTime<Utc>, AgendaError> {
    if !value.is_ascii() {
        return Err(AgendaError::timestamp(value, "non-ASCII characters"));
    }
    let body = value
        .strip_suffix('Z')
        .ok_or_else(|| AgendaError::timestamp(value, "missing 'Z' (UTC) suffix"))?;
    if body.len() < 15 {
        return Err(AgendaError::timestamp(value, "too short"));
    }

    let (stamp, fraction) = body.split_at(15);
    if fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AgendaError::timestamp(value, "bad fractional seconds"));
    }

    let naive = NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S")
        .map_err(|e| AgendaError::timestamp(value, e.to_string()))?;

    let nanos = if fraction.is_empty() {
        0
    } else {
        // Right-pad to nanoseconds: "5" is half a second, not 5ns.
        format!("{:0<9}", fraction)
            .parse::<u32>()
            .map_err(|e| AgendaError::timestamp(value, e.to_string()))?
    };
    let naive = naive
        .with_nanosecond(nanos)
        .ok_or_else(|| AgendaError::timestamp(value, "fraction out of range"))?;

    Ok(naive.and_utc())
}

pub fn to_canonical(instant: &DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

/// Resolves a zone-local wall time (`DTSTART;TZID=...`) to UTC.
pub fn parse_zoned(value: &str, zone: &str) -> Result<DateTime<Utc>, AgendaError> {
    let tz: Tz = zone
        .parse()
        .map_err(|_| AgendaError::timestamp(value, format!("unknown time zone '{}'", zone)))?;
    let naive = NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y%m%dT%H%M%S")
        .map_err(|e| AgendaError::timestamp(value, e.to_string()))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Repeated hour at the end of DST: take the first occurrence.
        LocalResult::Ambiguous(first, _) => Ok(first.with_timezone(&Utc)),
        LocalResult::None => Err(AgendaError::timestamp(
            value,
            format!("does not exist in {}", zone),
        )),
    }
}

/// The UTC instant an extracted start refers to.
pub fn start_instant(extracted: &Extracted) -> Result<DateTime<Utc>, AgendaError> {
    match &extracted.source {
        StartSource::Zoned(zone) => parse_zoned(&extracted.start, zone),
        _ => parse_canonical(&extracted.start),
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AgendaError> {
    NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|e| AgendaError::timestamp(value, e.to_string()))
}

/// Builds the meeting for an extracted record.
///
/// Timed events are shown in `target_tz`. Day spans keep their calendar date
/// (they are floating dates, not instants) and get a "From/To" suffix whose
/// end is the last included day.
pub fn normalize(
    extracted: &Extracted,
    calendar_label: &str,
    target_tz: &Tz,
) -> Result<Meeting, AgendaError> {
    let instant = start_instant(extracted)?;

    if !extracted.is_day_span {
        return Ok(Meeting {
            start: to_canonical(&instant),
            display_start: instant
                .with_timezone(target_tz)
                .format(ORG_TIMED_FORMAT)
                .to_string(),
            summary: extracted.summary.clone(),
            calendar_label: calendar_label.to_string(),
        });
    }

    let first_day = instant.date_naive();
    let last_day = match &extracted.day_span_end {
        Some(end) => last_included_day(parse_date(end)?).max(first_day),
        // Without DTEND a whole-day event lasts one day.
        None => first_day,
    };

    Ok(Meeting {
        start: to_canonical(&instant),
        display_start: first_day.format(ORG_DAY_FORMAT).to_string(),
        summary: format!(
            "{}. From: {} To: {}",
            extracted.summary,
            first_day.format(SPAN_DATE_FORMAT),
            last_day.format(SPAN_DATE_FORMAT)
        ),
        calendar_label: calendar_label.to_string(),
    })
}

/// Day-span ends are exclusive at the source; the last included day is the one before.
pub fn last_included_day(exclusive_end: NaiveDate) -> NaiveDate {
    exclusive_end
        .checked_sub_days(Days::new(1))
        .unwrap_or(exclusive_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_canonical_plain_and_fractional() {
        let a = parse_canonical("20240105T090000Z").unwrap();
        let b = parse_canonical("20240105T090000000000Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 9);

        let c = parse_canonical("20240105T0930155Z").unwrap();
        assert_eq!(c.second(), 15);
        assert_eq!(c.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_parse_canonical_rejects_floating_and_garbage() {
        assert!(parse_canonical("20240105T090000").is_err());
        assert!(parse_canonical("2024-01-05T09:00:00Z").is_err());
        assert!(parse_canonical("20240105T0900001234567Z").is_err());
        assert!(parse_canonical("").is_err());
    }

    #[test]
    fn test_canonical_is_fixed_width() {
        let dt = parse_canonical("20240105T090000Z").unwrap();
        assert_eq!(to_canonical(&dt), "20240105T090000000000Z");
    }

    #[test]
    fn test_last_included_day_crosses_month() {
        let d = last_included_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!((d.month(), d.day()), (2, 29));
    }

    #[test]
    fn test_zoned_dst_gap_is_an_error() {
        // 02:30 does not exist in Berlin on the spring-forward day.
        assert!(parse_zoned("20240331T023000", "Europe/Berlin").is_err());
        let ok = parse_zoned("20240105T100000", "Europe/Berlin").unwrap();
        assert_eq!(to_canonical(&ok), "20240105T090000000000Z");
    }
}
