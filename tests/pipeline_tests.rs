// Tests for the record-to-agenda pipeline.
use orgcal::agenda::{RecordOutcome, aggregate, build_agenda, process_record, render, render_agenda};
use orgcal::config::{CalendarAlias, Config};
use orgcal::error::{AgendaError, SkipReason};
use orgcal::model::{Meeting, RawRecord, extract, normalize};

const INSTITUTE: &str = "IAS-7 (Arne Graf)";
const DIVISION: &str = "IAS-7 PED simulation (Arne Graf)";

fn config(keywords: &[&str]) -> Config {
    Config {
        timezone: "Europe/Berlin".to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        calendars: vec![
            CalendarAlias::new(INSTITUTE, "Institute"),
            CalendarAlias::new(DIVISION, "Division"),
        ],
        ..Config::default()
    }
}

fn record(calendar: &str, start: &str, summary: &str) -> RawRecord {
    RawRecord::new(calendar, format!("DTSTART:{}\nSUMMARY:{}\n", start, summary))
}

#[test]
fn test_worked_example() {
    let records = vec![RawRecord::new(
        INSTITUTE,
        "DTSTART:20240105T090000000000Z\nSUMMARY:MC Sync\n",
    )];
    let text = render_agenda(&records, &config(&["MC"])).unwrap();
    assert_eq!(
        text,
        "* Institute\n\
         ** CAL <2024-01-05 Fri 10:00>, MC Sync\n\
         SCHEDULED: <2024-01-05 Fri 10:00>\n"
    );
}

#[test]
fn test_output_is_chronological() {
    let records = vec![
        record(INSTITUTE, "20240110T080000Z", "MC late"),
        record(DIVISION, "20240105T090000000000Z", "MC early"),
        RawRecord::new(
            INSTITUTE,
            "DTSTART;VALUE=DATE:20240107\nDTEND;VALUE=DATE:20240108\nSUMMARY:MC day\n",
        ),
        record(DIVISION, "20240105T083000Z", "MC earliest"),
    ];
    let agenda = build_agenda(&records, &config(&["MC"])).unwrap();

    let starts: Vec<&str> = agenda.meetings.meetings().map(|m| m.start.as_str()).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);

    let titles: Vec<&str> = agenda
        .meetings
        .meetings()
        .map(|m| m.summary.as_str())
        .collect();
    assert_eq!(
        titles,
        vec![
            "MC earliest",
            "MC early",
            "MC day. From: 2024-01-07 To: 2024-01-07",
            "MC late"
        ]
    );
}

#[test]
fn test_render_is_idempotent() {
    let records = vec![
        record(INSTITUTE, "20240110T080000Z", "MC one"),
        record(DIVISION, "20240105T090000Z", "MC two"),
    ];
    let agenda = build_agenda(&records, &config(&["MC"])).unwrap();
    assert_eq!(render(&agenda.meetings), render(&agenda.meetings));
    assert_eq!(agenda.render(), render_agenda(&records, &config(&["MC"])).unwrap());
}

#[test]
fn test_day_span_end_is_exclusive() {
    let records = vec![RawRecord::new(
        DIVISION,
        "DTSTART;VALUE=DATE:20240308\r\nDTEND;VALUE=DATE:20240310\r\nSUMMARY:PhD workshop\r\n",
    )];
    let text = render_agenda(&records, &config(&["PhD workshop"])).unwrap();
    assert_eq!(
        text,
        "* Division\n\
         ** CAL <2024-03-08 Fri>, PhD workshop. From: 2024-03-08 To: 2024-03-09\n\
         SCHEDULED: <2024-03-08 Fri>\n"
    );
}

#[test]
fn test_day_span_without_end_is_one_day() {
    let extracted = extract("DTSTART;VALUE=DATE:20240308\nSUMMARY:AL Runde\n").unwrap();
    assert!(extracted.is_day_span);
    assert_eq!(extracted.start, "20240308T000000Z");
    let meeting = normalize(&extracted, "Division", &chrono_tz::UTC).unwrap();
    assert_eq!(meeting.summary, "AL Runde. From: 2024-03-08 To: 2024-03-08");
    assert_eq!(meeting.start, "20240308T000000000000Z");
}

#[test]
fn test_keywords_are_case_sensitive() {
    let cfg = config(&["Division Meeting Modeling"]);
    let records = vec![
        record(INSTITUTE, "20240105T090000Z", "Division Meeting Modeling XYZ"),
        record(INSTITUTE, "20240106T090000Z", "division meeting"),
    ];
    let agenda = build_agenda(&records, &cfg).unwrap();
    assert_eq!(agenda.meetings.len(), 1);
    assert_eq!(
        agenda.meetings.meetings().next().unwrap().summary,
        "Division Meeting Modeling XYZ"
    );
    assert_eq!(agenda.report.skipped(SkipReason::NoKeyword), 1);
}

#[test]
fn test_several_matching_keywords_accept_once() {
    let records = vec![record(INSTITUTE, "20240105T090000Z", "MC Journal Club")];
    let agenda = build_agenda(&records, &config(&["MC", "Journal Club"])).unwrap();
    assert_eq!(agenda.meetings.len(), 1);
}

#[test]
fn test_missing_summary_keeps_meeting() {
    let extracted = extract("DTSTART:20240105T090000Z\n").unwrap();
    assert_eq!(extracted.summary, "");
    let meeting = normalize(&extracted, "Institute", &chrono_tz::UTC).unwrap();
    assert_eq!(meeting.summary, "");
    assert_eq!(meeting.display_start, "<2024-01-05 Fri 09:00>");
}

#[test]
fn test_same_start_on_two_calendars_is_kept_in_fetch_order() {
    let records = vec![
        record(DIVISION, "20240105T090000Z", "MC Sync"),
        record(INSTITUTE, "20240104T090000Z", "Other MC"),
        record(INSTITUTE, "20240105T090000Z", "MC Sync"),
    ];
    let agenda = build_agenda(&records, &config(&["MC"])).unwrap();
    assert_eq!(agenda.meetings.group_count(), 2);

    let text = agenda.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 9);
    assert_eq!(lines[3], "* Division");
    assert_eq!(lines[4], "** CAL <2024-01-05 Fri 10:00>, MC Sync");
    assert_eq!(lines[6], "* Institute");
    assert_eq!(lines[7], "** CAL <2024-01-05 Fri 10:00>, MC Sync");
}

#[test]
fn test_unknown_calendar_is_fatal() {
    let records = vec![
        record(INSTITUTE, "20240105T090000Z", "MC Sync"),
        record("Somebody else", "20240105T090000Z", "MC Sync"),
    ];
    let err = build_agenda(&records, &config(&["MC"])).unwrap_err();
    assert_eq!(
        err,
        AgendaError::UnresolvedCalendarAlias("Somebody else".to_string())
    );
    assert!(err.is_fatal());
}

#[test]
fn test_bad_records_are_skipped_not_fatal() {
    let records = vec![
        RawRecord::new(INSTITUTE, "SUMMARY:MC no start\n"),
        RawRecord::new(INSTITUTE, "DTSTART:20240105T090000\nSUMMARY:MC floating\n"),
        RawRecord::new(INSTITUTE, "DTSTART;VALUE=DATE:2024030\nSUMMARY:MC short\n"),
        record(INSTITUTE, "20240105T090000Z", "MC good"),
    ];
    let agenda = build_agenda(&records, &config(&["MC"])).unwrap();
    assert_eq!(agenda.report.records, 4);
    assert_eq!(agenda.report.accepted, 1);
    assert_eq!(agenda.report.skipped(SkipReason::Malformed), 1);
    assert_eq!(agenda.report.skipped(SkipReason::BadTimestamp), 2);
}

#[test]
fn test_dtstamp_fallback() {
    let cfg = config(&["MC"]);
    let tz = cfg.target_zone().unwrap();
    let rec = RawRecord::new(INSTITUTE, "DTSTAMP:20240105T090000Z\nSUMMARY:MC stamped\n");
    match process_record(&rec, &cfg, cfg.keywords.as_slice(), &tz).unwrap() {
        RecordOutcome::Accepted(m) => assert_eq!(m.display_start, "<2024-01-05 Fri 10:00>"),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_full_calendar_blob_uses_event_fields() {
    let data = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:abc\r\n\
DTSTAMP:20231201T080000Z\r\n\
DTSTART;TZID=Europe/Berlin:20240105T100000\r\n\
SUMMARY:JuPedSim-Team\r\n\
\x20\x20weekly\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
SUMMARY:Reminder\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let records = vec![RawRecord::new(DIVISION, data)];
    let agenda = build_agenda(&records, &config(&["JuPedSim-Team"])).unwrap();
    let meeting = agenda.meetings.meetings().next().unwrap();
    assert_eq!(meeting.summary, "JuPedSim-Team weekly");
    assert_eq!(meeting.start, "20240105T090000000000Z");
    assert_eq!(meeting.display_start, "<2024-01-05 Fri 10:00>");
}

#[test]
fn test_backslashes_become_spaces() {
    let records = vec![RawRecord::new(
        INSTITUTE,
        "DTSTART:20240105T090000Z\nSUMMARY:MC C:\\\\temp\\\\notes\n",
    )];
    let text = render_agenda(&records, &config(&["MC"])).unwrap();
    assert!(text.contains("** CAL <2024-01-05 Fri 10:00>, MC C: temp notes\n"));

    let meeting = Meeting {
        start: "20240105T090000000000Z".to_string(),
        display_start: "<2024-01-05 Fri 10:00>".to_string(),
        summary: "a\\b".to_string(),
        calendar_label: "Institute".to_string(),
    };
    assert_eq!(
        render(&aggregate(vec![meeting])),
        "* Institute\n** CAL <2024-01-05 Fri 10:00>, a b\nSCHEDULED: <2024-01-05 Fri 10:00>\n"
    );
}

#[test]
fn test_timed_start_is_not_shifted_by_a_day() {
    // The exclusive-end correction only applies to day spans.
    let records = vec![record(INSTITUTE, "20240310T000000Z", "MC midnight")];
    let text = render_agenda(&records, &config(&["MC"])).unwrap();
    assert!(text.contains("<2024-03-10 Sun 01:00>"));
}
