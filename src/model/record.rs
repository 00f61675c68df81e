// File: ./src/model/record.rs
//! Raw calendar records and a line-oriented property parser for them.
//!
//! A record is tokenized once into `Property` values. Lookups then work on
//! names and parameters instead of searching the text for tag literals.

/// An event blob as returned by a calendar source, tagged with the calendar
/// it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub calendar: String,
    pub data: String,
}

impl RawRecord {
    pub fn new(calendar: &str, data: impl Into<String>) -> Self {
        Self {
            calendar: calendar.to_string(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl Property {
    /// Parses one unfolded content line (`NAME;PARAM=x:value`).
    fn parse(line: &str) -> Option<Self> {
        let (head, value) = split_head(line)?;
        let mut parts = head.split(';');
        let name = parts.next()?.trim().to_ascii_uppercase();
        if name.is_empty() {
            return None;
        }

        let params = parts
            .filter_map(|p| {
                let (k, v) = p.split_once('=')?;
                Some((
                    k.trim().to_ascii_uppercase(),
                    v.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();

        Some(Self {
            name,
            params,
            value: value.trim().to_string(),
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    /// `VALUE=DATE`, i.e. a whole-day value without time of day.
    pub fn is_date_only(&self) -> bool {
        self.param("VALUE")
            .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
    }
}

/// Finds the colon separating the property head from its value, skipping
/// colons inside quoted parameter values (`TZID="a:b"`).
fn split_head(line: &str) -> Option<(&str, &str)> {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Joins folded lines (continuations start with a space or tab) and drops
/// carriage returns.
fn unfold(data: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in data.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = line.strip_prefix([' ', '\t'])
            && let Some(last) = lines.last_mut()
        {
            last.push_str(rest);
            continue;
        }
        if !line.trim().is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Properties of one event, in record order.
///
/// When the blob contains a `VEVENT`, only the direct properties of the first
/// one are kept; nested components (`VALARM`) and siblings (`VTIMEZONE`) are
/// ignored. A bare property list is taken as-is, minus nested components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    props: Vec<Property>,
}

impl RecordFields {
    pub fn parse(data: &str) -> Self {
        let lines = unfold(data);
        let has_event = lines
            .iter()
            .any(|l| l.trim().eq_ignore_ascii_case("BEGIN:VEVENT"));

        let mut props = Vec::new();
        let mut depth = 0usize;
        // Depth at which the properties we want live.
        let mut wanted_depth = if has_event { None } else { Some(0) };
        let mut done = false;

        for line in &lines {
            let Some(prop) = Property::parse(line) else {
                continue;
            };

            match prop.name.as_str() {
                "BEGIN" => {
                    depth += 1;
                    if has_event
                        && wanted_depth.is_none()
                        && !done
                        && prop.value.eq_ignore_ascii_case("VEVENT")
                    {
                        wanted_depth = Some(depth);
                    }
                }
                "END" => {
                    if has_event && wanted_depth == Some(depth) {
                        wanted_depth = None;
                        done = true;
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {
                    if !done && wanted_depth == Some(depth) {
                        props.push(prop);
                    }
                }
            }
        }

        Self { props }
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn all<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Property> + use<'a, 'n> {
        self.props
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn first(&self, name: &str) -> Option<&Property> {
        self.all(name).next()
    }

    /// First property called `name` that satisfies `pred`.
    pub fn first_where<F>(&self, name: &str, pred: F) -> Option<&Property>
    where
        F: Fn(&Property) -> bool,
    {
        self.all(name).find(|&p| pred(p))
    }

    pub fn count(&self, name: &str) -> usize {
        self.all(name).count()
    }
}

/// Decodes iCalendar TEXT escapes. Line breaks become spaces so a title
/// always stays on one line.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('n') | Some('N') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
