//! Tolerant date parsing and date-interval splitting

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").expect("valid year-month pattern"));

static YEAR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid year pattern"));

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%Y%m%dT%H%M%S",
];

// Month-first before day-first, so `05/03/2020` reads as May 3
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a date or datetime in any of the common encodings found in
/// Darwin Core exports.
///
/// Offsets are converted to UTC and dropped. Dates become midnight.
/// Year-only and year-month values become the first instant of the period.
/// Returns `None` for anything unrecognized.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    let zulu = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .map(|v| format!("{v}+00:00"));
    let with_offset = zulu.as_deref().unwrap_or(value);
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(with_offset, fmt) {
            return Some(dt.naive_utc());
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    if let Some(caps) = YEAR_MONTH.captures(value) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0);
    }

    if let Some(caps) = YEAR_ONLY.captures(value) {
        let year = caps[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }

    None
}

/// Separators between the components of a date or datetime
fn is_component_separator(c: char) -> bool {
    matches!(c, '-' | 'T' | ':' | ' ' | '.')
}

/// Complete an abbreviated interval end with the start's leading components
///
/// Whole components are borrowed, so `2020-05-01` + `03` gives `2020-05-03`
/// and `2020-05-01T10:00` + `12:00` gives `2020-05-01T12:00`. `None` when the
/// end has at least as many components as the start.
pub fn complete_interval_end(start: &str, end: &str) -> Option<String> {
    let separators: Vec<usize> = start
        .char_indices()
        .filter(|(_, c)| is_component_separator(*c))
        .map(|(i, _)| i)
        .collect();
    let start_parts = separators.len() + 1;
    let end_parts = end.split(is_component_separator).count();
    if end_parts >= start_parts {
        return None;
    }
    let cut = separators[start_parts - end_parts - 1];
    Some(format!("{}{end}", &start[..=cut]))
}

/// An interval end parses on its own first; only then is it completed from the start
fn parse_interval_end(start: &str, end: &str) -> Option<NaiveDateTime> {
    parse_datetime(end).or_else(|| {
        complete_interval_end(start, end).and_then(|completed| parse_datetime(&completed))
    })
}

/// Parsed interval bounds; a point in time is a zero-width interval
///
/// A value that parses whole (including slash dates like `2020/05/01`) is a
/// single instant. Otherwise the first `/` whose two sides both parse splits
/// the interval; an empty end is a single instant and an empty start leaves
/// the start open. Anything else gives `(None, None)`, as do null cells.
pub fn parse_interval(value: Option<&str>) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return (None, None);
    };
    if let Some(instant) = parse_datetime(value) {
        return (Some(instant), Some(instant));
    }

    for (idx, _) in value.match_indices('/') {
        let start = value[..idx].trim();
        let end = value[idx + 1..].trim();
        let bounds = match (start.is_empty(), end.is_empty()) {
            (true, true) => None,
            (false, true) => parse_datetime(start).map(|s| (Some(s), Some(s))),
            (true, false) => parse_datetime(end).map(|e| (None, Some(e))),
            (false, false) => parse_datetime(start)
                .zip(parse_interval_end(start, end))
                .map(|(s, e)| (Some(s), Some(e))),
        };
        if let Some(bounds) = bounds {
            return bounds;
        }
    }
    (None, None)
}
