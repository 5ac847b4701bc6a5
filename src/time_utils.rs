use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use std::num::IntErrorKind;

pub const DEFAULT_RANGE: &str = "7d";
pub const DEFAULT_RANGE_DAYS: i64 = 7;

const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp leniently.
///
/// A trailing `Z` is read as `+00:00`, values without an offset are taken as
/// UTC and a bare date means midnight UTC. Anything unparseable yields `None`.
pub fn parse_iso(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }

    let normalized = match raw.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    parse_with_offset(&normalized).or_else(|| parse_naive(&normalized).map(|naive| naive.and_utc()))
}

fn parse_with_offset(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Renders a UTC instant with the `Z` suffix, e.g. `2024-05-01T09:30:00Z`.
/// Sub-second parts are cut to microseconds and printed as six digits only
/// when non-zero.
pub fn format_utc(dt: DateTime<Utc>) -> String {
    let dt = dt.duration_trunc(Duration::microseconds(1)).unwrap_or(dt);
    let format = if dt.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(format, true)
}

/// Reads a `"<N>d"` range descriptor, falling back to 7 days. Counts too
/// large for `i64` saturate.
pub fn parse_range_days(raw: Option<&str>) -> i64 {
    let normalized = raw.unwrap_or(DEFAULT_RANGE).trim().to_lowercase();

    normalized
        .strip_suffix('d')
        .and_then(|count| match count.trim().parse::<i64>() {
            Ok(days) => Some(days),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Some(i64::MAX),
                IntErrorKind::NegOverflow => Some(i64::MIN),
                _ => None,
            },
        })
        .unwrap_or(DEFAULT_RANGE_DAYS)
}

/// Whole days between two instants, floored (so `-1s` counts as `-1`).
pub fn whole_days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    let delta = later - earlier;
    let days = delta.num_days();
    if delta < Duration::days(days) {
        days - 1
    } else {
        days
    }
}

pub fn fractional_days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    seconds_between(later, earlier) / SECONDS_PER_DAY
}

pub fn fractional_hours_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    seconds_between(later, earlier) / SECONDS_PER_HOUR
}

fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
