//! Lenient field parsers shared by the record normalizer.
//!
//! Every parser here is total: malformed input maps to `None`, never to a
//! default value. A record with an unparseable location must not land on
//! (0, 0), and a record with an unparseable date must not land on today.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::record::Coordinates;

/// Date-only layouts accepted for `observed_on`, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Date-time layouts without an offset, reduced to their calendar date.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a `"lat,lng"` string into finite coordinates.
///
/// Exactly two comma-separated components are required. If either half fails
/// to parse the whole pair is rejected (both-or-neither).
pub(crate) fn parse_coordinates(location: &str) -> Option<Coordinates> {
    let (lat, lng) = location.trim().split_once(',')?;
    if lng.contains(',') {
        tracing::debug!("Rejecting location with extra components: '{}'", location);
        return None;
    }

    let lat = parse_finite(lat)?;
    let lng = parse_finite(lng)?;
    Some(Coordinates { lat, lng })
}

fn parse_finite(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an ISO-like observation date into a calendar date.
///
/// Full RFC 3339 timestamps keep the calendar date of their own offset, which
/// is the local date the observer recorded.
pub(crate) fn parse_observed_on(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    tracing::debug!("Unparseable observation date '{}'", raw);
    None
}

/// First candidate that is present and not blank, trimmed.
pub(crate) fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Owned variant of `first_non_empty`, for optional display fields.
pub(crate) fn non_empty_owned(value: Option<&str>) -> Option<String> {
    first_non_empty([value]).map(str::to_string)
}

/// Unicode case-insensitive equality, ignoring surrounding whitespace.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .eq(b.trim().chars().flat_map(char::to_lowercase))
}
