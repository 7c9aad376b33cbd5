//! Parsing and day-granularity comparison of the dates shown on the site.

use amzn_txn_api::types::OrderLink;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::TransactionsError;

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses a human-readable date such as `"January 25, 2024"`.
///
/// Also accepts RFC 3339, RFC 2822, ISO and US numeric forms, with or
/// without a time part and a leading weekday. Returns `None` for blank or
/// unrecognized input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.date_naive());
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    let candidate = strip_weekday(&collapsed);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(candidate, fmt).ok())
                .map(normalize_to_day)
        })
}

/// Drops a leading weekday name, full or abbreviated, with its comma.
fn strip_weekday(s: &str) -> &str {
    let Some((first, rest)) = s.split_once(' ') else {
        return s;
    };
    let word = first.trim_end_matches(',').to_ascii_lowercase();
    let is_weekday = WEEKDAYS
        .iter()
        .any(|day| *day == word || (word.len() == 3 && day.starts_with(word.as_str())));
    if is_weekday {
        rest
    } else {
        s
    }
}

/// Truncates a timestamp to its calendar day.
pub fn normalize_to_day(dt: NaiveDateTime) -> NaiveDate {
    dt.date()
}

/// True when `date` falls on an earlier day than `bound`.
pub fn is_before_date(date: NaiveDate, bound: NaiveDate) -> bool {
    date < bound
}

/// True when `date` falls on the same day as `bound` or earlier.
pub fn is_on_or_before_date(date: NaiveDate, bound: NaiveDate) -> bool {
    date <= bound
}

/// Checks the optional end-date setting.
///
/// Absent or blank means no bound. Anything else must parse, otherwise the
/// run is rejected before it starts.
pub fn validate_end_date(raw: Option<&str>) -> Result<Option<NaiveDate>, TransactionsError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    parse_date(raw).map(Some).ok_or_else(|| {
        TransactionsError::InvalidInput(format!(
            "Could not parse end_date: \"{}\". Use format like \"January 25, 2024\"",
            raw
        ))
    })
}

/// The earliest parseable transaction date among `links`.
pub fn oldest_transaction_date(links: &[OrderLink]) -> Option<NaiveDate> {
    links
        .iter()
        .filter_map(|link| parse_date(&link.transaction_date))
        .min()
}
