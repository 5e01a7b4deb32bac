//! Date-literal detection for the `after`/`before` family of rules.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Decides whether a rule argument is an absolute date rather than a field name.
pub trait DateRecognizer: Send + Sync {
    fn is_date(&self, text: &str) -> bool;
}

/// Absolute dates and times in the common formats, plus the relative
/// expressions date parsers conventionally accept (`tomorrow`, `+1 day`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDates;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    // month names; `%B` also accepts the abbreviated form when parsing
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%B %d %Y %H:%M",
    "%B %d, %Y %H:%M",
];

/// Formats carrying a UTC offset, parsed with [`DateTime::parse_from_str`].
const OFFSET_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%:z",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

const WEEKDAY: &str = "monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sat|sunday|sun";
const MONTH: &str = "january|jan|february|feb|march|mar|april|apr|may|june|jun|july|jul|august|aug\
                     |september|sept|sep|october|oct|november|nov|december|dec";
const UNIT: &str = "sec|second|min|minute|hour|day|week|fortnight|month|year";
const DAY: &str = "now|today|tomorrow|yesterday|midnight|noon";
const ORDER: &str = "next|last|this|previous";

/// `@1704067200`, seconds since the epoch.
static UNIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@-?\d+(?:\.\d+)?$").expect("unix pattern is valid"));

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    let amount = format!(r"[+-]?\d+\s*(?:{UNIT})s?");
    let clock = r"\d{1,2}:\d{2}(?::\d{2})?";
    let forms = [
        // today, tomorrow noon, yesterday 10:00
        format!(r"(?:{DAY})(?:\s+(?:midnight|noon|{clock}))?"),
        // +1 day, 2 weeks 3 days ago
        format!(r"{amount}(?:\s+{amount})*(?:\s+ago)?"),
        // next monday, last month, this march
        format!(r"(?:{ORDER})\s+(?:(?:{UNIT})|{WEEKDAY}|{MONTH})"),
        // monday, march, monday next week
        format!(r"(?:{WEEKDAY}|{MONTH})(?:\s+(?:{ORDER})\s+(?:week|month|year))?"),
        // first day of next month, last day of february 2025
        format!(r"(?:first|last)\s+day\s+of\s+(?:(?:{ORDER})\s+(?:month|year)|(?:{MONTH})(?:\s+\d{{4}})?)"),
        // first monday of next month
        format!(
            r"(?:first|second|third|fourth|last)\s+(?:{WEEKDAY})\s+of\s+(?:(?:{ORDER})\s+month|(?:{MONTH})(?:\s+\d{{4}})?)"
        ),
    ];
    Regex::new(&format!(r"(?i)^(?:{})$", forms.join("|"))).expect("relative date pattern is valid")
});

impl DateRecognizer for ChronoDates {
    fn is_date(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        DateTime::parse_from_rfc3339(text).is_ok()
            || DateTime::parse_from_rfc2822(text).is_ok()
            || OFFSET_DATE_TIME_FORMATS.iter().any(|f| DateTime::parse_from_str(text, f).is_ok())
            || DATE_FORMATS.iter().any(|f| NaiveDate::parse_from_str(text, f).is_ok())
            || DATE_TIME_FORMATS.iter().any(|f| NaiveDateTime::parse_from_str(text, f).is_ok())
            || TIME_FORMATS.iter().any(|f| NaiveTime::parse_from_str(text, f).is_ok())
            || UNIX.is_match(text)
            || RELATIVE.is_match(text)
    }
}

impl<F> DateRecognizer for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_date(&self, text: &str) -> bool {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_dates() {
        for text in [
            "2024-01-01",
            "2024/01/31",
            "31.12.2024",
            "2024-01-01 10:30",
            "2024-01-01T10:30:00",
            "2024-01-01T10:30:00Z",
            "2024-01-01T10:30:00+02:00",
            "Tue, 1 Jul 2003 10:52:37 +0200",
            "23:59",
            "2024-01-01 12:00:00 +02:00",
            "2024-01-01 12:00:00 +0200",
            "January 1 2024",
            "Jan 15, 2024",
            "1 March 2024",
            "@1704067200",
        ] {
            assert!(ChronoDates.is_date(text), "{text}");
        }
    }

    #[test]
    fn relative_dates() {
        for text in [
            "today",
            "Tomorrow",
            "now",
            "+1 day",
            "2 weeks ago",
            "1 week 2 days",
            "next monday",
            "last month",
            "monday",
            "Fri",
            "january",
            "tomorrow noon",
            "today 10:30",
            "first day of next month",
            "last day of february 2025",
            "first monday of next month",
        ] {
            assert!(ChronoDates.is_date(text), "{text}");
        }
    }

    #[test]
    fn field_names_are_not_dates() {
        for text in ["start", "end", "contract.start", "items.*.date", "starts_at", "2024-13-45", "", "mondays", "@now", "day", "first day"] {
            assert!(!ChronoDates.is_date(text), "{text}");
        }
    }

    #[test]
    fn closures_recognize_dates() {
        let never = |_: &str| false;
        assert!(!never.is_date("2024-01-01"));
    }
}
