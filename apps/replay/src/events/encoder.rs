//! Event token encoding.
//!
//! A token is `<epochSeconds>;<type>`. Timestamps arrive in the long form the
//! upstream event source writes, e.g. `Tue Mar 07 2017 14:22:01 GMT-0500 (EST)`.
//! When that text cannot be parsed the encoding time is used instead; the
//! substitution is recorded on the token and never surfaces as an error.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use crate::events::models::RawEvent;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Layout of the timestamp once the weekday and zone abbreviations are removed.
/// Field widths are checked before chrono sees the text; chrono itself accepts
/// short years and single-digit fields.
const STAMP_FORMAT: &str = "%b %d %Y %H:%M:%S %z";

/// One encoded event. `Display` yields the wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedToken {
    pub epoch_seconds: i64,
    pub event_type: String,
    /// True when `epoch_seconds` is the encoding time rather than the event's own.
    pub used_fallback: bool,
}

impl fmt::Display for EncodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.epoch_seconds, self.event_type)
    }
}

/// Encodes an event. `now` is used when the timestamp cannot be parsed; callers
/// pass the current wall-clock time.
pub fn encode_event(event: &RawEvent, now: DateTime<Utc>) -> EncodedToken {
    let (epoch_seconds, used_fallback) = match parse_event_time(&event.timestamp) {
        Some(when) => (when.timestamp(), false),
        None => {
            debug!(
                "Unparseable timestamp {:?} for {} event, using current time",
                event.timestamp, event.event_type
            );
            (now.timestamp(), true)
        }
    };

    EncodedToken {
        epoch_seconds,
        event_type: event.event_type.clone(),
        used_fallback,
    }
}

/// Parses `<Wkd> <Mon> <DD> <YYYY> <HH:MM:SS> <ABBR><±HHMM> (<ABBR>)`.
///
/// The numeric offset determines the instant. Zone abbreviations are only
/// checked for shape, and the weekday must be a real weekday name but is not
/// checked against the date.
pub fn parse_event_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let (head, zone_name) = text.strip_suffix(')')?.rsplit_once(" (")?;
    if !is_zone_abbreviation(zone_name) {
        return None;
    }

    // Fields are separated by exactly one space.
    let fields: Vec<&str> = head.split(' ').collect();
    let [weekday, month, day, year, time, zone] = fields.as_slice() else {
        return None;
    };

    if !WEEKDAYS.contains(weekday)
        || !MONTHS.contains(month)
        || !is_digits(day, 2)
        || !is_digits(year, 4)
        || !is_clock(time)
    {
        return None;
    }

    let sign_at = zone.rfind(|c| c == '+' || c == '-')?;
    let (abbreviation, offset) = zone.split_at(sign_at);
    if !is_zone_abbreviation(abbreviation) || !is_digits(&offset[1..], 4) {
        return None;
    }

    DateTime::parse_from_str(
        &format!("{month} {day} {year} {time} {offset}"),
        STAMP_FORMAT,
    )
    .ok()
}

fn is_digits(s: &str, width: usize) -> bool {
    s.len() == width && s.bytes().all(|b| b.is_ascii_digit())
}

/// `HH:MM:SS`, two digits each.
fn is_clock(s: &str) -> bool {
    let mut parts = s.split(':');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(h), Some(m), Some(sec), None)
            if is_digits(h, 2) && is_digits(m, 2) && is_digits(sec, 2)
    )
}

fn is_zone_abbreviation(s: &str) -> bool {
    (3..=5).contains(&s.len())
        && s.starts_with(|c: char| c.is_ascii_uppercase())
        && s.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_parses_negative_offset() {
        let event = RawEvent::new("pageview", "Tue Mar 07 2017 14:22:01 GMT-0500 (EST)");
        let token = encode_event(&event, fixed_now());
        assert_eq!(token.to_string(), "1488914521;pageview");
        assert!(!token.used_fallback);
    }

    #[test]
    fn test_parses_positive_offset() {
        let event = RawEvent::new("click", "Tue Mar 07 2017 14:22:01 GMT+0100 (CET)");
        assert_eq!(
            encode_event(&event, fixed_now()).to_string(),
            "1488892921;click"
        );
    }

    #[test]
    fn test_parses_utc_and_other_abbreviations() {
        let utc = RawEvent::new("read", "Sat Dec 31 2016 23:59:59 UTC+0000 (UTC)");
        assert_eq!(encode_event(&utc, fixed_now()).epoch_seconds, 1483228799);

        let msk = RawEvent::new("skim", "Fri Jun 15 2018 09:30:00 GMT+0300 (MSK)");
        assert_eq!(encode_event(&msk, fixed_now()).epoch_seconds, 1529044200);
    }

    #[test]
    fn test_weekday_not_checked_against_date() {
        // 2017-03-07 was a Tuesday.
        let event = RawEvent::new("pageview", "Mon Mar 07 2017 14:22:01 GMT-0500 (EST)");
        let token = encode_event(&event, fixed_now());
        assert_eq!(token.epoch_seconds, 1488914521);
        assert!(!token.used_fallback);
    }

    #[test]
    fn test_compound_type_copied_verbatim() {
        let event = RawEvent::new(
            "open|glance|visit",
            "Tue Mar 07 2017 14:22:01 GMT-0500 (EST)",
        );
        assert_eq!(
            encode_event(&event, fixed_now()).to_string(),
            "1488914521;open|glance|visit"
        );
    }

    #[test]
    fn test_malformed_timestamps_use_fallback() {
        let now = fixed_now();
        for text in [
            "",
            "not a date",
            "2017-03-07T14:22:01Z",
            "Tue Mar 07 2017 14:22:01 GMT-0500",
            "Tue Mar 07 2017 14:22:01 -0500 (EST)",
            "Xyz Mar 07 2017 14:22:01 GMT-0500 (EST)",
            "Tue Foo 07 2017 14:22:01 GMT-0500 (EST)",
            "Tue Mar 32 2017 14:22:01 GMT-0500 (EST)",
            "Tue Mar 07 2017 25:22:01 GMT-0500 (EST)",
            "Tue Mar 07 2017 14:22:01 GMT-0500 (est)",
            "Tue Mar 07 17 14:22:01 GMT-0500 (EST)",
            "Tue Mar 07 20170 14:22:01 GMT-0500 (EST)",
            "Tue Mar 7 2017 14:22:01 GMT-0500 (EST)",
            "Tue Mar 07 2017 14:2:01 GMT-0500 (EST)",
            "Tue Mar 07 2017 14:22:1 GMT-0500 (EST)",
            "Tue Mar 07 2017 4:22:01 GMT-0500 (EST)",
            "Tue Mar 072017 14:22:01 GMT-0500 (EST)",
            "Tue  Mar 07 2017 14:22:01 GMT-0500 (EST)",
            "Tue Mar 07  2017 14:22:01 GMT-0500 (EST)",
            "Tue March 07 2017 14:22:01 GMT-0500 (EST)",
            "Tue Mar 07 2017 14:22:01 GMT-05:00 (EST)",
            "Tue Mar 07 2017 14:22:01 GMT-05 (EST)",
            " Tue Mar 07 2017 14:22:01 GMT-0500 (EST)",
            "Tue Mar 07 2017 14:22:01 GMT-0500 (EST) ",
        ] {
            let token = encode_event(&RawEvent::new("pageview", text), now);
            assert!(token.used_fallback, "{text:?} parsed unexpectedly");
            assert_eq!(token.to_string(), format!("{};pageview", now.timestamp()));
        }
    }

    #[test]
    fn test_semicolon_in_type_is_not_escaped() {
        let event = RawEvent::new("a;b", "Tue Mar 07 2017 14:22:01 GMT-0500 (EST)");
        assert_eq!(
            encode_event(&event, fixed_now()).to_string(),
            "1488914521;a;b"
        );
    }
}
