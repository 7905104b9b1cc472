//! Display formatting for timestamps and ratings.

use std::fmt;

use chrono::{Local, TimeZone};

use crate::models::parse_timestamp;

/// Shown in place of a missing or unreadable value.
pub const PLACEHOLDER: &str = "—";

/// Stored UTC timestamp as local time, `HH:MM:SS DD.MM.YYYY`, or just
/// `DD.MM.YYYY` when `date_only`.
pub fn format_date_time(raw: Option<&str>, date_only: bool) -> String {
    format_date_time_in(raw, date_only, &Local)
}

/// [`format_date_time`] against an explicit time zone.
pub fn format_date_time_in<Tz>(raw: Option<&str>, date_only: bool, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let Some(naive) = raw.and_then(parse_timestamp) else {
        return PLACEHOLDER.to_string();
    };
    let local = tz.from_utc_datetime(&naive);
    let pattern = if date_only { "%d.%m.%Y" } else { "%H:%M:%S %d.%m.%Y" };
    local.format(pattern).to_string()
}

/// One decimal for positive ratings, the placeholder otherwise.
pub fn format_rating(rating: f64) -> String {
    if rating > 0.0 {
        format!("{rating:.1}")
    } else {
        PLACEHOLDER.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn formats_in_the_given_zone() {
        let raw = Some("2024-03-05 22:30:15");
        assert_eq!(format_date_time_in(raw, false, &Utc), "22:30:15 05.03.2024");

        let moscow = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(format_date_time_in(raw, false, &moscow), "01:30:15 06.03.2024");
        assert_eq!(format_date_time_in(raw, true, &moscow), "06.03.2024");
    }

    #[test]
    fn missing_or_garbage_is_placeholder() {
        assert_eq!(format_date_time_in(None, false, &Utc), PLACEHOLDER);
        assert_eq!(format_date_time_in(Some(""), true, &Utc), PLACEHOLDER);
        assert_eq!(format_date_time_in(Some("yesterday"), false, &Utc), PLACEHOLDER);
    }

    #[test]
    fn ratings() {
        assert_eq!(format_rating(8.0), "8.0");
        assert_eq!(format_rating(7.25), "7.2");
        assert_eq!(format_rating(0.0), PLACEHOLDER);
        assert_eq!(format_rating(-3.0), PLACEHOLDER);
    }
}
