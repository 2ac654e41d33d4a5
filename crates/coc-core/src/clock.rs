//! Calendar helpers in the dashboard's configured timezone.
//!
//! "Today" and "since January 1st" are defined in the owner's local zone,
//! not UTC, so a commit pushed at 11pm Pacific lands on the right day.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::CoreError;

#[must_use]
pub fn local_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

#[must_use]
pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// The UTC instant of local midnight starting `date`.
///
/// # Errors
///
/// Returns [`CoreError::AmbiguousMidnight`] if midnight does not exist in
/// `tz` on that date (a DST gap at 00:00).
pub fn day_start_utc(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, CoreError> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| CoreError::AmbiguousMidnight {
            date: date.to_string(),
            timezone: tz.name().to_string(),
        })
}

/// The UTC instant of local midnight on January 1st of `year`.
///
/// # Errors
///
/// See [`day_start_utc`].
pub fn year_start_utc(year: i32, tz: Tz) -> Result<DateTime<Utc>, CoreError> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        CoreError::AmbiguousMidnight {
            date: format!("{year}-01-01"),
            timezone: tz.name().to_string(),
        }
    })?;
    day_start_utc(jan_first, tz)
}

/// Human-readable stamp for the dashboard footer, e.g.
/// `October 15, 2026 at 09:30 AM PDT`.
#[must_use]
pub fn format_last_updated(at: &DateTime<Tz>) -> String {
    at.format("%B %d, %Y at %I:%M %p %Z").to_string()
}

/// Drop the zone database reference, keeping the offset that was in effect.
#[must_use]
pub fn to_fixed(at: &DateTime<Tz>) -> DateTime<FixedOffset> {
    at.fixed_offset()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    use super::*;

    #[test]
    fn late_evening_pacific_is_still_the_same_local_day() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 5, 30, 0).unwrap();
        assert_eq!(
            local_date(at, Los_Angeles),
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
        );
    }

    #[test]
    fn year_start_is_local_midnight() {
        let start = year_start_utc(2026, Los_Angeles).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn day_start_tracks_daylight_saving() {
        let summer = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        assert_eq!(
            day_start_utc(summer, Los_Angeles).unwrap(),
            Utc.with_ymd_and_hms(2026, 7, 4, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn last_updated_uses_zone_abbreviation() {
        let at = Utc
            .with_ymd_and_hms(2026, 10, 15, 16, 30, 0)
            .unwrap()
            .with_timezone(&Los_Angeles);
        assert_eq!(format_last_updated(&at), "October 15, 2026 at 09:30 AM PDT");

        let winter = Utc
            .with_ymd_and_hms(2026, 1, 5, 20, 5, 0)
            .unwrap()
            .with_timezone(&Los_Angeles);
        assert_eq!(format_last_updated(&winter), "January 05, 2026 at 12:05 PM PST");
    }

    #[test]
    fn to_fixed_keeps_the_offset() {
        let at = Utc
            .with_ymd_and_hms(2026, 10, 15, 16, 30, 0)
            .unwrap()
            .with_timezone(&Los_Angeles);
        assert_eq!(to_fixed(&at).to_rfc3339(), "2026-10-15T09:30:00-07:00");
    }
}
