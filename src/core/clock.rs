//! Provider calendar conventions.

use chrono::{DateTime, Datelike, IsoWeek, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::{Europe::Copenhagen, Tz};

/// All "today" and wall-clock decisions are made in this zone.
pub const REFERENCE_ZONE: Tz = Copenhagen;

/// The provider day `D` spans `[D-1 23:00, D 23:00]`.
pub const DAY_BOUNDARY: NaiveTime = NaiveTime::from_hms_opt(23, 0, 0).unwrap();

/// The provider has no price data before this date.
pub const PROVIDER_FLOOR: NaiveDate = NaiveDate::from_ymd_opt(2015, 4, 1).unwrap();

/// Current time in the reference zone.
pub fn now() -> DateTime<Tz> {
    Utc::now().with_timezone(&REFERENCE_ZONE)
}

/// Snap the date to the provider day boundary.
pub fn snap(date: NaiveDate) -> NaiveDateTime {
    date.and_time(DAY_BOUNDARY)
}

/// Number of ISO-8601 weeks in the ISO year.
pub fn iso_weeks_in(year: i32) -> u32 {
    if NaiveDate::from_isoywd_opt(year, 53, Weekday::Mon).is_some() { 53 } else { 52 }
}

/// Number of ISO weeks of the calendar `year` which have started by `today`.
pub fn iso_weeks_started(year: i32, today: NaiveDate) -> u32 {
    let week: IsoWeek = today.iso_week();
    match week.year().cmp(&year) {
        std::cmp::Ordering::Equal => week.week(),
        std::cmp::Ordering::Less => 0,
        std::cmp::Ordering::Greater => iso_weeks_in(year),
    }
}
