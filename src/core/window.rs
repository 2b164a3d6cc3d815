use std::fmt::{Display, Formatter};

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};

use crate::core::{
    clock::snap,
    selector::{CalendarPeriod, IntervalUnit, Selector},
};

/// Provider wire format of the window boundaries.
pub const WIRE_FORMAT: &str = "%Y%m%d%H%M";

/// Canonical query window, both boundaries on the provider day boundary.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueryWindow {
    /// Inclusive.
    pub start: NaiveDateTime,

    /// Exclusive.
    pub end: NaiveDateTime,
}

impl QueryWindow {
    /// Window covering the provider days after `a` up to and including `b`, in either order.
    pub fn between(a: NaiveDate, b: NaiveDate) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self { start: snap(start), end: snap(end) }
    }

    /// `periodStart` query value.
    pub fn period_start(&self) -> String {
        self.start.format(WIRE_FORMAT).to_string()
    }

    /// `periodEnd` query value.
    pub fn period_end(&self) -> String {
        self.end.format(WIRE_FORMAT).to_string()
    }

    #[must_use]
    pub fn n_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl Display for QueryWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start.format(WIRE_FORMAT), self.end.format(WIRE_FORMAT))
    }
}

impl Selector {
    /// Resolve the selector into the window as of `today` in the reference zone.
    ///
    /// Returns [`None`] only when the arithmetic leaves the supported calendar,
    /// which cannot happen for a validated selector.
    pub fn resolve(&self, today: NaiveDate) -> Option<QueryWindow> {
        match *self {
            Self::DateRange { from, to } => Some(QueryWindow::between(from, to.unwrap_or(today))),
            Self::Calendar { year, period } => {
                let year = year.unwrap_or_else(|| today.year());
                match period {
                    None => resolve_year(year),
                    Some(CalendarPeriod::Month(month)) => resolve_month(year, month),
                    Some(CalendarPeriod::Week(week)) => resolve_week(year, week),
                }
            }
            Self::Relative { unit, count } => resolve_relative(unit, count, today),
        }
    }
}

fn resolve_year(year: i32) -> Option<QueryWindow> {
    let first_day = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let next_first_day = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    Some(QueryWindow::between(first_day.pred_opt()?, next_first_day.pred_opt()?))
}

fn resolve_month(year: i32, month: u32) -> Option<QueryWindow> {
    let first_day = NaiveDate::from_ymd_opt(year, month.clamp(1, 12), 1)?;
    let last_day = first_day.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(QueryWindow::between(first_day.pred_opt()?, last_day))
}

/// ISO-8601 week: the window starts on the Sunday before the ISO Monday.
fn resolve_week(year: i32, week: u32) -> Option<QueryWindow> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    let sunday = monday.pred_opt()?;
    Some(QueryWindow::between(sunday, sunday.checked_add_days(Days::new(7))?))
}

fn resolve_relative(unit: IntervalUnit, count: i32, today: NaiveDate) -> Option<QueryWindow> {
    let magnitude = count.unsigned_abs().min(unit.ceiling());
    let other = if count > 0 {
        unit.shift_back(today, magnitude)?
    } else {
        unit.shift_forward(today, magnitude)?
    };
    Some(QueryWindow::between(other, today))
}

impl IntervalUnit {
    fn shift_back(self, date: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Self::Year => date.checked_sub_months(Months::new(n * 12)),
            Self::Month => date.checked_sub_months(Months::new(n)),
            Self::Week => date.checked_sub_days(Days::new(u64::from(n) * 7)),
            Self::Day => date.checked_sub_days(Days::new(u64::from(n))),
        }
    }

    fn shift_forward(self, date: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Self::Year => date.checked_add_months(Months::new(n * 12)),
            Self::Month => date.checked_add_months(Months::new(n)),
            Self::Week => date.checked_add_days(Days::new(u64::from(n) * 7)),
            Self::Day => date.checked_add_days(Days::new(u64::from(n))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn resolve(selector: Selector) -> String {
        selector.resolve(today()).unwrap().to_string()
    }

    #[test]
    fn test_year_ok() {
        let selector = Selector::Calendar { year: Some(2022), period: None };
        assert_eq!(resolve(selector), "202112312300..202212312300");
    }

    #[test]
    fn test_current_year_ok() {
        let selector = Selector::Calendar { year: None, period: None };
        assert_eq!(resolve(selector), "202512312300..202612312300");
    }

    #[test]
    fn test_month_ok() {
        let selector = Selector::Calendar { year: Some(2022), period: Some(CalendarPeriod::Month(2)) };
        assert_eq!(resolve(selector), "202201312300..202202282300");

        let selector = Selector::Calendar { year: Some(2024), period: Some(CalendarPeriod::Month(2)) };
        assert_eq!(resolve(selector), "202401312300..202402292300");

        let selector = Selector::Calendar { year: Some(2022), period: Some(CalendarPeriod::Month(12)) };
        assert_eq!(resolve(selector), "202211302300..202212312300");
    }

    #[test]
    fn test_month_clamped_ok() {
        let selector = Selector::Calendar { year: Some(2022), period: Some(CalendarPeriod::Month(14)) };
        assert_eq!(resolve(selector), "202211302300..202212312300");
    }

    #[test]
    fn test_iso_week_ok() {
        let selector = Selector::Calendar { year: Some(2022), period: Some(CalendarPeriod::Week(1)) };
        assert_eq!(resolve(selector), "202201022300..202201092300");

        // 2021-W01 starts on 2021-01-04, although January 1st is a Friday.
        let selector = Selector::Calendar { year: Some(2021), period: Some(CalendarPeriod::Week(1)) };
        assert_eq!(resolve(selector), "202101032300..202101102300");

        let selector = Selector::Calendar { year: Some(2020), period: Some(CalendarPeriod::Week(53)) };
        assert_eq!(resolve(selector), "202012272300..202101032300");
    }

    #[test]
    fn test_nonexistent_week_ok() {
        let selector = Selector::Calendar { year: Some(2022), period: Some(CalendarPeriod::Week(53)) };
        assert_eq!(selector.resolve(today()), None);
    }

    #[test]
    fn test_date_range_ok() {
        let selector = Selector::DateRange { from: date(2022, 12, 1), to: Some(date(2022, 12, 10)) };
        assert_eq!(resolve(selector), "202212012300..202212102300");
    }

    #[test]
    fn test_date_range_swapped_ok() {
        let selector = Selector::DateRange { from: date(2022, 12, 10), to: Some(date(2022, 12, 1)) };
        let window = selector.resolve(today()).unwrap();
        assert!(window.start <= window.end);
        assert_eq!(window.to_string(), "202212012300..202212102300");
    }

    #[test]
    fn test_date_range_swap_property_ok() {
        for offset in 0..400 {
            let from = today() - Days::new(offset);
            let to = from - Days::new(offset % 37);
            let window = Selector::DateRange { from, to: Some(to) }.resolve(today()).unwrap();
            assert!(window.start <= window.end, "{from} {to}");
        }
    }

    #[test]
    fn test_date_range_open_ok() {
        let selector = Selector::DateRange { from: date(2026, 10, 1), to: None };
        assert_eq!(resolve(selector), "202610012300..202610162300");
    }

    #[test]
    fn test_days_back_ok() {
        let selector = Selector::Relative { unit: IntervalUnit::Day, count: 7 };
        assert_eq!(resolve(selector), "202610092300..202610162300");
    }

    #[test]
    fn test_day_ahead_ok() {
        let selector = Selector::Relative { unit: IntervalUnit::Day, count: -1 };
        assert_eq!(resolve(selector), "202610162300..202610172300");
    }

    #[test]
    fn test_months_back_calendar_aware_ok() {
        let selector = Selector::Relative { unit: IntervalUnit::Month, count: 3 };
        let window = selector.resolve(date(2026, 5, 31)).unwrap();
        assert_eq!(window.to_string(), "202602282300..202605312300");
    }

    #[test]
    fn test_weeks_forward_ok() {
        let selector = Selector::Relative { unit: IntervalUnit::Week, count: -2 };
        assert_eq!(resolve(selector), "202610162300..202610302300");
    }

    #[test]
    fn test_year_back_ok() {
        let selector = Selector::Relative { unit: IntervalUnit::Year, count: 1 };
        assert_eq!(resolve(selector), "202510162300..202610162300");
    }

    #[test]
    fn test_relative_clamped_ok() {
        let selector = Selector::Relative { unit: IntervalUnit::Month, count: 20 };
        assert_eq!(resolve(selector), "202510162300..202610162300");
    }

    #[test]
    fn test_across_daylight_saving_ok() {
        // Central European Summer Time ends on 2026-10-25.
        let selector = Selector::Relative { unit: IntervalUnit::Day, count: 2 };
        let window = selector.resolve(date(2026, 10, 26)).unwrap();
        assert_eq!(window.to_string(), "202610242300..202610262300");
        assert_eq!(window.n_days(), 2);
    }

    #[test]
    fn test_period_parameters_ok() {
        let window = QueryWindow::between(date(2021, 12, 31), date(2022, 12, 31));
        assert_eq!(window.period_start(), "202112312300");
        assert_eq!(window.period_end(), "202212312300");
    }
}
