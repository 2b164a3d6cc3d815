//! Caller-supplied time selectors and their validation.
//!
//! A request populates fields of at most one selector shape:
//!
//! - date range: `from`, `to`;
//! - calendar period: `year`, `month`, `week`;
//! - relative interval: `intervalType`, `interval`.
//!
//! Validation never stops at the first violation: every check runs and the field errors come
//! back in the order of the checks.

use std::fmt::{Debug, Formatter};

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{
        area::AreaCode,
        clock::{PROVIDER_FLOOR, iso_weeks_in, iso_weeks_started},
        error::ValidationErrors,
    },
    prelude::*,
};

const FORMAT_MESSAGE: &str = "Timestamp format has to be either yyyyMMdd or yyyyMMddHHmm. \
    Example: December 1st, 2022 at 23:00 (11PM) would either be 20221201 or 202212012300.";

const MAX_RANGE_DAYS: i64 = 365;

#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    clap::ValueEnum,
    derive_more::Display
)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntervalUnit {
    #[display("year")]
    Year,

    #[display("month")]
    Month,

    #[display("week")]
    Week,

    #[display("day")]
    Day,
}

impl IntervalUnit {
    /// Largest magnitude of a relative interval in this unit.
    pub const fn ceiling(self) -> u32 {
        match self {
            Self::Year => 1,
            Self::Month => 12,
            Self::Week => 53,
            Self::Day => 365,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CalendarPeriod {
    Month(u32),

    /// ISO-8601 week number.
    Week(u32),
}

/// Validated selector, exactly one shape per request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Selector {
    /// Missing `to` means today.
    DateRange { from: NaiveDate, to: Option<NaiveDate> },

    /// Missing `year` means the current year, missing `period` means the whole year.
    Calendar { year: Option<i32>, period: Option<CalendarPeriod> },

    /// Positive `count` looks back from today, negative looks forward.
    Relative { unit: IntervalUnit, count: i32 },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Shape {
    DateRange,
    Calendar,
    Relative,
}

/// Raw, unvalidated selector fields as they come from the caller.
#[derive(Clone, Default, bon::Builder)]
pub struct RawSelector {
    #[builder(into)]
    pub area: Option<String>,

    #[builder(into)]
    pub credential: Option<String>,

    #[builder(into)]
    pub from: Option<String>,

    #[builder(into)]
    pub to: Option<String>,

    pub year: Option<i32>,
    pub month: Option<i32>,
    pub week: Option<i32>,
    pub interval_unit: Option<IntervalUnit>,
    pub interval: Option<i32>,
}

/// Query that passed validation.
pub struct ValidatedQuery {
    pub area: AreaCode,
    pub credential: String,
    pub selector: Selector,
}

impl Debug for ValidatedQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedQuery")
            .field("area", &self.area)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl RawSelector {
    /// Validate the fields against the provider rules as of `today` in the reference zone.
    #[instrument(skip_all, fields(today = %today))]
    pub fn validate(&self, today: NaiveDate) -> Result<ValidatedQuery, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let credential = self.validate_credential(&mut errors);
        let area = self.validate_area(&mut errors);

        let shapes = self.populated_shapes();
        if shapes.len() > 1 {
            let fields = shapes.iter().flat_map(|shape| self.populated_fields(*shape)).join(",");
            errors.push(
                fields,
                "You can only use one search method at a time: \
                 either from/to, year/month/week, or intervalType/interval.",
            );
        }

        // Conflicting shapes are validated too, so that everything is reported at once.
        let selectors: Vec<Option<Selector>> = shapes
            .into_iter()
            .map(|shape| match shape {
                Shape::DateRange => self.validate_date_range(today, &mut errors),
                Shape::Calendar => self.validate_calendar(today, &mut errors),
                Shape::Relative => self.validate_relative(&mut errors),
            })
            .collect();
        let selector = selectors
            .first()
            .copied()
            .unwrap_or(Some(Selector::Calendar { year: None, period: None }));

        match (credential, area, selector) {
            (Some(credential), Some(area), Some(selector)) if errors.is_empty() => {
                debug!(?area, ?selector, "validated");
                Ok(ValidatedQuery { area, credential, selector })
            }
            _ => {
                warn!(n_errors = errors.len(), "rejected");
                Err(errors)
            }
        }
    }

    fn validate_credential(&self, errors: &mut ValidationErrors) -> Option<String> {
        match self.credential.as_deref().map(str::trim) {
            Some(credential) if !credential.is_empty() => Some(credential.to_owned()),
            _ => {
                errors.push(
                    "securityToken",
                    "ENTSO-E security token has to be provided, \
                     either with `--security-token` or the `ENTSOE_SECURITY_TOKEN` variable.",
                );
                None
            }
        }
    }

    fn validate_area(&self, errors: &mut ValidationErrors) -> Option<AreaCode> {
        let Some(area) = self.area.as_deref().filter(|area| !area.trim().is_empty()) else {
            errors.push(
                "areaCode",
                format!(
                    "Area Code is required. The following Area Codes are available: {}",
                    AreaCode::listing(),
                ),
            );
            return None;
        };
        let area = AreaCode::find(area);
        if area.is_none() {
            errors.push(
                "areaCode",
                format!(
                    "Area Code is not valid. The following Area Codes are available: {}",
                    AreaCode::listing(),
                ),
            );
        }
        area
    }

    fn populated_fields(&self, shape: Shape) -> Vec<&'static str> {
        let fields = match shape {
            Shape::DateRange => {
                vec![("from", is_present(self.from.as_deref())), ("to", is_present(self.to.as_deref()))]
            }
            Shape::Calendar => vec![
                ("year", self.year.is_some()),
                ("month", self.month.is_some()),
                ("week", self.week.is_some()),
            ],
            Shape::Relative => vec![
                ("intervalType", self.interval_unit.is_some()),
                ("interval", self.interval.is_some()),
            ],
        };
        fields.into_iter().filter(|(_, is_present)| *is_present).map(|(field, _)| field).collect()
    }

    fn populated_shapes(&self) -> Vec<Shape> {
        [Shape::DateRange, Shape::Calendar, Shape::Relative]
            .into_iter()
            .filter(|shape| !self.populated_fields(*shape).is_empty())
            .collect()
    }

    fn validate_date_range(
        &self,
        today: NaiveDate,
        errors: &mut ValidationErrors,
    ) -> Option<Selector> {
        let n_errors = errors.len();

        let from = match self.from.as_deref().filter(|from| !from.trim().is_empty()) {
            Some(from) => parse_timestamp("from", from, errors),
            None => {
                errors.push(
                    "from",
                    "The 'from' parameter is required, when searching by date/time interval with from/to.",
                );
                None
            }
        };
        if let Some(from) = from {
            check_floor("from", from, errors);
        }

        let to = self
            .to
            .as_deref()
            .filter(|to| !to.trim().is_empty())
            .and_then(|to| parse_timestamp("to", to, errors));
        if let Some(to) = to {
            check_floor("to", to, errors);
            let tomorrow = today + Days::new(1);
            if to > tomorrow {
                errors.push(
                    "to",
                    format!(
                        "The 'to' date can be at most one day ahead of today ({tomorrow}). \
                         For the day-ahead prices use intervalType=DAY with interval=-1.",
                    ),
                );
            }
        }

        if let Some(from) = from
            && (to.unwrap_or(today) - from).num_days().abs() > MAX_RANGE_DAYS
        {
            errors.push(
                "from/to",
                "Date range is limited to +/- 365 days (1 year). \
                 If you want to search for days further back in time, \
                 please ensure that there is no more than 365 days between from and to.",
            );
        }

        (errors.len() == n_errors).then_some(Selector::DateRange { from: from?, to })
    }

    fn validate_calendar(
        &self,
        today: NaiveDate,
        errors: &mut ValidationErrors,
    ) -> Option<Selector> {
        let n_errors = errors.len();
        let current_year = today.year();
        let floor_year = PROVIDER_FLOOR.year();
        let year = self.year.unwrap_or(current_year);

        if let Some(year) = self.year {
            if year > current_year {
                errors.push(
                    "year",
                    format!("The year provided has to be before or equal to {current_year}."),
                );
            }
            if year < floor_year {
                errors.push(
                    "year",
                    format!("The year provided has to be {floor_year} or later, the provider has no earlier data."),
                );
            }
        }

        let month = self.month.and_then(|month| {
            let month = u32::try_from(month).ok().filter(|month| (1..=12).contains(month));
            if month.is_none() {
                errors.push("month", "The month provided has to be in the range 1 - 12.");
            }
            month
        });

        let week = self.week.and_then(|week| {
            let week = u32::try_from(week).ok().filter(|week| (1..=53).contains(week));
            match week {
                None => {
                    errors.push("week", "The week provided has to be in the range 1 - 53.");
                    None
                }
                Some(week) if week > iso_weeks_in(year) => {
                    errors.push("week", format!("The year {year} has only 52 ISO weeks."));
                    None
                }
                Some(week) => Some(week),
            }
        });

        if self.month.is_some() && self.week.is_some() {
            errors.push("month,week", "Please provide either a month or a week, not both.");
        }

        if year == current_year {
            let current_month = today.month();
            if month.is_some_and(|month| month > current_month) {
                errors.push(
                    "month",
                    format!("The month provided has to be before or equal to {current_month}."),
                );
            }
            let current_week = iso_weeks_started(year, today);
            if week.is_some_and(|week| week > current_week) {
                errors.push(
                    "week",
                    format!("The week provided has to be before or equal to {current_week}."),
                );
            }
        }

        if year == floor_year {
            let floor_month = PROVIDER_FLOOR.month();
            if month.is_some_and(|month| month < floor_month) {
                errors.push(
                    "month",
                    format!("The month provided has to be {floor_month} or later in {floor_year}, the provider has no earlier data."),
                );
            }
            let floor_week = PROVIDER_FLOOR.iso_week().week();
            if week.is_some_and(|week| week < floor_week) {
                errors.push(
                    "week",
                    format!("The week provided has to be {floor_week} or later in {floor_year}, the provider has no earlier data."),
                );
            }
        }

        let period = month.map(CalendarPeriod::Month).or_else(|| week.map(CalendarPeriod::Week));
        (errors.len() == n_errors).then_some(Selector::Calendar { year: self.year, period })
    }

    fn validate_relative(&self, errors: &mut ValidationErrors) -> Option<Selector> {
        let (unit, count) = match (self.interval_unit, self.interval) {
            (Some(unit), Some(count)) => (unit, count),
            (Some(unit), None) => {
                errors.push(
                    "interval",
                    format!("You have provided an intervalType ({unit}), but no interval."),
                );
                return None;
            }
            (None, _) => {
                errors.push(
                    "intervalType",
                    "You have provided an interval, but no intervalType (year, month, week, or day).",
                );
                return None;
            }
        };

        if count == 0 {
            errors.push(
                "interval",
                "Interval cannot be set to 0. It should be greater or less than 0, e.g. 7 or -30.",
            );
            return None;
        }

        let message = match unit {
            IntervalUnit::Year if count.unsigned_abs() != 1 => {
                "Yearly intervals are limited to +/- 1 year. \
                 If you want to search for a specific year, e.g. 2020, please use the 'year' parameter instead."
            }
            IntervalUnit::Month if count.unsigned_abs() > IntervalUnit::Month.ceiling() => {
                "Monthly intervals are limited to +/- 12 months (1 year). \
                 If you want to search for months further back in time, please use from/to or year/month instead."
            }
            IntervalUnit::Week if count.unsigned_abs() > IntervalUnit::Week.ceiling() => {
                "Weekly intervals are limited to +/- 53 weeks (1 year). \
                 If you want to search for weeks further back in time, please use from/to or year/week instead."
            }
            IntervalUnit::Day if count < -1 || count.unsigned_abs() > IntervalUnit::Day.ceiling() => {
                "Daily intervals are limited to 1 - 365 days back in time, or -1 for the day-ahead prices. \
                 If you want to search for days further back in time, please use from/to instead."
            }
            _ => return Some(Selector::Relative { unit, count }),
        };
        errors.push("interval", message);
        None
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

/// Parse `yyyyMMdd` or `yyyyMMddHHmm` into the calendar date, the time part is only validated.
fn parse_timestamp(field: &str, value: &str, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let value = value.trim();
    if !matches!(value.len(), 8 | 12) || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        errors.push(field, FORMAT_MESSAGE);
        return None;
    }
    let date = if value.len() == 8 {
        NaiveDate::parse_from_str(value, "%Y%m%d")
    } else {
        NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M").map(|timestamp| timestamp.date())
    };
    match date {
        Ok(date) => Some(date),
        Err(error) => {
            errors.push(field, format!("`{value}` is not a valid timestamp: {error}."));
            None
        }
    }
}

fn check_floor(field: &str, date: NaiveDate, errors: &mut ValidationErrors) {
    if date < PROVIDER_FLOOR {
        errors.push(
            field,
            format!("The provider has no data before {PROVIDER_FLOOR}, please pick a later date."),
        );
    }
}
