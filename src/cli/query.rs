use chrono::{Datelike, NaiveDate};
use clap::{Parser, ValueEnum};

use crate::{
    core::{
        error::{PriceError, StatusClass},
        selector::{IntervalUnit, RawSelector},
    },
    prelude::*,
    tables::build_error_table,
};

/// Area and credential of a price query.
#[derive(Parser)]
pub struct AreaArgs {
    /// Bidding zone short code, for example `DK1`.
    pub area: Option<String>,

    /// ENTSO-E Transparency Platform security token.
    #[clap(long = "security-token", env = "ENTSOE_SECURITY_TOKEN", hide_env_values = true)]
    pub security_token: Option<String>,
}

/// Time selector: use the fields of only one shape.
#[derive(Default, Parser)]
pub struct SelectorArgs {
    /// Range start, `yyyyMMdd` or `yyyyMMddHHmm`.
    #[clap(long)]
    pub from: Option<String>,

    /// Range end, `yyyyMMdd` or `yyyyMMddHHmm`, defaults to today.
    #[clap(long)]
    pub to: Option<String>,

    #[clap(long)]
    pub year: Option<i32>,

    #[clap(long, allow_negative_numbers = true)]
    pub month: Option<i32>,

    /// ISO-8601 week number.
    #[clap(long, allow_negative_numbers = true)]
    pub week: Option<i32>,

    /// Shortcut for the year and month, or the ISO year and week, containing today.
    #[clap(long, value_enum, conflicts_with_all = ["year", "month", "week"])]
    pub current: Option<CurrentPeriod>,

    #[clap(long = "interval-type", value_enum)]
    pub interval_type: Option<IntervalUnit>,

    /// Positive looks back from today, negative looks forward: `--interval-type day --interval -1`
    /// is the day-ahead.
    #[clap(long, allow_negative_numbers = true)]
    pub interval: Option<i32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CurrentPeriod {
    Month,
    Week,
}

impl AreaArgs {
    pub fn to_raw(&self, selector: &SelectorArgs, today: NaiveDate) -> RawSelector {
        let raw = RawSelector {
            area: self.area.clone(),
            credential: self.security_token.clone(),
            from: selector.from.clone(),
            to: selector.to.clone(),
            year: selector.year,
            month: selector.month,
            week: selector.week,
            interval_unit: selector.interval_type,
            interval: selector.interval,
        };
        match selector.current {
            None => raw,
            Some(CurrentPeriod::Month) => RawSelector {
                year: Some(today.year()),
                month: i32::try_from(today.month()).ok(),
                ..raw
            },
            Some(CurrentPeriod::Week) => {
                let week = today.iso_week();
                RawSelector { year: Some(week.year()), week: i32::try_from(week.week()).ok(), ..raw }
            }
        }
    }
}

/// Print the caller-facing error view and convert the error for the exit code.
pub fn report(error: PriceError, json: bool) -> Error {
    let response = error.to_response();
    let error = Error::new(error);
    if response.status == StatusClass::Internal {
        error!("{error:#}");
    }
    if json {
        match serde_json::to_string_pretty(&response) {
            Ok(response) => println!("{response}"),
            Err(error) => warn!("failed to serialize the error response: {error:#}"),
        }
    } else {
        println!("{}", build_error_table(&response));
    }
    error.context(response.message)
}
