use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    api::entsoe::response::{
        ACKNOWLEDGEMENT_ROOT,
        AcknowledgementDocument,
        PUBLICATION_ROOT,
        Period,
        PublicationDocument,
        TimeInterval,
        TimeSeries,
        root_name,
    },
    core::{
        area::{Area, AreaCode},
        error::{ParseError, PriceError},
    },
    ops::Interval,
    prelude::*,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

const NO_PERIODS: &str = "The provider returned a document without price points.";

const NO_REASON: &str = "The provider acknowledged the request without data.";

/// Normalized price document.
#[derive(Clone, Debug, Serialize)]
pub struct PriceDocument {
    pub created_at: DateTime<Utc>,
    pub area: Area,
    pub interval: Interval,
    pub periods: Vec<IntervalPeriod>,
}

/// One provider time series period.
#[derive(Clone, Debug, Serialize)]
pub struct IntervalPeriod {
    pub currency: String,
    pub unit: String,
    pub interval: Interval,
    pub points: Vec<PricePoint>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PricePoint {
    pub hour: DateTime<Utc>,
    pub price: Decimal,
}

impl PriceDocument {
    /// All points in document order.
    pub fn points(&self) -> impl Iterator<Item = &PricePoint> {
        self.periods.iter().flat_map(|period| period.points.iter())
    }

    #[must_use]
    pub fn n_points(&self) -> usize {
        self.periods.iter().map(|period| period.points.len()).sum()
    }

    #[must_use]
    pub fn mean_price(&self) -> Option<Decimal> {
        let n_points = self.n_points();
        if n_points == 0 {
            return None;
        }
        Some(self.points().map(|point| point.price).sum::<Decimal>() / Decimal::from(n_points))
    }
}

/// Assemble the price document out of the raw provider response.
#[instrument(skip_all, fields(area = %area))]
pub fn assemble(
    body: &str,
    area: AreaCode,
    now: DateTime<Utc>,
) -> Result<PriceDocument, PriceError> {
    let root = root_name(body)?;
    match root.as_str() {
        PUBLICATION_ROOT => {}
        ACKNOWLEDGEMENT_ROOT => {
            let document: AcknowledgementDocument =
                quick_xml::de::from_str(body).map_err(ParseError::from)?;
            let reason =
                document.reasons.into_iter().filter_map(|reason| reason.text).join(" ");
            info!(%reason, "acknowledged without data");
            return Err(PriceError::EmptyResult(if reason.is_empty() {
                NO_REASON.to_owned()
            } else {
                reason
            }));
        }
        _ => return Err(ParseError::UnexpectedRoot(root).into()),
    }

    let document: PublicationDocument = quick_xml::de::from_str(body).map_err(ParseError::from)?;
    if document.time_series.is_empty() {
        return Err(PriceError::EmptyResult(NO_PERIODS.to_owned()));
    }
    let interval = parse_interval(document.time_interval.as_ref().ok_or(ParseError::MissingInterval)?)?;
    let periods = document
        .time_series
        .into_iter()
        .map(assemble_series)
        .flatten_ok()
        .filter_ok(|period| !period.points.is_empty())
        .collect::<Result<Vec<_>, ParseError>>()?;
    if periods.is_empty() {
        return Err(PriceError::EmptyResult(NO_PERIODS.to_owned()));
    }

    let document = PriceDocument { created_at: now, area: area.into(), interval, periods };
    debug!(
        n_hours = document.interval.len().num_hours(),
        n_periods = document.periods.len(),
        n_points = document.n_points(),
        "assembled",
    );
    Ok(document)
}

fn assemble_series(series: TimeSeries) -> Result<Vec<IntervalPeriod>, ParseError> {
    let TimeSeries { currency, measure_unit, periods } = series;
    periods
        .into_iter()
        .map(|period| assemble_period(currency.clone(), measure_unit.clone(), period))
        .collect()
}

fn assemble_period(
    currency: String,
    unit: String,
    period: Period,
) -> Result<IntervalPeriod, ParseError> {
    let interval = parse_interval(&period.time_interval)?;
    let step = period.resolution.as_deref().map_or(Ok(TimeDelta::hours(1)), parse_resolution)?;
    let points = period
        .points
        .into_iter()
        .map(|point| {
            let offset = point.position.checked_sub(1).ok_or(ParseError::Position(point.position))?;
            let hour = step
                .checked_mul(i32::try_from(offset).map_err(|_| ParseError::Position(point.position))?)
                .and_then(|offset| interval.start.checked_add_signed(offset))
                .filter(|hour| interval.contains(*hour))
                .ok_or(ParseError::Position(point.position))?;
            let price = Decimal::from_str(point.amount.trim())
                .map_err(|source| ParseError::Price { value: point.amount.clone(), source })?;
            Ok(PricePoint { hour, price })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(IntervalPeriod { currency, unit, interval, points })
}

fn parse_interval(interval: &TimeInterval) -> Result<Interval, ParseError> {
    Ok(Interval { start: parse_timestamp(&interval.start)?, end: parse_timestamp(&interval.end)? })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map(|timestamp| timestamp.and_utc())
        .map_err(|source| ParseError::Timestamp { value: value.to_owned(), source })
}

/// Parse the `PT{n}M` or `PT{n}H` point resolution.
fn parse_resolution(value: &str) -> Result<TimeDelta, ParseError> {
    let error = || ParseError::Resolution(value.to_owned());
    let duration = value.trim().strip_prefix("PT").ok_or_else(error)?;
    let (amount, unit) = if let Some(minutes) = duration.strip_suffix('M') {
        (minutes, TimeDelta::minutes(1))
    } else if let Some(hours) = duration.strip_suffix('H') {
        (hours, TimeDelta::hours(1))
    } else {
        return Err(error());
    };
    match amount.parse::<i32>() {
        Ok(amount) if amount > 0 => unit.checked_mul(amount).ok_or_else(error),
        _ => Err(error()),
    }
}
