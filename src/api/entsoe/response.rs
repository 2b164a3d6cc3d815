//! Raw provider XML documents.
//!
//! Only the elements the price document needs are declared, everything else is skipped.

use quick_xml::{Reader, events::Event};
use serde::Deserialize;

use crate::core::error::ParseError;

pub const PUBLICATION_ROOT: &str = "Publication_MarketDocument";

/// The provider answers with this root when there is no matching data.
pub const ACKNOWLEDGEMENT_ROOT: &str = "Acknowledgement_MarketDocument";

/// Local name of the first element in the document.
pub fn root_name(body: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                return Ok(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err(ParseError::UnexpectedRoot(String::new())),
            _ => {}
        }
    }
}

#[derive(Deserialize)]
pub struct PublicationDocument {
    #[serde(rename = "period.timeInterval")]
    pub time_interval: Option<TimeInterval>,

    #[serde(rename = "TimeSeries", default)]
    pub time_series: Vec<TimeSeries>,
}

#[derive(Deserialize)]
pub struct TimeInterval {
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct TimeSeries {
    #[serde(rename = "currency_Unit.name")]
    pub currency: String,

    #[serde(rename = "price_Measure_Unit.name")]
    pub measure_unit: String,

    #[serde(rename = "Period", default)]
    pub periods: Vec<Period>,
}

#[derive(Deserialize)]
pub struct Period {
    #[serde(rename = "timeInterval")]
    pub time_interval: TimeInterval,

    /// ISO-8601 duration, for example `PT60M`.
    pub resolution: Option<String>,

    #[serde(rename = "Point", default)]
    pub points: Vec<Point>,
}

#[derive(Deserialize)]
pub struct Point {
    /// 1-based.
    pub position: u32,

    /// Kept as text so that no precision is lost on the way to [`rust_decimal::Decimal`].
    #[serde(rename = "price.amount")]
    pub amount: String,
}

#[derive(Deserialize)]
pub struct AcknowledgementDocument {
    #[serde(rename = "Reason", default)]
    pub reasons: Vec<Reason>,
}

#[derive(Deserialize)]
pub struct Reason {
    pub text: Option<String>,
}
