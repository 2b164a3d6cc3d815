use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::Serialize;

/// Everything that can go wrong while answering a price query.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("invalid parameters: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("no data provided by the provider: {0}")]
    EmptyResult(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Note: the URL is stripped because it carries the security token.
    #[error("failed to call the provider")]
    Transport(#[source] reqwest::Error),

    #[error("the provider responded with `{status}`: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("the provider responded with an empty body")]
    EmptyBody,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read the document root")]
    Root(#[from] quick_xml::Error),

    #[error("unexpected document root `{0}`")]
    UnexpectedRoot(String),

    #[error("the response does not match the market document schema")]
    Schema(#[from] quick_xml::DeError),

    #[error("`{value}` is not a valid provider timestamp")]
    Timestamp {
        value: String,

        #[source]
        source: chrono::ParseError,
    },

    #[error("`{value}` is not a valid price")]
    Price {
        value: String,

        #[source]
        source: rust_decimal::Error,
    },

    #[error("point position {0} is out of range")]
    Position(u32),

    #[error("`{0}` is not a supported resolution")]
    Resolution(String),

    #[error("the document has no `period.timeInterval`")]
    MissingInterval,
}

/// Response class, mirrors the HTTP status families the caller reacts to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    BadRequest,
    NoContent,
    Internal,
}

impl PriceError {
    pub const fn status(&self) -> StatusClass {
        match self {
            Self::Validation(_) => StatusClass::BadRequest,
            Self::EmptyResult(_) => StatusClass::NoContent,
            Self::Upstream(_) | Self::Parse(_) => StatusClass::Internal,
        }
    }

    /// Caller-facing view of the error. Internal details stay in the logs.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            Self::Validation(errors) => ErrorResponse {
                message: "Invalid parameters provided. See details for more information.".into(),
                status: self.status(),
                details: Some(errors.0.clone()),
            },
            Self::EmptyResult(reason) => ErrorResponse {
                message: "No data provided by ENTSO-E. Try another interval.".into(),
                status: self.status(),
                details: Some(vec![FieldError::new("provider", reason.clone())]),
            },
            Self::Upstream(_) | Self::Parse(_) => ErrorResponse {
                message: "An internal error occurred.".into(),
                status: self.status(),
                details: None,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: StatusClass,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Ordered field violations. The order follows the order of the checks.
#[must_use]
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, thiserror::Error)]
#[error("{}", join_field_errors(.0))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|error| error.field.as_str()).collect()
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors.iter().join("; ")
}
