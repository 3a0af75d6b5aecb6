use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigurationError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ClaimsResult<T> = Result<T, ClaimsError>;

/// Raised while building a [`crate::ValidatorConfig`]; never by validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{expected} and {ignore} cannot be used together")]
    ConflictingPolicy {
        expected: &'static str,
        ignore: &'static str,
    },
    #[error("clock skew of {requested:?} too large, max is {max:?}")]
    ClockSkewTooLarge { requested: Duration, max: Duration },
    #[error("fixed_now '{0}' has no timezone offset")]
    FixedNowWithoutTimezone(String),
    #[error("fixed_now '{value}' is not a valid RFC 3339 timestamp: {reason}")]
    InvalidFixedNow { value: String, reason: String },
    #[error("invalid value '{value}' for environment variable {key}")]
    InvalidEnv { key: &'static str, value: String },
}

/// The reason a claim set was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("token has expired since {0}")]
    Expired(DateTime<Utc>),
    #[error("token cannot be used before {0}")]
    NotYetValid(DateTime<Utc>),
    #[error("invalid JWT; missing expected {claim} {expected}")]
    MissingClaim {
        claim: &'static str,
        expected: String,
    },
    #[error("invalid JWT; expected {claim} {expected}, but got {actual}")]
    ClaimMismatch {
        claim: &'static str,
        expected: String,
        actual: String,
    },
    #[error("invalid JWT; token has {claim} set, but validator does not expect one")]
    UnexpectedClaim { claim: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
}

impl From<serde_json::Error> for ClaimsError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value.to_string())
    }
}

#[cfg(feature = "axum")]
mod response {
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use serde::Serialize;

    use super::ValidationError;

    #[derive(Debug, Serialize)]
    struct ErrorBody {
        code: &'static str,
        message: String,
    }

    impl IntoResponse for ValidationError {
        fn into_response(self) -> Response {
            let body = ErrorBody {
                code: "AUTH_CLAIMS",
                message: self.to_string(),
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}
