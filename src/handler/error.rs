//! Error taxonomy for the API
//!
//! Each variant's `Display` is the client-facing message; `status`, `code` and
//! `details` fill in the rest of the failure envelope.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use super::bfhl::{Operation, MAX_ARRAY_LEN, MAX_FIBONACCI};
use crate::http::{build_error_response, ErrorBody, ResponseMeta};
use crate::upstream::ProviderError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is missing")]
    MissingEnv(&'static str),

    #[error("Content-Type must be application/json")]
    InvalidContentType,

    #[error("Request body too large (max {max} bytes)")]
    PayloadTooLarge { max: u64 },

    #[error("Failed to read request body")]
    BodyRead,

    #[error("Body must be a JSON object")]
    InvalidJson,

    #[error("Only one of fibonacci, prime, lcm, hcf, AI is allowed")]
    UnknownKey { unknown_keys: Vec<String> },

    #[error("Request must contain exactly one of: fibonacci, prime, lcm, hcf, AI")]
    InvalidKeys { received_keys: Vec<String> },

    #[error("fibonacci must be a non-negative integer")]
    InvalidFibonacci,

    #[error("fibonacci too large (max {})", MAX_FIBONACCI)]
    FibonacciTooLarge,

    #[error("AI must be a non-empty string question")]
    InvalidAi,

    #[error("{0} must be a non-empty integer array")]
    InvalidArray(Operation),

    #[error("Array too large (max {} elements)", MAX_ARRAY_LEN)]
    ArrayTooLarge,

    #[error("All array elements must be integers")]
    InvalidArrayElement { index: usize, value: Value },

    #[error("Array elements must be integers between {} and {}", i64::MIN, i64::MAX)]
    ArrayElementOutOfRange { index: usize, value: Value },

    #[error("Too many requests. Please retry later.")]
    RateLimited { retry_after_millis: u64 },

    #[error(transparent)]
    Upstream(#[from] ProviderError),

    #[error("Route not found")]
    NotFound,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingEnv(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidContentType
            | Self::BodyRead
            | Self::InvalidJson
            | Self::UnknownKey { .. }
            | Self::InvalidKeys { .. }
            | Self::InvalidFibonacci
            | Self::FibonacciTooLarge
            | Self::InvalidAi
            | Self::InvalidArray(_)
            | Self::ArrayTooLarge
            | Self::InvalidArrayElement { .. }
            | Self::ArrayElementOutOfRange { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingEnv(_) => "MISSING_ENV",
            Self::InvalidContentType => "INVALID_CONTENT_TYPE",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::BodyRead => "BODY_READ_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::UnknownKey { .. } => "UNKNOWN_KEY",
            Self::InvalidKeys { .. } => "INVALID_KEYS",
            Self::InvalidFibonacci => "INVALID_FIBONACCI",
            Self::FibonacciTooLarge => "FIB_TOO_LARGE",
            Self::InvalidAi => "INVALID_AI",
            Self::InvalidArray(_) => "INVALID_ARRAY",
            Self::ArrayTooLarge => "ARRAY_TOO_LARGE",
            Self::InvalidArrayElement { .. } | Self::ArrayElementOutOfRange { .. } => {
                "INVALID_ARRAY_ELEMENT"
            }
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::NotFound => "NOT_FOUND",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            Self::UnknownKey { unknown_keys } => Some(json!({ "unknown_keys": unknown_keys })),
            Self::InvalidKeys { received_keys } => Some(json!({ "received_keys": received_keys })),
            Self::InvalidArrayElement { index, value }
            | Self::ArrayElementOutOfRange { index, value } => {
                Some(json!({ "index": index, "value": value }))
            }
            Self::Upstream(err) => Some(err.details()),
            _ => None,
        }
    }

    /// Render as a failure envelope
    pub fn to_response(&self, meta: ResponseMeta<'_>) -> Response<Full<Bytes>> {
        let mut headers = Vec::new();
        if let Self::RateLimited { retry_after_millis } = self {
            headers.push(("Retry-After", retry_after_millis.div_ceil(1000).to_string()));
        }

        build_error_response(
            meta,
            self.status(),
            ErrorBody {
                code: self.code(),
                message: self.to_string(),
                details: self.details(),
            },
            &headers,
        )
    }
}
