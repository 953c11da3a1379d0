//! `/bfhl` validation and dispatch
//!
//! A request passes a fixed sequence of gates, each failing with its own
//! error: operator configuration, content type, body size, JSON object shape,
//! recognized keys, key count, then per-operation payload checks. The first
//! failing gate decides the response.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::Request;
use serde_json::{Map, Number, Value};
use std::fmt;

use super::error::ApiError;
use crate::config::AppState;
use crate::logger;
use crate::math;
use crate::upstream::AnswerProvider;

/// Largest accepted `fibonacci` count
pub const MAX_FIBONACCI: usize = 2000;

/// Largest accepted `prime`/`lcm`/`hcf` array
pub const MAX_ARRAY_LEN: usize = 2000;

/// The five mutually exclusive request keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fibonacci,
    Prime,
    Lcm,
    Hcf,
    Ai,
}

impl Operation {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "fibonacci" => Some(Self::Fibonacci),
            "prime" => Some(Self::Prime),
            "lcm" => Some(Self::Lcm),
            "hcf" => Some(Self::Hcf),
            "AI" => Some(Self::Ai),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Fibonacci => "fibonacci",
            Self::Prime => "prime",
            Self::Lcm => "lcm",
            Self::Hcf => "hcf",
            Self::Ai => "AI",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A validated request, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fibonacci(usize),
    Prime(Vec<i64>),
    Lcm(Vec<i64>),
    Hcf(Vec<i64>),
    Ai(String),
}

/// Run the full `/bfhl` pipeline for one request
pub async fn handle<B>(req: Request<B>, state: &AppState) -> Result<Value, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if state.config.bfhl.official_email().is_none() {
        return Err(ApiError::MissingEnv("OFFICIAL_EMAIL"));
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !is_json_content_type(content_type) {
        return Err(ApiError::InvalidContentType);
    }

    let body = read_body(req, state.config.http.max_body_size).await?;
    let command = parse_command(&body)?;
    execute(command, state.provider.as_deref()).await
}

/// Whether a `Content-Type` value declares `application/json`
///
/// Parameters such as `charset` are ignored; the comparison is case-insensitive.
pub fn is_json_content_type(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Collect the body, refusing anything over `max_body_size` bytes
async fn read_body<B>(req: Request<B>, max_body_size: u64) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if declared.is_some_and(|size| size > max_body_size) {
        return Err(ApiError::PayloadTooLarge { max: max_body_size });
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge { max: max_body_size })
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(ApiError::BodyRead)
        }
    }
}

/// Parse and validate a raw body into a [`Command`]
pub fn parse_command(body: &[u8]) -> Result<Command, ApiError> {
    let object = parse_object(body)?;
    let (operation, value) = select_operation(&object)?;
    validate(operation, value)
}

/// Body must be a single JSON object; an empty body counts as `{}`
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(ApiError::InvalidJson),
    }
}

/// Exactly one recognized key and nothing else
fn select_operation(object: &Map<String, Value>) -> Result<(Operation, &Value), ApiError> {
    let unknown_keys: Vec<String> = object
        .keys()
        .filter(|k| Operation::from_key(k).is_none())
        .cloned()
        .collect();
    if !unknown_keys.is_empty() {
        return Err(ApiError::UnknownKey { unknown_keys });
    }

    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => Operation::from_key(key)
            .map(|op| (op, value))
            .ok_or(ApiError::InvalidJson),
        _ => Err(ApiError::InvalidKeys {
            received_keys: object.keys().cloned().collect(),
        }),
    }
}

/// Per-operation payload checks
fn validate(operation: Operation, value: &Value) -> Result<Command, ApiError> {
    match operation {
        Operation::Fibonacci => {
            let n = as_integer(value)
                .filter(|n| *n >= 0)
                .ok_or(ApiError::InvalidFibonacci)?;
            match usize::try_from(n) {
                Ok(n) if n <= MAX_FIBONACCI => Ok(Command::Fibonacci(n)),
                _ => Err(ApiError::FibonacciTooLarge),
            }
        }
        Operation::Ai => match value.as_str().map(str::trim) {
            Some(question) if !question.is_empty() => Ok(Command::Ai(question.to_string())),
            _ => Err(ApiError::InvalidAi),
        },
        Operation::Prime => integer_array(operation, value).map(Command::Prime),
        Operation::Lcm => integer_array(operation, value).map(Command::Lcm),
        Operation::Hcf => integer_array(operation, value).map(Command::Hcf),
    }
}

/// Non-empty array of at most [`MAX_ARRAY_LEN`] integers
fn integer_array(operation: Operation, value: &Value) -> Result<Vec<i64>, ApiError> {
    let items = match value.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return Err(ApiError::InvalidArray(operation)),
    };
    if items.len() > MAX_ARRAY_LEN {
        return Err(ApiError::ArrayTooLarge);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let n = as_integer(item).ok_or_else(|| ApiError::InvalidArrayElement {
                index,
                value: item.clone(),
            })?;
            i64::try_from(n).map_err(|_| ApiError::ArrayElementOutOfRange {
                index,
                value: item.clone(),
            })
        })
        .collect()
}

/// Integral value of a JSON number; `5` and `5.0` both qualify
fn as_integer(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }

    // Integral floats saturate at the i128 bounds so huge values stay integers
    let f = n.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    (f.is_finite() && f.fract() == 0.0).then(|| f as i128)
}

/// Run a validated command
pub async fn execute(
    command: Command,
    provider: Option<&dyn AnswerProvider>,
) -> Result<Value, ApiError> {
    match command {
        Command::Fibonacci(n) => Ok(Value::Array(
            math::fibonacci(n).iter().map(exact_number).collect(),
        )),
        Command::Prime(values) => Ok(Value::Array(
            math::primes_from_list(&values)
                .into_iter()
                .map(Value::from)
                .collect(),
        )),
        Command::Lcm(values) => Ok(exact_number(&math::lcm_list(&values))),
        Command::Hcf(values) => Ok(Value::from(math::hcf(&values))),
        Command::Ai(question) => {
            let provider = provider.ok_or(ApiError::MissingEnv("OPENAI_API_KEY"))?;
            Ok(Value::String(provider.answer(&question).await?))
        }
    }
}

/// JSON number with every digit of `n`, however large
fn exact_number(n: &impl ToString) -> Value {
    let digits = n.to_string();
    match digits.parse::<Number>() {
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(digits),
    }
}
