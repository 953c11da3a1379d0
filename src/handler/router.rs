//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: rate limiting, route matching,
//! envelope rendering and access logging.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use super::bfhl;
use super::error::ApiError;
use crate::config::AppState;
use crate::http::{self, ResponseMeta};
use crate::limiter::RateDecision;
use crate::logger::{self, AccessLogEntry};

/// What a successful route produced
enum Reply {
    Health,
    Data(Value),
}

/// Main entry point for HTTP request handling
///
/// Never fails: every outcome, including internal errors, is rendered as an
/// envelope.
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.cached_access_log.load(Ordering::Relaxed);
    let mut entry = access_log.then(|| access_entry(&req, peer_addr));

    let meta = ResponseMeta {
        official_email: state.official_email(),
        server_name: &state.config.http.server_name,
    };

    let decision = state.limiter.check(peer_addr.ip());
    let outcome = match decision {
        RateDecision::Allowed { .. } => route_request(req, &state).await,
        RateDecision::Limited { retry_after_millis } => {
            Err(ApiError::RateLimited { retry_after_millis })
        }
    };

    let (mut response, error_code) = match outcome {
        Ok(Reply::Health) => (http::build_health_response(meta), None),
        Ok(Reply::Data(data)) => (http::build_success_response(meta, data), None),
        Err(err) => {
            if err.status().is_server_error() {
                logger::log_error(&format!("{}: {err}", err.code()));
            }
            (err.to_response(meta), Some(err.code()))
        }
    };

    apply_rate_limit_headers(&mut response, state.limiter.limit(), decision);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or_default();
        entry.error_code = error_code;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch on method and path
async fn route_request<B>(req: Request<B>, state: &AppState) -> Result<Reply, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match (req.method(), normalize_path(req.uri().path())) {
        (&Method::GET | &Method::HEAD, "/health") => Ok(Reply::Health),
        (&Method::POST, "/bfhl") => bfhl::handle(req, state).await.map(Reply::Data),
        _ => Err(ApiError::NotFound),
    }
}

/// `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset`
/// (whole seconds until the window ends, rounded up)
fn apply_rate_limit_headers(
    response: &mut Response<Full<Bytes>>,
    limit: u32,
    decision: RateDecision,
) {
    let (remaining, reset_after_millis) = match decision {
        RateDecision::Allowed {
            remaining,
            reset_after_millis,
        } => (remaining, reset_after_millis),
        RateDecision::Limited { retry_after_millis } => (0, retry_after_millis),
    };

    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(reset_after_millis.div_ceil(1000)),
    );
}

/// Drop a single trailing slash so `/bfhl/` routes like `/bfhl`
fn normalize_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
