//! HTTP response building module
//!
//! Success: `{ is_success: true, official_email, data }`.
//! Failure: `{ is_success: false, official_email, error: { code, message, details? } }`.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Body used when the envelope itself cannot be serialized
const INTERNAL_ERROR_BODY: &str = r#"{"is_success":false,"official_email":"","error":{"code":"INTERNAL_ERROR","message":"Server error"}}"#;

/// Values stamped on every response
#[derive(Debug, Clone, Copy)]
pub struct ResponseMeta<'a> {
    pub official_email: &'a str,
    pub server_name: &'a str,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    is_success: bool,
    official_email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

/// `error` member of a failure envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Build 200 response carrying `data`
pub fn build_success_response(meta: ResponseMeta<'_>, data: Value) -> Response<Full<Bytes>> {
    let envelope = Envelope {
        is_success: true,
        official_email: meta.official_email,
        data: Some(data),
        error: None,
    };
    build_json_response(StatusCode::OK, &envelope, meta, &[])
}

/// Build health check response (success envelope without `data`)
pub fn build_health_response(meta: ResponseMeta<'_>) -> Response<Full<Bytes>> {
    let envelope = Envelope {
        is_success: true,
        official_email: meta.official_email,
        data: None,
        error: None,
    };
    build_json_response(StatusCode::OK, &envelope, meta, &[])
}

/// Build failure response with `status` and optional extra headers
pub fn build_error_response(
    meta: ResponseMeta<'_>,
    status: StatusCode,
    error: ErrorBody,
    extra_headers: &[(&'static str, String)],
) -> Response<Full<Bytes>> {
    let envelope = Envelope {
        is_success: false,
        official_email: meta.official_email,
        data: None,
        error: Some(error),
    };
    build_json_response(status, &envelope, meta, extra_headers)
}

fn build_json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    meta: ResponseMeta<'_>,
    extra_headers: &[(&'static str, String)],
) -> Response<Full<Bytes>> {
    let (status, json) = match serde_json::to_vec(body) {
        Ok(json) => (status, Bytes::from(json)),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes()),
            )
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .header("Content-Length", json.len())
        .header("Server", meta.server_name);
    for (name, value) in extra_headers {
        builder = builder.header(*name, value.as_str());
    }

    builder.body(Full::new(json)).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        let mut fallback = Response::new(Full::new(Bytes::from_static(
            INTERNAL_ERROR_BODY.as_bytes(),
        )));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    const META: ResponseMeta<'static> = ResponseMeta {
        official_email: "ops@example.com",
        server_name: "bfhl-test",
    };

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("infallible body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("valid json")
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = build_success_response(META, json!([0, 1, 1]));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["server"], "bfhl-test");
        assert_eq!(
            body_json(response).await,
            json!({ "is_success": true, "official_email": "ops@example.com", "data": [0, 1, 1] })
        );
    }

    #[tokio::test]
    async fn test_health_envelope_has_no_data() {
        let body = body_json(build_health_response(META)).await;
        assert_eq!(body, json!({ "is_success": true, "official_email": "ops@example.com" }));
    }

    #[tokio::test]
    async fn test_error_envelope_omits_empty_details() {
        let response = build_error_response(
            META,
            StatusCode::TOO_MANY_REQUESTS,
            ErrorBody {
                code: "RATE_LIMITED",
                message: "slow down".to_string(),
                details: None,
            },
            &[("Retry-After", "12".to_string())],
        );
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "12");

        let body = body_json(response).await;
        assert_eq!(body["is_success"], false);
        assert_eq!(body["error"], json!({ "code": "RATE_LIMITED", "message": "slow down" }));
        assert!(body.get("data").is_none());
    }
}
