//! Middleware for request correlation and response hardening

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

/// Longest caller-supplied request id that is reused verbatim
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Request ID extraction and generation
///
/// Reuses a caller-supplied `x-trace-id` or `x-request-id` so requests can
/// be correlated across services; otherwise generates a UUID.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    for name in ["x-trace-id", "x-request-id"] {
        if let Some(id) = headers.get(name).and_then(|value| value.to_str().ok()) {
            let id = id.trim();
            if !id.is_empty() && id.len() <= MAX_REQUEST_ID_LENGTH {
                debug!("Using caller request id from {}", name);
                return id.to_string();
            }
        }
    }

    Uuid::new_v4().to_string()
}

/// Security headers middleware
///
/// Adds security-related headers to all responses.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    headers.insert(
        "x-api-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_or_generate_request_id() {
        let mut headers = HeaderMap::new();

        headers.insert("x-trace-id", HeaderValue::from_static("trace-123"));
        headers.insert("x-request-id", HeaderValue::from_static("req-456"));
        assert_eq!(extract_or_generate_request_id(&headers), "trace-123");

        headers.clear();
        headers.insert("x-request-id", HeaderValue::from_static("req-456"));
        assert_eq!(extract_or_generate_request_id(&headers), "req-456");

        headers.clear();
        let generated_id = extract_or_generate_request_id(&headers);
        assert!(Uuid::parse_str(&generated_id).is_ok());
    }

    #[test]
    fn test_oversized_request_id_is_replaced() {
        let mut headers = HeaderMap::new();
        let long = "a".repeat(MAX_REQUEST_ID_LENGTH + 1);
        headers.insert("x-request-id", HeaderValue::from_str(&long).unwrap());

        let id = extract_or_generate_request_id(&headers);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
