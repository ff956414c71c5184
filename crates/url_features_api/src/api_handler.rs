//! Shared API types and utilities
//!
//! This module contains the request and response types, error handling,
//! and conversion utilities used across the extraction endpoints.

use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url_features::{
    features::FEATURE_COUNT, ExtractionReport, FeatureError, FeatureVector, ProviderReport,
};

/// Query parameters for feature extraction
#[derive(Debug, Deserialize)]
pub struct FeaturesQuery {
    /// URL to analyze (e.g., "https://example.com/login")
    pub url: String,
}

/// Request body for POST feature extraction
#[derive(Debug, Deserialize)]
pub struct FeaturesRequest {
    /// URL to analyze
    pub url: String,
    /// Optional request ID for tracking
    pub request_id: Option<String>,
}

/// API response for feature extraction
#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    /// Request ID for tracking
    pub request_id: String,
    /// Analyzed URL without credentials, query or fragment
    pub url: String,
    /// Salted fingerprint of the submitted URL
    pub fingerprint: String,
    /// Normalized domain used for on-site comparisons
    pub domain: String,
    /// Feature name to score, in classifier column order
    pub features: FeatureVector,
    /// The same scores as a bare row
    pub row: [i8; FEATURE_COUNT],
    /// How each network provider fared
    pub providers: ProviderReport,
    pub page_bytes: Option<usize>,
    pub redirect_hops: Option<usize>,
    /// Total processing time in milliseconds
    pub elapsed_ms: u64,
    /// Timestamp of the extraction (ISO 8601)
    pub checked_at: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    pub request_id: String,
    pub timestamp: String,
    pub details: Option<HashMap<String, String>>,
}

/// Result type for API handlers
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// What went wrong while serving a request
#[derive(Debug)]
pub enum ApiErrorKind {
    MalformedUrl(String),
    InvalidRequest(String),
    UrlTooLong(usize),
    InternalError(String),
}

/// API error carrying the id of the request it belongs to
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, request_id: impl Into<String>) -> Self {
        Self {
            kind,
            request_id: request_id.into(),
        }
    }

    /// Map an extraction error onto its API error
    pub fn from_feature_error(err: FeatureError, request_id: impl Into<String>) -> Self {
        let kind = match err {
            FeatureError::MalformedUrl(msg) => ApiErrorKind::MalformedUrl(msg),
            FeatureError::SchemaMismatch(msg) => ApiErrorKind::InternalError(msg),
            FeatureError::ConfigurationError(msg) => ApiErrorKind::InternalError(msg),
            FeatureError::InternalError(e) => ApiErrorKind::InternalError(e.to_string()),
        };
        Self::new(kind, request_id)
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message, details) = match self.kind {
            ApiErrorKind::MalformedUrl(msg) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_URL", msg, None)
            }
            ApiErrorKind::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg, None)
            }
            ApiErrorKind::UrlTooLong(max) => (
                StatusCode::BAD_REQUEST,
                "URL_TOO_LONG",
                format!("URL too long (max {max} characters)"),
                Some(HashMap::from([("max_length".to_string(), max.to_string())])),
            ),
            ApiErrorKind::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None)
            }
        };

        let error_response = ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            request_id: self.request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            details,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert a core ExtractionReport to the API response
pub fn convert_extraction_report(report: ExtractionReport, request_id: String) -> FeaturesResponse {
    FeaturesResponse {
        request_id,
        url: report.url,
        fingerprint: report.fingerprint,
        domain: report.domain,
        row: report.features.to_row(),
        features: report.features,
        providers: report.providers,
        page_bytes: report.page_bytes,
        redirect_hops: report.redirect_hops,
        elapsed_ms: report.elapsed_ms,
        checked_at: report.checked_at.to_rfc3339(),
    }
}
