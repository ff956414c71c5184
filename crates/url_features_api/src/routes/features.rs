//! Feature extraction route handlers
//!
//! Both endpoints run one extraction under the configured request budget.
//! When the budget expires, providers still in flight are cancelled and the
//! vector is built from whatever had resolved, so a slow site still gets a
//! full 30-column answer.

use crate::{api_handler::*, middleware::extract_or_generate_request_id, AppState};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::HeaderMap,
    response::Json,
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use url_features::FeatureError;

/// GET /v1/features?url=https://example.com/login
#[instrument(skip_all, fields(request_id))]
pub async fn features_query_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<FeaturesQuery>, QueryRejection>,
) -> ApiResult<FeaturesResponse> {
    let request_id = extract_or_generate_request_id(&headers);
    tracing::Span::current().record("request_id", request_id.as_str());

    let Query(query) = query.map_err(|rejection| {
        ApiError::new(ApiErrorKind::InvalidRequest(rejection.body_text()), &request_id)
    })?;

    run_extraction(&state, &query.url, request_id).await
}

/// POST /v1/features with `{"url": "...", "request_id": "..."}`
///
/// A `request_id` in the body wins over the correlation headers.
#[instrument(skip_all, fields(request_id))]
pub async fn features_body_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<FeaturesRequest>, JsonRejection>,
) -> ApiResult<FeaturesResponse> {
    let header_id = extract_or_generate_request_id(&headers);

    let Json(request) = body.map_err(|rejection| {
        ApiError::new(ApiErrorKind::InvalidRequest(rejection.body_text()), &header_id)
    })?;

    let request_id = request
        .request_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(header_id);
    tracing::Span::current().record("request_id", request_id.as_str());

    run_extraction(&state, &request.url, request_id).await
}

async fn run_extraction(
    state: &AppState,
    url: &str,
    request_id: String,
) -> ApiResult<FeaturesResponse> {
    let max_length = state.config.security.max_url_length;
    if url.chars().count() > max_length {
        warn!("URL too long: {} characters", url.chars().count());
        return Err(ApiError::new(ApiErrorKind::UrlTooLong(max_length), request_id));
    }

    let cancel = CancellationToken::new();
    let budget = Duration::from_secs(state.config.server.request_timeout_secs);
    let deadline = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(budget).await;
            cancel.cancel();
        })
    };

    let outcome = state.extractor.extract_report(url, cancel.clone()).await;
    deadline.abort();

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            if matches!(err, FeatureError::MalformedUrl(_)) {
                state.metrics.record_malformed();
            }
            warn!("Extraction rejected: {}", err);
            return Err(ApiError::from_feature_error(err, request_id));
        }
    };

    if cancel.is_cancelled() {
        warn!("Request deadline of {:?} cut providers short", budget);
        state.metrics.record_deadline_exceeded();
    }
    state.metrics.record_extraction(&report.providers);

    info!(
        "Extraction completed: domain={} elapsed_ms={}",
        report.domain, report.elapsed_ms
    );

    Ok(Json(convert_extraction_report(report, request_id)))
}
