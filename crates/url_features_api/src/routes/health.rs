//! Health check and monitoring routes
//!
//! This module contains endpoints for service health checks, readiness probes,
//! monitoring metrics and administration.

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url_features::ExtractorStats;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint - GET /health
///
/// Simple health check to verify the API is running.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: String,
}

/// Readiness check endpoint - GET /ready
///
/// Runs an extraction with an already-cancelled token: no provider is
/// contacted, but URL parsing and all 30 evaluators are exercised.
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let ready = match state
        .extractor
        .extract_with_cancel("http://localhost/", cancel)
        .await
    {
        Ok(vector) => vector.len() == state.extractor.stats().feature_count,
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            false
        }
    };

    Json(ReadinessResponse {
        ready,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Metrics endpoint - GET /metrics
///
/// Returns Prometheus-compatible metrics, or 404 when metrics are disabled.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    if !state.config.observability.enable_metrics {
        return (StatusCode::NOT_FOUND, "metrics disabled\n".to_string());
    }

    let stats = state.extractor.stats();
    (StatusCode::OK, state.metrics.render(&stats))
}

/// Statistics response
#[derive(Serialize)]
pub struct StatsResponse {
    pub version: String,
    pub extractor_stats: ExtractorStats,
    pub extractions_served: u64,
    pub timestamp: String,
}

/// Statistics endpoint - GET /admin/stats
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        extractor_stats: state.extractor.stats(),
        extractions_served: state.metrics.extractions(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Cache response
#[derive(Serialize)]
pub struct CacheResponse {
    pub message: String,
    pub timestamp: String,
}

/// Cache clearing endpoint - POST /admin/cache/clear
///
/// Clears the DNS cache behind the DNS_Record feature.
pub async fn clear_cache_handler(State(state): State<Arc<AppState>>) -> Json<CacheResponse> {
    state.extractor.clear_dns_cache();

    info!("DNS cache cleared by admin request");

    Json(CacheResponse {
        message: "DNS cache cleared successfully".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
