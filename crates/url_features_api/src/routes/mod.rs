//! API Routes Module
//!
//! This module organizes all HTTP endpoints into logical groups:
//! - `features`: feature vector extraction for a single URL
//! - `health`: health checks, monitoring and administration

pub mod features;
pub mod health;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build all API routes and return a configured Router
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Extraction endpoints
        .route(
            "/v1/features",
            get(features::features_query_handler).post(features::features_body_handler),
        )
        // Health and monitoring endpoints
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .route("/metrics", get(health::metrics_handler))
        // Administrative endpoints
        .route("/admin/stats", get(health::stats_handler))
        .route("/admin/cache/clear", post(health::clear_cache_handler))
        .with_state(state)
}
