//! URL Phishing Feature API Server
//!
//! Serves the 30-column phishing feature vector of a URL over HTTP, built
//! with axum and tokio.

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url_features::FeatureExtractor;

mod api_handler;
mod config;
mod metrics;
mod middleware;
mod routes;

use config::AppConfig;
use metrics::ExtractionMetrics;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<FeatureExtractor>,
    pub config: Arc<AppConfig>,
    pub metrics: Arc<ExtractionMetrics>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config)?;

    info!("Starting URL Feature API v{}", env!("CARGO_PKG_VERSION"));

    let extractor_config = config
        .extractor
        .to_extractor_config(config.security.privacy_salt.clone())?;
    if extractor_config.fingerprint_salt.is_none() {
        warn!("No privacy salt configured; fingerprints will not be stable across restarts");
    }

    let extractor =
        FeatureExtractor::new(extractor_config).context("Failed to initialize feature extractor")?;

    let stats = extractor.stats();
    info!(
        "Extractor initialized - {} features, {} shortener entries, index lookup: {}",
        stats.feature_count, stats.shortener_entries, stats.index_lookup_enabled
    );

    let app_state = AppState {
        extractor: Arc::new(extractor),
        config: Arc::new(config.clone()),
        metrics: Arc::new(ExtractionMetrics::new()),
    };

    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);
    info!("Feature API: http://{}/v1/features?url=", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let max_body = state.config.security.max_body_size_bytes;
    let cors = cors_layer(&state.config);

    let mut router = routes::build_routes(Arc::new(state))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    router.layer(CompressionLayer::new())
}

/// CORS for GET and POST; an empty origin list allows any origin
fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }

    let origins = &config.security.cors_origins;
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    )
}

/// Initialize tracing and logging
///
/// `RUST_LOG` wins over the configured `log_level`.
fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.observability.log_level))
        .context("Invalid log level")?;

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            extractor: Arc::new(
                FeatureExtractor::new(url_features::ExtractorConfig {
                    enable_index_lookup: false,
                    ..Default::default()
                })
                .unwrap(),
            ),
            config: Arc::new(AppConfig::default()),
            metrics: Arc::new(ExtractionMetrics::new()),
        }
    }

    #[tokio::test]
    async fn test_router_applies_security_headers() {
        let response = create_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(
            response.headers().get("x-api-version").unwrap(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_cors_layer() {
        let mut config = AppConfig::default();
        assert!(cors_layer(&config).is_some());

        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(cors_layer(&config).is_some());

        config.security.enable_cors = false;
        assert!(cors_layer(&config).is_none());
    }
}
