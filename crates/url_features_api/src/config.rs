//! Configuration management for the URL features API
//!
//! Configuration is layered with figment: built-in defaults, then an
//! optional `Config.toml`, then `URL_FEATURES_*` environment variables
//! (nested keys separated by `__`, e.g. `URL_FEATURES_SERVER__PORT`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url_features::{reputation::StaticScores, ExtractorConfig, FeatureError, Score};

/// Prefix of every environment variable read into the configuration
pub const ENV_PREFIX: &str = "URL_FEATURES_";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub extractor: ExtractorSettings,
    pub observability: ObservabilityConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Load configuration from defaults, `Config.toml` and the environment
    pub fn load() -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if Path::new("Config.toml").exists() {
            figment = figment.merge(Toml::file("Config.toml"));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract()
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Budget of one extraction request; providers still outstanding when
    /// it expires are cancelled and the vector is built from what resolved
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 10,
        }
    }
}

/// Feature extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    pub page_timeout_ms: u64,
    pub redirect_timeout_ms: u64,
    pub whois_timeout_ms: u64,
    /// DNS resolver timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts
    pub dns_attempts: usize,
    /// DNS cache size (number of entries)
    pub dns_cache_size: usize,
    /// Minimum TTL for positive DNS cache entries in seconds
    pub dns_min_ttl_secs: u64,
    pub index_timeout_ms: u64,
    /// Query the search engine for the Google_Index feature
    pub enable_index_lookup: bool,
    pub max_redirects: usize,
    pub max_page_bytes: usize,
    /// Overrides the default `url-features/<version>` user agent
    pub user_agent: Option<String>,
    pub whois_bootstrap_server: String,
    /// Fixed score for web_traffic (-1, 0 or 1)
    pub web_traffic_score: i8,
    /// Fixed score for Page_Rank (-1, 0 or 1)
    pub page_rank_score: i8,
    /// Fixed score for Statistical_report (-1, 0 or 1)
    pub statistical_report_score: i8,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        let core = ExtractorConfig::default();
        Self {
            page_timeout_ms: core.page_timeout_ms,
            redirect_timeout_ms: core.redirect_timeout_ms,
            whois_timeout_ms: core.whois_timeout_ms,
            dns_timeout_ms: core.dns_timeout_ms,
            dns_attempts: core.dns_attempts,
            dns_cache_size: core.dns_cache_size,
            dns_min_ttl_secs: core.dns_min_ttl_secs,
            index_timeout_ms: core.index_timeout_ms,
            enable_index_lookup: core.enable_index_lookup,
            max_redirects: core.max_redirects,
            max_page_bytes: core.max_page_bytes,
            user_agent: None,
            whois_bootstrap_server: core.whois_bootstrap_server,
            web_traffic_score: core.reputation.web_traffic.value(),
            page_rank_score: core.reputation.page_rank.value(),
            statistical_report_score: core.reputation.statistical_report.value(),
        }
    }
}

impl ExtractorSettings {
    /// Build the core extractor configuration
    ///
    /// # Returns
    /// * `Err(FeatureError::ConfigurationError)` if a fixed score is not -1, 0 or 1
    pub fn to_extractor_config(
        &self,
        fingerprint_salt: Option<String>,
    ) -> Result<ExtractorConfig, FeatureError> {
        let defaults = ExtractorConfig::default();

        Ok(ExtractorConfig {
            page_timeout_ms: self.page_timeout_ms,
            redirect_timeout_ms: self.redirect_timeout_ms,
            whois_timeout_ms: self.whois_timeout_ms,
            dns_timeout_ms: self.dns_timeout_ms,
            dns_attempts: self.dns_attempts,
            dns_cache_size: self.dns_cache_size,
            dns_min_ttl_secs: self.dns_min_ttl_secs,
            index_timeout_ms: self.index_timeout_ms,
            enable_index_lookup: self.enable_index_lookup,
            max_redirects: self.max_redirects,
            max_page_bytes: self.max_page_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            whois_bootstrap_server: self.whois_bootstrap_server.clone(),
            reputation: StaticScores {
                web_traffic: score("web_traffic_score", self.web_traffic_score)?,
                page_rank: score("page_rank_score", self.page_rank_score)?,
                statistical_report: score(
                    "statistical_report_score",
                    self.statistical_report_score,
                )?,
            },
            fingerprint_salt,
        })
    }
}

fn score(key: &str, value: i8) -> Result<Score, FeatureError> {
    Score::from_value(value).ok_or_else(|| {
        FeatureError::ConfigurationError(format!("{key} must be -1, 0 or 1, got {value}"))
    })
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable JSON structured logging
    pub json_logs: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Serve Prometheus metrics on /metrics
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            log_level: "info".to_string(),
            enable_metrics: true,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes
    pub max_body_size_bytes: usize,
    /// Longest URL accepted for extraction
    pub max_url_length: usize,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed CORS origins (empty = allow all)
    pub cors_origins: Vec<String>,
    /// Salt for URL fingerprints; random per process when unset
    pub privacy_salt: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size_bytes: 8 * 1024,
            max_url_length: 2048,
            enable_cors: true,
            cors_origins: Vec::new(),
            privacy_salt: None,
        }
    }
}
