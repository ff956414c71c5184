//! # url_features
//!
//! Heuristic feature extraction for phishing URL detection. A single URL is
//! turned into a fixed 30-column vector of ternary scores (-1 suspicious,
//! 0 ambiguous, 1 benign) that a downstream classifier consumes.
//!
//! ## Features
//!
//! - **Lexical signals** computed from the URL string alone
//! - **Content signals** from the fetched HTML document (TLS validation disabled)
//! - **WHOIS and DNS signals** via a port-43 client and hickory-resolver
//! - **Redirect tracing** with explicit hop counting
//! - **Soft failure**: every provider is time-boxed and every evaluator has a
//!   documented fallback, so only a malformed URL aborts an extraction
//!
//! ## Example
//!
//! ```rust,no_run
//! use url_features::{ExtractorConfig, FeatureExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = FeatureExtractor::new(ExtractorConfig::default())?;
//!
//!     let vector = extractor.extract("https://www.example.com/login").await?;
//!     for (name, score) in vector.iter_named() {
//!         println!("{name}: {score}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod dns;
pub mod evaluators;
pub mod extractor;
pub mod features;
pub mod http;
pub mod page;
pub mod privacy;
pub mod providers;
pub mod reputation;
pub mod shortener;
pub mod url;
pub mod whois;

use thiserror::Error;

/// Configuration for the feature extractor and its network providers
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Page fetch budget in milliseconds
    pub page_timeout_ms: u64,
    /// Redirect trace budget in milliseconds
    pub redirect_timeout_ms: u64,
    /// WHOIS lookup budget in milliseconds (covers every referral hop)
    pub whois_timeout_ms: u64,
    /// DNS resolver timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts
    pub dns_attempts: usize,
    /// DNS cache size (number of entries)
    pub dns_cache_size: usize,
    /// Minimum TTL for positive DNS cache entries
    pub dns_min_ttl_secs: u64,
    /// Search index lookup budget in milliseconds
    pub index_timeout_ms: u64,
    /// Issue the live search-engine query for the Google_Index signal
    pub enable_index_lookup: bool,
    /// Redirects followed before a trace is abandoned
    pub max_redirects: usize,
    /// Response bodies are truncated to this many bytes before parsing
    pub max_page_bytes: usize,
    /// User agent sent with every HTTP request
    pub user_agent: String,
    /// Server asked for the registry of a TLD
    pub whois_bootstrap_server: String,
    /// Fixed scores served by the built-in reputation source
    pub reputation: reputation::StaticScores,
    /// Salt for report fingerprints; a random per-process salt when unset
    pub fingerprint_salt: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            page_timeout_ms: 5_000,
            redirect_timeout_ms: 5_000,
            whois_timeout_ms: 5_000,
            dns_timeout_ms: 2_000,
            dns_attempts: 2,
            dns_cache_size: 10_000,
            dns_min_ttl_secs: 60,
            index_timeout_ms: 5_000,
            enable_index_lookup: true,
            max_redirects: 30,
            max_page_bytes: 5 * 1024 * 1024,
            user_agent: format!("url-features/{}", env!("CARGO_PKG_VERSION")),
            whois_bootstrap_server: "whois.iana.org".to_string(),
            reputation: reputation::StaticScores::default(),
            fingerprint_salt: None,
        }
    }
}

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;

// Re-export main types
pub use extractor::{ExtractionReport, ExtractorStats, FeatureExtractor, ProviderReport, ProviderStatus};
pub use features::{Feature, FeatureVector, Score};
pub use providers::Providers;
