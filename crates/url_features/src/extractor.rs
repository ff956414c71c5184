//! Feature extraction orchestrating providers and evaluators
//!
//! A URL is parsed and normalized, every network provider is queried
//! concurrently under its own time budget, and all evaluators then run
//! against whatever context came back. Only a malformed URL fails an
//! extraction.

use crate::evaluators::{self, ExtractionContext};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::http::RedirectTrace;
use crate::page::PageContent;
use crate::privacy::{redact_url, PrivacyProcessor};
use crate::providers::Providers;
use crate::shortener::ShortenerList;
use crate::url::{self as url_parser, Domain, ParsedUrl};
use crate::whois::WhoisRecord;
use crate::{ExtractorConfig, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// How a provider call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Ok,
    Failed,
    TimedOut,
    Cancelled,
    Disabled,
}

/// Per-provider outcome of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderReport {
    pub page: ProviderStatus,
    pub whois: ProviderStatus,
    pub dns: ProviderStatus,
    pub redirects: ProviderStatus,
    pub index: ProviderStatus,
}

/// Feature vector plus the audit details of how it was produced
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub features: FeatureVector,
    /// Input URL without userinfo, query or fragment
    pub url: String,
    /// Salted SHA-256 of the input URL
    pub fingerprint: String,
    pub domain: String,
    pub providers: ProviderReport,
    pub page_bytes: Option<usize>,
    pub redirect_hops: Option<usize>,
    pub elapsed_ms: u64,
    pub checked_at: DateTime<Utc>,
}

/// Static facts about an extractor
#[derive(Debug, Clone, Serialize)]
pub struct ExtractorStats {
    pub feature_count: usize,
    pub shortener_entries: usize,
    pub index_lookup_enabled: bool,
}

/// Provider answers gathered for one extraction
struct Resolved {
    page: Option<PageContent>,
    whois: Option<WhoisRecord>,
    dns_resolves: Option<bool>,
    redirects: Option<RedirectTrace>,
    indexed: Option<bool>,
    report: ProviderReport,
}

/// Turns URLs into feature vectors
pub struct FeatureExtractor {
    config: ExtractorConfig,
    providers: Providers,
    shorteners: ShortenerList,
    privacy: PrivacyProcessor,
}

impl FeatureExtractor {
    /// Create an extractor wired to the live network providers
    ///
    /// # Returns
    /// * `Ok(FeatureExtractor)` on success
    /// * `Err(FeatureError::InternalError)` if a provider cannot be built
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        info!("Initializing feature extractor");
        let providers = Providers::from_config(&config)?;
        Self::with_providers(config, providers)
    }

    /// Create an extractor drawing on the given providers
    pub fn with_providers(config: ExtractorConfig, providers: Providers) -> Result<Self> {
        let shorteners =
            ShortenerList::bundled().context("Failed to initialize shortener list")?;

        let privacy = match &config.fingerprint_salt {
            Some(salt) => PrivacyProcessor::new(salt.as_bytes().to_vec()),
            None => PrivacyProcessor::with_random_salt(),
        };

        info!(
            "Feature extractor initialized - {} shortener entries, index lookup: {}",
            shorteners.entry_count(),
            providers.index.is_some()
        );

        Ok(Self {
            config,
            providers,
            shorteners,
            privacy,
        })
    }

    /// Replace the shortener denylist
    pub fn with_shorteners(mut self, shorteners: ShortenerList) -> Self {
        self.shorteners = shorteners;
        self
    }

    /// Extract the feature vector of a URL
    ///
    /// # Returns
    /// * `Ok(FeatureVector)` with all 30 features, whatever the network did
    /// * `Err(FeatureError::MalformedUrl)` if the URL has no scheme or host
    pub async fn extract(&self, raw_url: &str) -> Result<FeatureVector> {
        self.extract_with_cancel(raw_url, CancellationToken::new())
            .await
    }

    /// Extract, abandoning outstanding provider calls once `cancel` fires
    ///
    /// Cancellation never fails the extraction: evaluators run on whatever
    /// context had resolved.
    pub async fn extract_with_cancel(
        &self,
        raw_url: &str,
        cancel: CancellationToken,
    ) -> Result<FeatureVector> {
        Ok(self.extract_report(raw_url, cancel).await?.features)
    }

    /// Extract and describe how each provider fared
    #[instrument(skip(self, raw_url, cancel), fields(url = %redact_url(raw_url)))]
    pub async fn extract_report(
        &self,
        raw_url: &str,
        cancel: CancellationToken,
    ) -> Result<ExtractionReport> {
        let started = Instant::now();

        let url = url_parser::parse(raw_url)?;
        let domain = url_parser::normalize_domain(&url);
        debug!("Normalized domain: {}", domain);

        let resolved = self.resolve(&url, &domain, &cancel).await;
        let reputation = self.providers.reputation.signals(&domain);
        let page_bytes = resolved.page.as_ref().map(|page| page.byte_count);
        let redirect_hops = resolved.redirects.map(|trace| trace.hops);
        let domain_name = domain.to_string();

        let ctx = ExtractionContext {
            url,
            domain,
            shorteners: &self.shorteners,
            page: resolved.page,
            whois: resolved.whois,
            redirects: resolved.redirects,
            dns_resolves: resolved.dns_resolves,
            indexed: resolved.indexed,
            reputation,
            now: Utc::now(),
        };
        let features = evaluators::evaluate(&ctx);

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!("Extracted {} features in {}ms", features.len(), elapsed_ms);

        Ok(ExtractionReport {
            features,
            url: self.privacy.redact(raw_url),
            fingerprint: self.privacy.fingerprint(raw_url),
            domain: domain_name,
            providers: resolved.report,
            page_bytes,
            redirect_hops,
            elapsed_ms,
            checked_at: Utc::now(),
        })
    }

    /// Query every provider concurrently; each is bounded independently
    async fn resolve(&self, url: &ParsedUrl, domain: &Domain, cancel: &CancellationToken) -> Resolved {
        let raw = url.raw();
        let host = domain.as_str();
        let config = &self.config;

        let index = async {
            match &self.providers.index {
                Some(index) => {
                    bounded("index", config.index_timeout_ms, cancel, index.is_indexed(host)).await
                }
                None => (None, ProviderStatus::Disabled),
            }
        };

        let (page, whois, dns, redirects, indexed) = tokio::join!(
            bounded("page", config.page_timeout_ms, cancel, self.providers.page.fetch(raw)),
            bounded("whois", config.whois_timeout_ms, cancel, self.providers.whois.lookup(host)),
            bounded("dns", config.dns_timeout_ms, cancel, self.providers.dns.resolves(host)),
            bounded(
                "redirect",
                config.redirect_timeout_ms,
                cancel,
                self.providers.redirects.trace(raw)
            ),
            index,
        );

        Resolved {
            report: ProviderReport {
                page: page.1,
                whois: whois.1,
                dns: dns.1,
                redirects: redirects.1,
                index: indexed.1,
            },
            page: page.0,
            whois: whois.0,
            dns_resolves: dns.0,
            redirects: redirects.0,
            indexed: indexed.0,
        }
    }

    /// Get extractor statistics
    pub fn stats(&self) -> ExtractorStats {
        ExtractorStats {
            feature_count: FEATURE_COUNT,
            shortener_entries: self.shorteners.entry_count(),
            index_lookup_enabled: self.providers.index.is_some(),
        }
    }

    /// Clear the DNS cache (for testing or administrative purposes)
    pub fn clear_dns_cache(&self) {
        self.providers.dns.clear_cache();
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }
}

/// Run a provider call under a timeout, racing the cancellation token
///
/// Errors are absorbed into `None`; they never reach the caller.
async fn bounded<T>(
    name: &'static str,
    timeout_ms: u64,
    cancel: &CancellationToken,
    call: impl Future<Output = anyhow::Result<T>>,
) -> (Option<T>, ProviderStatus) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("{} provider cancelled", name);
            (None, ProviderStatus::Cancelled)
        }
        outcome = tokio::time::timeout(Duration::from_millis(timeout_ms), call) => match outcome {
            Ok(Ok(value)) => (Some(value), ProviderStatus::Ok),
            Ok(Err(e)) => {
                debug!("{} provider unavailable: {:#}", name, e);
                (None, ProviderStatus::Failed)
            }
            Err(_) => {
                warn!("{} provider timed out after {}ms", name, timeout_ms);
                (None, ProviderStatus::TimedOut)
            }
        }
    }
}
