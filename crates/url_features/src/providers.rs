//! Network lookup providers
//!
//! Every provider sits behind a trait so the extractor can be driven by
//! doubles in tests. Providers report failure through `anyhow::Result`; the
//! extractor turns any error into "no data".

use crate::dns::DnsResolver;
use crate::http::{HttpProber, RedirectTrace};
use crate::page::PageContent;
use crate::reputation::ReputationProvider;
use crate::whois::{WhoisClient, WhoisRecord};
use crate::ExtractorConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Retrieves and digests the page behind a URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContent>;
}

/// Retrieves the registration record of a domain
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<WhoisRecord>;
}

/// Answers whether a host resolves to any address
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolves(&self, host: &str) -> Result<bool>;

    /// Drop any cached answers
    fn clear_cache(&self) {}
}

/// Follows a URL's redirects and counts the hops
#[async_trait]
pub trait RedirectTracer: Send + Sync {
    async fn trace(&self, url: &str) -> Result<RedirectTrace>;
}

/// Answers whether a search engine has indexed a domain
#[async_trait]
pub trait IndexLookup: Send + Sync {
    async fn is_indexed(&self, domain: &str) -> Result<bool>;
}

/// The set of providers an extraction draws on
#[derive(Clone)]
pub struct Providers {
    pub page: Arc<dyn PageFetcher>,
    pub whois: Arc<dyn WhoisLookup>,
    pub dns: Arc<dyn HostResolver>,
    pub redirects: Arc<dyn RedirectTracer>,
    /// `None` disables the search-index query
    pub index: Option<Arc<dyn IndexLookup>>,
    pub reputation: Arc<dyn ReputationProvider>,
}

impl Providers {
    /// Wire the live network providers described by `config`
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let request_timeout_ms = config
            .page_timeout_ms
            .max(config.redirect_timeout_ms)
            .max(config.index_timeout_ms);

        let prober = Arc::new(
            HttpProber::new(
                request_timeout_ms,
                config.max_redirects,
                config.max_page_bytes,
                &config.user_agent,
            )
            .context("Failed to initialize HTTP prober")?,
        );

        let dns = DnsResolver::new(
            config.dns_timeout_ms,
            config.dns_attempts,
            config.dns_cache_size,
            config.dns_min_ttl_secs,
        )
        .context("Failed to initialize DNS resolver")?;

        let whois = WhoisClient::new(config.whois_bootstrap_server.clone(), config.whois_timeout_ms);

        let index: Option<Arc<dyn IndexLookup>> = if config.enable_index_lookup {
            Some(prober.clone())
        } else {
            None
        };

        Ok(Self {
            page: prober.clone(),
            whois: Arc::new(whois),
            dns: Arc::new(dns),
            redirects: prober,
            index,
            reputation: Arc::new(config.reputation),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpProber {
    async fn fetch(&self, url: &str) -> Result<PageContent> {
        self.fetch_page(url).await
    }
}

#[async_trait]
impl RedirectTracer for HttpProber {
    async fn trace(&self, url: &str) -> Result<RedirectTrace> {
        self.trace_redirects(url).await
    }
}

#[async_trait]
impl IndexLookup for HttpProber {
    async fn is_indexed(&self, domain: &str) -> Result<bool> {
        self.search_index_contains(domain).await
    }
}

#[async_trait]
impl WhoisLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<WhoisRecord> {
        WhoisClient::lookup(self, domain).await
    }
}

#[async_trait]
impl HostResolver for DnsResolver {
    async fn resolves(&self, host: &str) -> Result<bool> {
        DnsResolver::resolves(self, host).await
    }

    fn clear_cache(&self) {
        DnsResolver::clear_cache(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config() {
        let providers = Providers::from_config(&ExtractorConfig::default()).unwrap();
        assert!(providers.index.is_some());

        let config = ExtractorConfig {
            enable_index_lookup: false,
            ..ExtractorConfig::default()
        };
        let providers = Providers::from_config(&config).unwrap();
        assert!(providers.index.is_none());
    }
}
