//! DNS resolution using hickory-resolver
//!
//! Only reachability matters for the DNSRecord signal: a domain that yields
//! at least one A or AAAA record resolves, anything else does not.

use anyhow::Result;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    AsyncResolver, TokioAsyncResolver,
};
use std::time::Duration;
use tracing::{debug, info};

/// DNS resolver wrapper with cached, bounded lookups
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Create a new DNS resolver
    ///
    /// # Arguments
    /// * `timeout_ms` - DNS query timeout in milliseconds
    /// * `attempts` - Maximum number of retry attempts
    /// * `cache_size` - Number of entries to cache
    /// * `min_ttl_secs` - Minimum TTL for positive cache entries
    pub fn new(
        timeout_ms: u64,
        attempts: usize,
        cache_size: usize,
        min_ttl_secs: u64,
    ) -> Result<Self> {
        info!("Initializing DNS resolver with Cloudflare DNS");

        let config = ResolverConfig::cloudflare();

        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(timeout_ms);
        opts.attempts = attempts;
        opts.cache_size = cache_size;
        opts.positive_min_ttl = Some(Duration::from_secs(min_ttl_secs));
        opts.negative_min_ttl = Some(Duration::from_secs(30));
        opts.positive_max_ttl = Some(Duration::from_secs(3600));

        let resolver = AsyncResolver::tokio(config, opts);

        info!(
            "DNS resolver initialized - timeout: {}ms, attempts: {}, cache_size: {}",
            timeout_ms, attempts, cache_size
        );

        Ok(Self { resolver })
    }

    /// Check whether a host resolves to at least one address
    ///
    /// # Returns
    /// * `Ok(true)` if the host has A or AAAA records
    /// * `Ok(false)` if the lookup answered without any address
    /// * `Err(_)` on resolution errors (NXDOMAIN, timeouts, no upstream)
    pub async fn resolves(&self, host: &str) -> Result<bool> {
        debug!("Resolving host: {}", host);

        let response = self.resolver.lookup_ip(host).await?;
        let count = response.iter().count();

        debug!("Host {} resolved to {} address(es)", host, count);
        Ok(count > 0)
    }

    /// Clear the DNS cache (for testing or administrative purposes)
    pub fn clear_cache(&self) {
        self.resolver.clear_cache();
        info!("DNS cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dns_resolver_creation() {
        let resolver = DnsResolver::new(1000, 2, 1000, 60);
        assert!(resolver.is_ok());
    }

    #[tokio::test]
    async fn test_ip_literal_resolves_without_network() {
        let resolver = DnsResolver::new(1000, 2, 1000, 60).unwrap();
        assert!(resolver.resolves("127.0.0.1").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_lookup() {
        let resolver = DnsResolver::new(1000, 2, 1000, 60).unwrap();

        assert!(resolver.resolves("google.com").await.unwrap());
        assert!(resolver
            .resolves("this-domain-definitely-does-not-exist-12345.com")
            .await
            .is_err());
    }
}
