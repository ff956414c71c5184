//! HTTP transport shared by the page fetcher, the redirect tracer and the
//! search-index probe
//!
//! Redirects are followed by hand so every hop is counted explicitly.
//! Certificate validation is disabled for page and redirect requests:
//! phishing sites frequently serve broken or self-signed certificates and
//! their content must still be inspected.

use crate::page::PageContent;
use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client, Response};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Number of redirect hops observed while following a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectTrace {
    pub hops: usize,
}

/// HTTP prober built on a permissive reqwest client
pub struct HttpProber {
    client: Client,
    search_client: Client,
    max_redirects: usize,
    max_page_bytes: usize,
}

impl HttpProber {
    /// # Arguments
    /// * `request_timeout_ms` - Per-request budget enforced by the client
    /// * `max_redirects` - Hops followed before giving up
    /// * `max_page_bytes` - Response bodies are truncated to this size
    /// * `user_agent` - Value of the User-Agent header
    pub fn new(
        request_timeout_ms: u64,
        max_redirects: usize,
        max_page_bytes: usize,
        user_agent: &str,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .user_agent(user_agent)
            .default_headers(headers.clone())
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .build()
            .context("Failed to create HTTP client")?;

        let search_client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create search HTTP client")?;

        info!(
            "HTTP prober initialized - timeout: {}ms, max_redirects: {}",
            request_timeout_ms, max_redirects
        );

        Ok(Self {
            client,
            search_client,
            max_redirects,
            max_page_bytes,
        })
    }

    /// GET `url`, following redirects, and return the final response with the hop count
    async fn follow(&self, url: &str) -> Result<(Response, usize)> {
        let mut current = Url::parse(url).context("Invalid request URL")?;
        let mut hops = 0;

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .with_context(|| format!("GET {current} failed"))?;

            if !response.status().is_redirection() {
                return Ok((response, hops));
            }

            let Some(location) = response.headers().get(header::LOCATION) else {
                return Ok((response, hops));
            };
            let location = location.to_str().context("Non-ASCII Location header")?;
            let next = current
                .join(location)
                .with_context(|| format!("Invalid redirect target '{location}'"))?;

            hops += 1;
            if hops > self.max_redirects {
                return Err(anyhow!("Exceeded {} redirects", self.max_redirects));
            }

            debug!("Redirect {} -> {} ({})", current, next, response.status());
            current = next;
        }
    }

    /// Fetch a page and parse it into its digest
    ///
    /// Any final response body is parsed, including error pages, since their
    /// markup is as telling as a normal page.
    pub async fn fetch_page(&self, url: &str) -> Result<PageContent> {
        let (mut response, hops) = self.follow(url).await?;
        let status = response.status();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.context("Failed to read response body")? {
            let room = self.max_page_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= self.max_page_bytes {
                debug!("Truncated body of {} at {} bytes", url, self.max_page_bytes);
                break;
            }
        }

        debug!("Fetched {} ({}, {} hops, {} bytes)", url, status, hops, body.len());

        tokio::task::spawn_blocking(move || PageContent::parse(&body))
            .await
            .context("HTML parsing task failed")
    }

    /// Count the redirect hops taken to reach the final page
    pub async fn trace_redirects(&self, url: &str) -> Result<RedirectTrace> {
        let (response, hops) = self.follow(url).await?;
        debug!("Traced {} with {} hops, final status {}", url, hops, response.status());
        Ok(RedirectTrace { hops })
    }

    /// Whether a `site:` search for the domain mentions it in the response
    ///
    /// Depends on live search-engine markup and rate limits; a blocked or
    /// changed response simply reads as "not indexed".
    pub async fn search_index_contains(&self, domain: &str) -> Result<bool> {
        let mut search = Url::parse("https://www.google.com/search")?;
        search.query_pairs_mut().append_pair("q", &format!("site:{domain}"));

        let body = self
            .search_client
            .get(search)
            .send()
            .await
            .context("Search request failed")?
            .text()
            .await
            .context("Failed to read search response")?;

        Ok(body.contains(domain))
    }
}
