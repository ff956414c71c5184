//! URL decomposition and domain normalization
//!
//! Parsing is delegated to the `url` crate when it accepts the string. Host
//! and port are always read from the authority exactly as the caller typed
//! it: no case folding, no IDN conversion, no trailing-dot removal. When the
//! `url` crate rejects a string that still has a scheme and a host (a bad
//! port, a space or `%00` in the host), the parts are cut from the raw string
//! instead, so the extraction goes ahead.

use crate::{FeatureError, Result};
use std::fmt;
use tracing::debug;
use url::Url;

/// An immutable, decomposed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    raw: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl ParsedUrl {
    /// The original string, untouched
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host as written in the raw URL, without userinfo or port
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port as written in the authority; `None` when absent or not a valid port number
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalized host used for every "is this on the same site" comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `host` is this domain or one of its subdomains
    pub fn covers(&self, host: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }
        host == self.0
            || host
                .strip_suffix(self.0.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decompose a raw URL string
///
/// # Returns
/// * `Ok(ParsedUrl)` when a scheme and a host can be identified
/// * `Err(FeatureError::MalformedUrl)` otherwise; this is the only fatal
///   condition of an extraction
pub fn parse(raw: &str) -> Result<ParsedUrl> {
    if raw.trim().is_empty() {
        return Err(FeatureError::MalformedUrl("URL is empty".to_string()));
    }

    let url = match Url::parse(raw) {
        Ok(parsed) => {
            let host = match raw_host(raw) {
                Some(host) => host.to_string(),
                None => parsed.host_str().unwrap_or_default().to_string(),
            };
            ParsedUrl {
                raw: raw.to_string(),
                scheme: parsed.scheme().to_string(),
                host,
                port: raw_port(raw),
                path: parsed.path().to_string(),
                query: parsed.query().map(str::to_string),
            }
        }
        Err(e) => {
            debug!("url crate rejected input ({}), splitting raw string", e);
            split_raw(raw).ok_or_else(|| FeatureError::MalformedUrl(format!("{raw}: {e}")))?
        }
    };

    if url.host.is_empty() {
        return Err(FeatureError::MalformedUrl(format!("{raw}: no host")));
    }

    debug!("Parsed URL with scheme '{}' and host '{}'", url.scheme, url.host);
    Ok(url)
}

/// Strip a single leading "www." (case-sensitive)
pub fn normalize_domain(url: &ParsedUrl) -> Domain {
    let host = url.host();
    Domain(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// `scheme://` prefix followed by the authority, as written
fn split_authority(raw: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = raw.split_once("://")?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    Some((scheme, authority, tail))
}

/// `host[:port]` with any userinfo removed
fn host_and_port(authority: &str) -> (&str, Option<&str>) {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    if host_port.starts_with('[') {
        // IPv6 literal keeps its brackets
        return match host_port.find(']') {
            Some(end) => {
                let port = host_port[end + 1..].strip_prefix(':');
                (&host_port[..=end], port)
            }
            None => (host_port, None),
        };
    }

    match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => (host, Some(port)),
        _ => (host_port, None),
    }
}

/// Host portion of the authority exactly as written
fn raw_host(raw: &str) -> Option<&str> {
    let (_, authority, _) = split_authority(raw)?;
    Some(host_and_port(authority).0)
}

/// Port written in the authority, even when it is the scheme default
fn raw_port(raw: &str) -> Option<u16> {
    let (_, authority, _) = split_authority(raw)?;
    host_and_port(authority).1?.parse().ok()
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Decompose a string the `url` crate refused, when scheme and host are present
fn split_raw(raw: &str) -> Option<ParsedUrl> {
    let (scheme, authority, tail) = split_authority(raw)?;
    if !is_valid_scheme(scheme) {
        return None;
    }

    let (host, port) = host_and_port(authority);
    if host.is_empty() {
        return None;
    }

    let tail = tail.split_once('#').map_or(tail, |(before, _)| before);
    let (path, query) = match tail.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (tail, None),
    };

    Some(ParsedUrl {
        raw: raw.to_string(),
        scheme: scheme.to_ascii_lowercase(),
        host: host.to_string(),
        port: port.and_then(|port| port.parse().ok()),
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        query,
    })
}
