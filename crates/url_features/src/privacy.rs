//! Privacy utilities for URL handling in logs and reports
//!
//! Submitted URLs can carry credentials and tracking tokens in their userinfo
//! and query string. Logs only ever see the redacted form, and reports are
//! keyed by a salted SHA-256 fingerprint instead of the raw string.

use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

/// Placeholder logged when a URL cannot be parsed at all
const UNPARSEABLE: &str = "<unparseable>";

/// URL redaction and salted fingerprinting
pub struct PrivacyProcessor {
    salt: Vec<u8>,
}

impl PrivacyProcessor {
    /// Create a processor with a fixed salt
    ///
    /// Fingerprints are only comparable between processors sharing a salt.
    pub fn new(salt: Vec<u8>) -> Self {
        debug!("Privacy processor initialized with {}-byte salt", salt.len());
        Self { salt }
    }

    /// Create a processor with a per-process random salt
    ///
    /// Fingerprints will not be stable across restarts.
    pub fn with_random_salt() -> Self {
        Self::new(Self::generate_new_salt())
    }

    /// Generate a 32-byte salt
    pub fn generate_new_salt() -> Vec<u8> {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hash, Hasher};
        use std::time::SystemTime;

        let state = RandomState::new();
        let mut salt = Vec::with_capacity(32);
        let mut round = 0u64;

        while salt.len() < 32 {
            let mut hasher = state.build_hasher();
            SystemTime::now().hash(&mut hasher);
            std::thread::current().id().hash(&mut hasher);
            round.hash(&mut hasher);
            salt.extend_from_slice(&hasher.finish().to_be_bytes());
            round += 1;
        }

        salt.truncate(32);
        salt
    }

    /// Salted SHA-256 of the raw URL, hex encoded
    pub fn fingerprint(&self, raw_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(raw_url.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// URL with userinfo, query and fragment removed, safe to log
    pub fn redact(&self, raw_url: &str) -> String {
        redact_url(raw_url)
    }

    pub fn get_salt(&self) -> &[u8] {
        &self.salt
    }
}

/// Strip userinfo, query and fragment from a URL
pub fn redact_url(raw_url: &str) -> String {
    let Ok(mut url) = Url::parse(raw_url) else {
        return UNPARSEABLE.to_string();
    };

    if url.has_host() {
        // Both setters only fail for cannot-be-a-base URLs, which have no host
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }
    url.set_query(None);
    url.set_fragment(None);

    url.to_string()
}
