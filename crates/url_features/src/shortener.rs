//! URL shortening service detection
//!
//! The denylist is a plain text file (one entry per line, `#` comments) so
//! it can be swapped without touching evaluator logic. Entries are matched
//! as case-sensitive substrings of the raw URL, so short entries match
//! broadly (`t.co` also matches `microsoft.com`).

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};

/// Bundled denylist of shortening services
pub const DEFAULT_LIST: &str = include_str!("../data/shorteners.txt");

/// Substring matcher over a denylist of shortener domains
#[derive(Debug)]
pub struct ShortenerList {
    matcher: Regex,
    entries: Vec<String>,
}

impl ShortenerList {
    /// Build a matcher from a list of entries
    ///
    /// # Example
    /// ```rust
    /// use url_features::shortener::ShortenerList;
    ///
    /// let list = ShortenerList::new(vec!["bit.ly".to_string(), "tinyurl".to_string()])?;
    /// assert!(list.is_shortened("http://bit.ly/abc"));
    /// assert!(!list.is_shortened("https://example.com"));
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn new(entries: Vec<String>) -> Result<Self> {
        if entries.is_empty() {
            return Err(anyhow::anyhow!("No entries provided for shortener detection"));
        }

        let pattern = entries
            .iter()
            .map(|entry| regex::escape(entry))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&pattern).context("Failed to compile shortener matcher")?;

        info!("Shortener list initialized with {} entries", entries.len());

        Ok(Self { matcher, entries })
    }

    /// Load the list from list-file content
    pub fn from_list_txt(list_content: &str) -> Result<Self> {
        let entries = parse_shortener_list(list_content)?;
        Self::new(entries)
    }

    /// The bundled list
    pub fn bundled() -> Result<Self> {
        Self::from_list_txt(DEFAULT_LIST)
    }

    /// Whether the raw URL mentions any listed service
    pub fn is_shortened(&self, raw_url: &str) -> bool {
        let hit = self.matcher.find(raw_url);
        if let Some(m) = &hit {
            debug!("URL matched shortener entry '{}'", m.as_str());
        }
        hit.is_some()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Parse the list file, keeping first occurrences in file order
fn parse_shortener_list(content: &str) -> Result<Vec<String>> {
    let mut entries: Vec<String> = Vec::new();
    let mut invalid_count = 0;

    for (index, line) in content.lines().enumerate() {
        let entry = line.trim();

        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }

        if entry.chars().any(char::is_whitespace) {
            invalid_count += 1;
            warn!("Invalid shortener entry at line {}: '{}'", index + 1, entry);
            continue;
        }

        if !entries.iter().any(|existing| existing == entry) {
            entries.push(entry.to_string());
        }
    }

    debug!(
        "Parsed {} shortener entries ({} invalid)",
        entries.len(),
        invalid_count
    );

    if entries.is_empty() {
        return Err(anyhow::anyhow!("No valid entries found in shortener list"));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bundled_list_loads() {
        let list = ShortenerList::bundled().unwrap();
        assert!(list.entry_count() > 50);
        assert!(list.is_shortened("http://bit.ly/2abc"));
        assert!(list.is_shortened("https://tinyurl.com/y6x"));
        assert!(list.is_shortened("http://link.zip.net/x"));
        assert!(!list.is_shortened("https://www.wikipedia.org/"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let list = ShortenerList::bundled().unwrap();
        assert!(list.is_shortened("http://BudURL.com/x"));
        assert!(!list.is_shortened("http://BIT.LY/x"));
    }

    #[test]
    fn test_substring_match_is_broad() {
        let list = ShortenerList::bundled().unwrap();
        // "t.co" is a substring of "microsoft.com"
        assert!(list.is_shortened("https://www.microsoft.com/"));
    }

    #[test]
    fn test_entries_are_literal() {
        let list = ShortenerList::new(vec!["x.co".to_string()]).unwrap();
        // "." must not act as a wildcard
        assert!(!list.is_shortened("http://xaco.org/"));
        assert!(list.is_shortened("http://x.co/abc"));
    }

    #[test]
    fn test_parse_shortener_list() {
        let content = r#"
# comment
bit.ly
goo.gl

bit.ly
not valid
"#;
        let entries = parse_shortener_list(content).unwrap();
        assert_eq!(entries, vec!["bit.ly".to_string(), "goo.gl".to_string()]);
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(ShortenerList::from_list_txt("# only comments\n").is_err());
        assert!(ShortenerList::new(Vec::new()).is_err());
    }
}
