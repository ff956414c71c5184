//! Reputation signals without a live backing source
//!
//! Traffic rank, page rank and blacklist membership have no data provider
//! wired in. They are served by a [`ReputationProvider`]; the built-in
//! [`StaticScores`] answers with fixed, configurable values.

use crate::features::Score;
use crate::url::Domain;

/// Scores for the reputation-backed features; `None` means "unknown"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReputationSignals {
    pub web_traffic: Option<Score>,
    pub page_rank: Option<Score>,
    pub statistical_report: Option<Score>,
}

/// Source of reputation scores for a domain
///
/// Implementations must not block; anything needing I/O should resolve its
/// data ahead of time.
pub trait ReputationProvider: Send + Sync {
    fn signals(&self, domain: &Domain) -> ReputationSignals;
}

/// Fixed scores, neutral by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticScores {
    pub web_traffic: Score,
    pub page_rank: Score,
    pub statistical_report: Score,
}

impl Default for StaticScores {
    fn default() -> Self {
        Self {
            web_traffic: Score::Benign,
            page_rank: Score::Benign,
            statistical_report: Score::Benign,
        }
    }
}

impl ReputationProvider for StaticScores {
    fn signals(&self, _domain: &Domain) -> ReputationSignals {
        ReputationSignals {
            web_traffic: Some(self.web_traffic),
            page_rank: Some(self.page_rank),
            statistical_report: Some(self.statistical_report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::{normalize_domain, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_static_scores_are_neutral_by_default() {
        let domain = normalize_domain(&parse("https://example.com").unwrap());
        let signals = StaticScores::default().signals(&domain);

        assert_eq!(signals.web_traffic, Some(Score::Benign));
        assert_eq!(signals.page_rank, Some(Score::Benign));
        assert_eq!(signals.statistical_report, Some(Score::Benign));
    }

    #[test]
    fn test_static_scores_are_configurable() {
        let domain = normalize_domain(&parse("https://example.com").unwrap());
        let scores = StaticScores {
            page_rank: Score::Suspicious,
            ..StaticScores::default()
        };

        assert_eq!(scores.signals(&domain).page_rank, Some(Score::Suspicious));
    }
}
