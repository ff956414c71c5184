//! Feature evaluators
//!
//! Each feature is scored by a pure function over an [`ExtractionContext`].
//! An evaluator either produces a score or reports why it could not; the
//! registry pairs it with the score used in that case, so the outcome of a
//! failed evaluation never depends on the cause of the failure.

mod content;
mod lexical;
mod network;
mod registration;

use crate::features::{Feature, FeatureVector, Score, FEATURE_COUNT};
use crate::http::RedirectTrace;
use crate::page::PageContent;
use crate::reputation::ReputationSignals;
use crate::shortener::ShortenerList;
use crate::url::{Domain, ParsedUrl};
use crate::whois::WhoisRecord;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Everything an evaluator may look at, resolved before any of them runs
///
/// Network-derived fields are `None` when their provider failed, timed out
/// or was cancelled.
#[derive(Debug, Clone)]
pub struct ExtractionContext<'a> {
    pub url: ParsedUrl,
    pub domain: Domain,
    pub shorteners: &'a ShortenerList,
    pub page: Option<PageContent>,
    pub whois: Option<WhoisRecord>,
    pub redirects: Option<RedirectTrace>,
    pub dns_resolves: Option<bool>,
    pub indexed: Option<bool>,
    pub reputation: ReputationSignals,
    /// Reference instant for age computations
    pub now: DateTime<Utc>,
}

impl<'a> ExtractionContext<'a> {
    /// Context with only the URL-derived parts filled in
    pub fn offline(url: ParsedUrl, domain: Domain, shorteners: &'a ShortenerList) -> Self {
        Self {
            url,
            domain,
            shorteners,
            page: None,
            whois: None,
            redirects: None,
            dns_resolves: None,
            indexed: None,
            reputation: ReputationSignals::default(),
            now: Utc::now(),
        }
    }

    fn page(&self) -> Result<&PageContent, EvalError> {
        self.page.as_ref().ok_or(EvalError::MissingContext("page content"))
    }

    fn whois(&self) -> Result<&WhoisRecord, EvalError> {
        self.whois.as_ref().ok_or(EvalError::MissingContext("WHOIS record"))
    }
}

/// Reasons an evaluator falls back to its default score
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("{0} unavailable")]
    MissingContext(&'static str),
    #[error("field '{0}' missing")]
    MissingField(&'static str),
    #[error("malformed data: {0}")]
    Malformed(String),
}

pub type EvalResult = Result<Score, EvalError>;

pub type EvalFn = fn(&ExtractionContext<'_>) -> EvalResult;

/// A feature's scoring function and the score used when it fails
pub struct Evaluator {
    pub feature: Feature,
    pub eval: EvalFn,
    pub fallback: Score,
}

impl Evaluator {
    const fn new(feature: Feature, eval: EvalFn, fallback: Score) -> Self {
        Self {
            feature,
            eval,
            fallback,
        }
    }

    /// Run the evaluator, substituting the fallback on failure
    pub fn score(&self, ctx: &ExtractionContext<'_>) -> Score {
        match (self.eval)(ctx) {
            Ok(score) => score,
            Err(e) => {
                debug!("{} fell back to {}: {}", self.feature, self.fallback, e);
                self.fallback
            }
        }
    }
}

use Score::{Benign, Suspicious};

/// Every evaluator, in schema order
pub static EVALUATORS: [Evaluator; FEATURE_COUNT] = [
    Evaluator::new(Feature::HavingIpAddress, lexical::having_ip_address, Benign),
    Evaluator::new(Feature::UrlLength, lexical::url_length, Benign),
    Evaluator::new(Feature::ShortiningService, lexical::shortening_service, Benign),
    Evaluator::new(Feature::HavingAtSymbol, lexical::having_at_symbol, Benign),
    Evaluator::new(Feature::DoubleSlashRedirecting, lexical::double_slash_redirecting, Benign),
    Evaluator::new(Feature::PrefixSuffix, lexical::prefix_suffix, Benign),
    Evaluator::new(Feature::HavingSubDomain, lexical::having_sub_domain, Benign),
    Evaluator::new(Feature::SslFinalState, lexical::ssl_final_state, Suspicious),
    Evaluator::new(Feature::DomainRegisterationLength, registration::registration_length, Suspicious),
    Evaluator::new(Feature::Favicon, content::favicon, Benign),
    Evaluator::new(Feature::Port, lexical::port, Benign),
    Evaluator::new(Feature::HttpsToken, lexical::https_token, Benign),
    Evaluator::new(Feature::RequestUrl, content::request_url, Benign),
    Evaluator::new(Feature::UrlOfAnchor, content::url_of_anchor, Benign),
    Evaluator::new(Feature::LinksInTags, content::links_in_tags, Benign),
    Evaluator::new(Feature::Sfh, content::server_form_handler, Benign),
    Evaluator::new(Feature::SubmittingToEmail, content::submitting_to_email, Benign),
    Evaluator::new(Feature::AbnormalUrl, registration::abnormal_url, Suspicious),
    Evaluator::new(Feature::Redirect, network::redirect, Benign),
    Evaluator::new(Feature::OnMouseover, content::on_mouseover, Benign),
    Evaluator::new(Feature::RightClick, content::right_click, Benign),
    Evaluator::new(Feature::PopUpWidnow, content::popup_window, Benign),
    Evaluator::new(Feature::Iframe, content::iframe, Benign),
    Evaluator::new(Feature::AgeOfDomain, registration::age_of_domain, Suspicious),
    Evaluator::new(Feature::DnsRecord, network::dns_record, Suspicious),
    Evaluator::new(Feature::WebTraffic, network::web_traffic, Suspicious),
    Evaluator::new(Feature::PageRank, network::page_rank, Suspicious),
    Evaluator::new(Feature::GoogleIndex, network::google_index, Suspicious),
    Evaluator::new(Feature::LinksPointingToPage, content::links_pointing_to_page, Benign),
    Evaluator::new(Feature::StatisticalReport, network::statistical_report, Benign),
];

/// Registry entry for a feature
pub fn evaluator(feature: Feature) -> &'static Evaluator {
    &EVALUATORS[feature.index()]
}

/// Score used when the feature's evaluator fails
pub fn fallback(feature: Feature) -> Score {
    evaluator(feature).fallback
}

/// Run every evaluator against the context
pub fn evaluate(ctx: &ExtractionContext<'_>) -> FeatureVector {
    FeatureVector::from_fn(|feature| evaluator(feature).score(ctx))
}

/// Three-band rating of a percentage: below `low` is benign, up to and
/// including `high` is ambiguous, above is suspicious
fn rate_percentage(part: usize, total: usize, low: f64, high: f64) -> Score {
    if total == 0 {
        return Score::Benign;
    }
    let percentage = part as f64 / total as f64 * 100.0;
    if percentage < low {
        Score::Benign
    } else if percentage <= high {
        Score::Ambiguous
    } else {
        Score::Suspicious
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::url::{normalize_domain, parse};
    use pretty_assertions::assert_eq;

    pub(crate) fn shorteners() -> ShortenerList {
        ShortenerList::bundled().unwrap()
    }

    pub(crate) fn context<'a>(raw: &str, shorteners: &'a ShortenerList) -> ExtractionContext<'a> {
        let url = parse(raw).unwrap();
        let domain = normalize_domain(&url);
        ExtractionContext::offline(url, domain, shorteners)
    }

    #[test]
    fn test_registry_follows_schema_order() {
        for (index, evaluator) in EVALUATORS.iter().enumerate() {
            assert_eq!(evaluator.feature, Feature::ALL[index]);
        }
    }

    #[test]
    fn test_fallback_table() {
        let suspicious = [
            Feature::SslFinalState,
            Feature::DomainRegisterationLength,
            Feature::AbnormalUrl,
            Feature::AgeOfDomain,
            Feature::DnsRecord,
            Feature::WebTraffic,
            Feature::PageRank,
            Feature::GoogleIndex,
        ];
        for feature in Feature::ALL {
            let expected = if suspicious.contains(&feature) {
                Score::Suspicious
            } else {
                Score::Benign
            };
            assert_eq!(fallback(feature), expected, "fallback of {feature}");
        }
    }

    #[test]
    fn test_offline_context_uses_defaults() {
        let list = shorteners();
        let ctx = context("https://www.example.com/", &list);
        let vector = evaluate(&ctx);

        for feature in [
            Feature::Favicon,
            Feature::RequestUrl,
            Feature::UrlOfAnchor,
            Feature::LinksInTags,
            Feature::Sfh,
            Feature::SubmittingToEmail,
            Feature::Redirect,
            Feature::OnMouseover,
            Feature::RightClick,
            Feature::PopUpWidnow,
            Feature::Iframe,
            Feature::LinksPointingToPage,
            Feature::StatisticalReport,
        ] {
            assert_eq!(vector.get(feature), Score::Benign, "{feature}");
        }
        for feature in [
            Feature::DomainRegisterationLength,
            Feature::AbnormalUrl,
            Feature::AgeOfDomain,
            Feature::DnsRecord,
            Feature::WebTraffic,
            Feature::PageRank,
            Feature::GoogleIndex,
        ] {
            assert_eq!(vector.get(feature), Score::Suspicious, "{feature}");
        }
    }

    #[test]
    fn test_rate_percentage_bands() {
        assert_eq!(rate_percentage(0, 0, 22.0, 61.0), Score::Benign);
        assert_eq!(rate_percentage(21, 100, 22.0, 61.0), Score::Benign);
        assert_eq!(rate_percentage(22, 100, 22.0, 61.0), Score::Ambiguous);
        assert_eq!(rate_percentage(61, 100, 22.0, 61.0), Score::Ambiguous);
        assert_eq!(rate_percentage(62, 100, 22.0, 61.0), Score::Suspicious);
    }
}
