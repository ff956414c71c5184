//! Feature schema, ternary scores and the ordered feature vector
//!
//! The column order below is the wire contract with the downstream
//! classifier; it must never be reordered.

use crate::{FeatureError, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Number of columns in the schema
pub const FEATURE_COUNT: usize = 30;

/// Ground-truth column present in training data, dropped before inference
pub const LABEL_COLUMN: &str = "Result";

/// One ternary heuristic score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Score {
    Suspicious,
    Ambiguous,
    Benign,
}

impl Score {
    pub fn value(self) -> i8 {
        match self {
            Score::Suspicious => -1,
            Score::Ambiguous => 0,
            Score::Benign => 1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Score::Suspicious),
            0 => Some(Score::Ambiguous),
            1 => Some(Score::Benign),
            _ => None,
        }
    }

    /// Benign when the flag is clear, suspicious when it is raised
    pub fn flag(suspicious: bool) -> Self {
        if suspicious {
            Score::Suspicious
        } else {
            Score::Benign
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

/// The 30 signals, declared in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    HavingIpAddress,
    UrlLength,
    ShortiningService,
    HavingAtSymbol,
    DoubleSlashRedirecting,
    PrefixSuffix,
    HavingSubDomain,
    SslFinalState,
    DomainRegisterationLength,
    Favicon,
    Port,
    HttpsToken,
    RequestUrl,
    UrlOfAnchor,
    LinksInTags,
    Sfh,
    SubmittingToEmail,
    AbnormalUrl,
    Redirect,
    OnMouseover,
    RightClick,
    PopUpWidnow,
    Iframe,
    AgeOfDomain,
    DnsRecord,
    WebTraffic,
    PageRank,
    GoogleIndex,
    LinksPointingToPage,
    StatisticalReport,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::HavingIpAddress,
        Feature::UrlLength,
        Feature::ShortiningService,
        Feature::HavingAtSymbol,
        Feature::DoubleSlashRedirecting,
        Feature::PrefixSuffix,
        Feature::HavingSubDomain,
        Feature::SslFinalState,
        Feature::DomainRegisterationLength,
        Feature::Favicon,
        Feature::Port,
        Feature::HttpsToken,
        Feature::RequestUrl,
        Feature::UrlOfAnchor,
        Feature::LinksInTags,
        Feature::Sfh,
        Feature::SubmittingToEmail,
        Feature::AbnormalUrl,
        Feature::Redirect,
        Feature::OnMouseover,
        Feature::RightClick,
        Feature::PopUpWidnow,
        Feature::Iframe,
        Feature::AgeOfDomain,
        Feature::DnsRecord,
        Feature::WebTraffic,
        Feature::PageRank,
        Feature::GoogleIndex,
        Feature::LinksPointingToPage,
        Feature::StatisticalReport,
    ];

    /// Column name expected by the classifier (spelling included)
    pub fn name(self) -> &'static str {
        match self {
            Feature::HavingIpAddress => "having_IP_Address",
            Feature::UrlLength => "URL_Length",
            Feature::ShortiningService => "Shortining_Service",
            Feature::HavingAtSymbol => "having_At_Symbol",
            Feature::DoubleSlashRedirecting => "double_slash_redirecting",
            Feature::PrefixSuffix => "Prefix_Suffix",
            Feature::HavingSubDomain => "having_Sub_Domain",
            Feature::SslFinalState => "SSLfinal_State",
            Feature::DomainRegisterationLength => "Domain_registeration_length",
            Feature::Favicon => "Favicon",
            Feature::Port => "port",
            Feature::HttpsToken => "HTTPS_token",
            Feature::RequestUrl => "Request_URL",
            Feature::UrlOfAnchor => "URL_of_Anchor",
            Feature::LinksInTags => "Links_in_tags",
            Feature::Sfh => "SFH",
            Feature::SubmittingToEmail => "Submitting_to_email",
            Feature::AbnormalUrl => "Abnormal_URL",
            Feature::Redirect => "Redirect",
            Feature::OnMouseover => "on_mouseover",
            Feature::RightClick => "RightClick",
            Feature::PopUpWidnow => "popUpWidnow",
            Feature::Iframe => "Iframe",
            Feature::AgeOfDomain => "age_of_domain",
            Feature::DnsRecord => "DNSRecord",
            Feature::WebTraffic => "web_traffic",
            Feature::PageRank => "Page_Rank",
            Feature::GoogleIndex => "Google_Index",
            Feature::LinksPointingToPage => "Links_pointing_to_page",
            Feature::StatisticalReport => "Statistical_report",
        }
    }

    /// Position in the schema
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Feature::ALL.into_iter().find(|feature| feature.name() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema column names in wire order
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    Feature::ALL.map(Feature::name)
}

/// Complete, ordered feature vector
///
/// Only constructible with a score for every feature, so a vector handed to
/// a caller is always schema-complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    scores: [Score; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build from a scoring function called once per feature, in schema order
    pub fn from_fn(mut score: impl FnMut(Feature) -> Score) -> Self {
        Self {
            scores: Feature::ALL.map(&mut score),
        }
    }

    pub fn get(&self, feature: Feature) -> Score {
        self.scores[feature.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, Score)> + '_ {
        Feature::ALL.into_iter().zip(self.scores.iter().copied())
    }

    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, i8)> + '_ {
        self.iter().map(|(feature, score)| (feature.name(), score.value()))
    }

    /// Tabular row in classifier column order
    pub fn to_row(&self) -> [i8; FEATURE_COUNT] {
        self.scores.map(Score::value)
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter_named() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Map a tabular header onto schema order
///
/// Returns, for each schema column, the index of the matching header column.
/// The label column is ignored; any other unknown or missing column is an
/// error.
pub fn align_columns<S: AsRef<str>>(header: &[S]) -> Result<[usize; FEATURE_COUNT]> {
    let mut positions = [usize::MAX; FEATURE_COUNT];

    for (column, name) in header.iter().enumerate() {
        let name = name.as_ref().trim();
        if name == LABEL_COLUMN {
            continue;
        }
        let feature = Feature::from_name(name)
            .ok_or_else(|| FeatureError::SchemaMismatch(format!("unknown column '{name}'")))?;
        if positions[feature.index()] != usize::MAX {
            return Err(FeatureError::SchemaMismatch(format!("duplicate column '{name}'")));
        }
        positions[feature.index()] = column;
    }

    if let Some(missing) = Feature::ALL
        .into_iter()
        .find(|feature| positions[feature.index()] == usize::MAX)
    {
        return Err(FeatureError::SchemaMismatch(format!(
            "missing column '{}'",
            missing.name()
        )));
    }

    Ok(positions)
}
