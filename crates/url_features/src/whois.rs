//! WHOIS lookups over the port-43 protocol
//!
//! The bootstrap server (IANA) names the registry for a TLD; the registry
//! answer may in turn point at the registrar's own WHOIS server, which is
//! followed once. Fields missing from the registry answer are filled from
//! the registrar answer.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

const WHOIS_PORT: u16 = 43;
const MAX_RESPONSE_BYTES: u64 = 512 * 1024;

const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "created date",
    "domain create date",
    "domain registration date",
    "registered",
    "registered on",
    "registration time",
    "registration date",
];

const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registry expiration date",
    "registrar registration expiration date",
    "expiration date",
    "expiration time",
    "expiry date",
    "expire date",
    "expires",
    "expires on",
    "domain expiration date",
    "paid-till",
];

const DOMAIN_NAME_KEYS: &[&str] = &["domain name", "domain"];

const REFERRAL_KEYS: &[&str] = &["registrar whois server", "whois server", "refer", "whois"];

/// Registration metadata for a domain
///
/// Registries can return several candidate dates for one field; they are
/// kept in response order and the first one is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisRecord {
    pub domain_name: Option<String>,
    pub creation_dates: Vec<DateTime<Utc>>,
    pub expiration_dates: Vec<DateTime<Utc>>,
}

impl WhoisRecord {
    /// First creation date returned
    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.creation_dates.first().copied()
    }

    /// First expiration date returned
    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_dates.first().copied()
    }

    /// Whether the registry named the domain at all
    pub fn has_domain_name(&self) -> bool {
        self.domain_name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }

    fn is_empty(&self) -> bool {
        self.domain_name.is_none() && self.creation_dates.is_empty() && self.expiration_dates.is_empty()
    }

    /// Fill fields this record lacks from `other`
    fn merge_missing(&mut self, other: WhoisRecord) {
        if self.domain_name.is_none() {
            self.domain_name = other.domain_name;
        }
        if self.creation_dates.is_empty() {
            self.creation_dates = other.creation_dates;
        }
        if self.expiration_dates.is_empty() {
            self.expiration_dates = other.expiration_dates;
        }
    }
}

/// Port-43 WHOIS client
pub struct WhoisClient {
    bootstrap_server: String,
    io_timeout: Duration,
}

impl WhoisClient {
    /// # Arguments
    /// * `bootstrap_server` - Server that knows the registry of every TLD
    /// * `io_timeout_ms` - Budget for a single server round trip
    pub fn new(bootstrap_server: impl Into<String>, io_timeout_ms: u64) -> Self {
        let bootstrap_server = bootstrap_server.into();
        info!("WHOIS client initialized with bootstrap server {}", bootstrap_server);
        Self {
            bootstrap_server,
            io_timeout: Duration::from_millis(io_timeout_ms),
        }
    }

    /// Look up the registration record of `domain`
    ///
    /// # Returns
    /// * `Ok(WhoisRecord)` when a registry answered with at least one known field
    /// * `Err(_)` on network failures, unknown TLDs or empty answers
    pub async fn lookup(&self, domain: &str) -> Result<WhoisRecord> {
        let tld = domain
            .trim_end_matches('.')
            .rsplit('.')
            .next()
            .filter(|tld| !tld.is_empty())
            .ok_or_else(|| anyhow!("cannot derive TLD from '{domain}'"))?;

        let bootstrap = self.query(&self.bootstrap_server, tld).await?;
        let registry = referral(&bootstrap)
            .ok_or_else(|| anyhow!("no WHOIS registry known for TLD '{tld}'"))?;
        debug!("WHOIS registry for .{} is {}", tld, registry);

        let registry_response = self.query(&registry, domain).await?;
        let mut record = parse_whois_response(&registry_response);

        if let Some(registrar) = referral(&registry_response).filter(|server| *server != registry) {
            debug!("Following WHOIS referral to {}", registrar);
            match self.query(&registrar, domain).await {
                Ok(response) => record.merge_missing(parse_whois_response(&response)),
                Err(e) => debug!("Registrar WHOIS query to {} failed: {}", registrar, e),
            }
        }

        if record.is_empty() {
            return Err(anyhow!("WHOIS answer for '{domain}' carried no registration data"));
        }

        debug!(
            "WHOIS record for {}: name={:?}, created={:?}, expires={:?}",
            domain,
            record.domain_name,
            record.creation_date(),
            record.expiration_date()
        );
        Ok(record)
    }

    async fn query(&self, server: &str, query: &str) -> Result<String> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, WHOIS_PORT))
                .await
                .with_context(|| format!("Failed to connect to {server}"))?;
            stream
                .write_all(format!("{query}\r\n").as_bytes())
                .await
                .context("Failed to send WHOIS query")?;

            let mut buf = Vec::new();
            stream
                .take(MAX_RESPONSE_BYTES)
                .read_to_end(&mut buf)
                .await
                .context("Failed to read WHOIS response")?;
            Ok::<_, anyhow::Error>(String::from_utf8_lossy(&buf).into_owned())
        };

        tokio::time::timeout(self.io_timeout, exchange)
            .await
            .map_err(|_| anyhow!("WHOIS query to {server} timed out"))?
    }
}

/// Split a response line into a lowercase key and a trimmed value
fn field(line: &str) -> Option<(String, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(['%', '#']) || line.starts_with(">>>") {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((key.trim().to_ascii_lowercase(), value))
}

/// Referral server named in a response, if any
fn referral(response: &str) -> Option<String> {
    response.lines().filter_map(field).find_map(|(key, value)| {
        REFERRAL_KEYS.contains(&key.as_str()).then(|| {
            value
                .trim_start_matches("whois://")
                .trim_start_matches("rwhois://")
                .trim_end_matches('/')
                .to_string()
        })
    })
    .filter(|server| !server.is_empty() && !server.contains(char::is_whitespace))
}

/// Extract the registration fields from a raw WHOIS answer
pub fn parse_whois_response(response: &str) -> WhoisRecord {
    let mut record = WhoisRecord::default();

    for (key, value) in response.lines().filter_map(field) {
        let key = key.as_str();
        if DOMAIN_NAME_KEYS.contains(&key) {
            if record.domain_name.is_none() {
                record.domain_name = Some(value.to_string());
            }
        } else if CREATION_KEYS.contains(&key) {
            if let Some(date) = parse_whois_date(value) {
                record.creation_dates.push(date);
            }
        } else if EXPIRATION_KEYS.contains(&key) {
            if let Some(date) = parse_whois_date(value) {
                record.expiration_dates.push(date);
            }
        }
    }

    record
}

/// Parse the assorted date formats registries use
pub fn parse_whois_date(value: &str) -> Option<DateTime<Utc>> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
        "%d-%b-%Y %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d", "%d-%b-%Y", "%d-%B-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d", "%Y%m%d",
    ];

    let value = value.trim();
    let candidates = [
        value,
        value
            .trim_end_matches(" UTC")
            .trim_end_matches(" GMT")
            .trim_end_matches(" (JST)"),
        value.split_whitespace().next().unwrap_or_default(),
    ];

    for candidate in candidates {
        if let Ok(date) = DateTime::parse_from_rfc3339(candidate) {
            return Some(date.with_timezone(&Utc));
        }
        if let Some(date) = DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(candidate, format).ok())
        {
            return Some(date.and_utc());
        }
        if let Some(date) = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
        {
            return date.and_hms_opt(0, 0, 0).map(|date| date.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const VERISIGN_SAMPLE: &str = "\
   Domain Name: GOOGLE.COM
   Registry Domain ID: 2138514_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.markmonitor.com
   Updated Date: 2019-09-09T15:39:04Z
   Creation Date: 1997-09-15T04:00:00Z
   Registry Expiry Date: 2028-09-14T04:00:00Z
   Registrar: MarkMonitor Inc.
>>> Last update of whois database: 2024-01-01T00:00:00Z <<<
";

    #[test]
    fn test_parse_registry_response() {
        let record = parse_whois_response(VERISIGN_SAMPLE);
        assert_eq!(record.domain_name.as_deref(), Some("GOOGLE.COM"));
        assert_eq!(
            record.creation_date(),
            Some(Utc.with_ymd_and_hms(1997, 9, 15, 4, 0, 0).unwrap())
        );
        assert_eq!(
            record.expiration_date(),
            Some(Utc.with_ymd_and_hms(2028, 9, 14, 4, 0, 0).unwrap())
        );
        assert!(record.has_domain_name());
    }

    #[test]
    fn test_first_date_wins() {
        let response = "\
domain: example.org
created: 2001-02-03
created: 1999-01-01
expires: 2030-01-01
";
        let record = parse_whois_response(response);
        assert_eq!(record.creation_dates.len(), 2);
        assert_eq!(
            record.creation_date(),
            Some(Utc.with_ymd_and_hms(2001, 2, 3, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_referral_detection() {
        assert_eq!(referral(VERISIGN_SAMPLE).as_deref(), Some("whois.markmonitor.com"));

        let iana = "% IANA WHOIS server\n\nrefer:        whois.verisign-grs.com\n\ndomain:       COM\n";
        assert_eq!(referral(iana).as_deref(), Some("whois.verisign-grs.com"));

        assert_eq!(referral("No match for domain \"NOPE.COM\".\n"), None);
    }

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 3, 4, 0, 0, 0).unwrap();
        for value in [
            "2020-03-04",
            "2020-03-04T00:00:00Z",
            "2020-03-04T00:00:00.000Z",
            "2020-03-04 00:00:00",
            "2020-03-04 00:00:00 UTC",
            "04-Mar-2020",
            "2020.03.04",
            "04.03.2020",
            "2020/03/04",
            "20200304",
            "2020-03-04T00:00:00+00:00",
        ] {
            assert_eq!(parse_whois_date(value), Some(expected), "format {value}");
        }

        assert_eq!(parse_whois_date("not a date"), None);
        assert_eq!(parse_whois_date(""), None);
    }

    #[test]
    fn test_unknown_domain_yields_empty_record() {
        let record = parse_whois_response("No match for \"THIS-DOES-NOT-EXIST.COM\".\n");
        assert!(record.is_empty());
        assert!(!record.has_domain_name());
        assert_eq!(record.creation_date(), None);
    }

    #[test]
    fn test_merge_missing_keeps_registry_fields() {
        let mut registry = parse_whois_response("Domain Name: EXAMPLE.COM\nCreation Date: 1995-08-14T04:00:00Z\n");
        let registrar = parse_whois_response(
            "Domain Name: example.com\nCreation Date: 2000-01-01T00:00:00Z\nRegistrar Registration Expiration Date: 2030-08-13T04:00:00Z\n",
        );
        registry.merge_missing(registrar);

        assert_eq!(registry.domain_name.as_deref(), Some("EXAMPLE.COM"));
        assert_eq!(
            registry.creation_date(),
            Some(Utc.with_ymd_and_hms(1995, 8, 14, 4, 0, 0).unwrap())
        );
        assert_eq!(
            registry.expiration_date(),
            Some(Utc.with_ymd_and_hms(2030, 8, 13, 4, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_lookup() {
        let client = WhoisClient::new("whois.iana.org", 5_000);
        let record = client.lookup("google.com").await.unwrap();
        assert!(record.has_domain_name());
        assert!(record.creation_date().is_some());
    }
}
