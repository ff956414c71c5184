//! Process-wide request counters rendered in Prometheus text format

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use url_features::{ExtractorStats, ProviderReport, ProviderStatus};

const PROVIDERS: [&str; 5] = ["page", "whois", "dns", "redirects", "index"];

/// Counters updated by the extraction handlers
#[derive(Debug, Default)]
pub struct ExtractionMetrics {
    extractions: AtomicU64,
    malformed: AtomicU64,
    deadline_exceeded: AtomicU64,
    /// Indexed like `PROVIDERS`
    degraded: [AtomicU64; 5],
}

impl ExtractionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished extraction and every provider that did not answer
    pub fn record_extraction(&self, providers: &ProviderReport) {
        self.extractions.fetch_add(1, Ordering::Relaxed);

        let statuses = [
            providers.page,
            providers.whois,
            providers.dns,
            providers.redirects,
            providers.index,
        ];
        for (counter, status) in self.degraded.iter().zip(statuses) {
            if matches!(
                status,
                ProviderStatus::Failed | ProviderStatus::TimedOut | ProviderStatus::Cancelled
            ) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request whose deadline cancelled outstanding providers
    pub fn record_deadline_exceeded(&self) {
        self.deadline_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn extractions(&self) -> u64 {
        self.extractions.load(Ordering::Relaxed)
    }

    /// Render all counters plus the extractor's static gauges
    pub fn render(&self, stats: &ExtractorStats) -> String {
        let mut out = format!(
            "# HELP url_features_extractions_total Completed feature extractions\n\
             # TYPE url_features_extractions_total counter\n\
             url_features_extractions_total {}\n\
             \n\
             # HELP url_features_malformed_urls_total Requests rejected as malformed URLs\n\
             # TYPE url_features_malformed_urls_total counter\n\
             url_features_malformed_urls_total {}\n\
             \n\
             # HELP url_features_deadline_exceeded_total Extractions cut short by the request deadline\n\
             # TYPE url_features_deadline_exceeded_total counter\n\
             url_features_deadline_exceeded_total {}\n\
             \n\
             # HELP url_features_provider_degraded_total Provider calls that failed, timed out or were cancelled\n\
             # TYPE url_features_provider_degraded_total counter\n",
            self.extractions(),
            self.malformed.load(Ordering::Relaxed),
            self.deadline_exceeded.load(Ordering::Relaxed),
        );

        for (name, counter) in PROVIDERS.iter().zip(&self.degraded) {
            let _ = writeln!(
                out,
                "url_features_provider_degraded_total{{provider=\"{}\"}} {}",
                name,
                counter.load(Ordering::Relaxed)
            );
        }

        let _ = write!(
            out,
            "\n\
             # HELP url_features_shortener_entries Entries in the shortener denylist\n\
             # TYPE url_features_shortener_entries gauge\n\
             url_features_shortener_entries {}\n\
             \n\
             # HELP url_features_build_info Build information\n\
             # TYPE url_features_build_info gauge\n\
             url_features_build_info{{version=\"{}\",features=\"{}\"}} 1\n",
            stats.shortener_entries,
            env!("CARGO_PKG_VERSION"),
            stats.feature_count,
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(status: ProviderStatus) -> ProviderReport {
        ProviderReport {
            page: status,
            whois: ProviderStatus::Ok,
            dns: ProviderStatus::Ok,
            redirects: status,
            index: ProviderStatus::Disabled,
        }
    }

    fn stats() -> ExtractorStats {
        ExtractorStats {
            feature_count: 30,
            shortener_entries: 12,
            index_lookup_enabled: false,
        }
    }

    #[test]
    fn test_counters() {
        let metrics = ExtractionMetrics::new();
        metrics.record_extraction(&report(ProviderStatus::Ok));
        metrics.record_extraction(&report(ProviderStatus::TimedOut));
        metrics.record_malformed();

        assert_eq!(metrics.extractions(), 2);

        let text = metrics.render(&stats());
        assert!(text.contains("url_features_extractions_total 2\n"));
        assert!(text.contains("url_features_malformed_urls_total 1\n"));
        assert!(text.contains("url_features_deadline_exceeded_total 0\n"));
        assert!(text.contains("url_features_provider_degraded_total{provider=\"page\"} 1\n"));
        assert!(text.contains("url_features_provider_degraded_total{provider=\"redirects\"} 1\n"));
        assert!(text.contains("url_features_provider_degraded_total{provider=\"index\"} 0\n"));
    }

    #[test]
    fn test_disabled_is_not_degraded() {
        let metrics = ExtractionMetrics::new();
        metrics.record_extraction(&report(ProviderStatus::Disabled));

        let text = metrics.render(&stats());
        assert!(text.contains("url_features_provider_degraded_total{provider=\"page\"} 0\n"));
        assert!(text.contains("url_features_shortener_entries 12\n"));
    }
}
