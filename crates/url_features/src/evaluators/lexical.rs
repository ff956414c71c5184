//! Signals computed from the URL string alone

use super::{EvalResult, ExtractionContext};
use crate::features::Score;
use regex::Regex;
use std::sync::LazyLock;

/// Dotted quad, each octet 0-255
static IPV4_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)")
        .expect("IPv4 regex is valid")
});

const STANDARD_PORTS: [u16; 2] = [80, 443];

pub(super) fn having_ip_address(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(IPV4_REGEX.is_match(ctx.url.host())))
}

pub(super) fn url_length(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(match ctx.url.raw().chars().count() {
        0..=53 => Score::Benign,
        54..=75 => Score::Ambiguous,
        _ => Score::Suspicious,
    })
}

pub(super) fn shortening_service(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.shorteners.is_shortened(ctx.url.raw())))
}

pub(super) fn having_at_symbol(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.url.raw().contains('@')))
}

/// A `//` after the scheme separator hints at an embedded redirect
pub(super) fn double_slash_redirecting(ctx: &ExtractionContext<'_>) -> EvalResult {
    let raw = ctx.url.raw();
    let last = raw.rfind("//").map(|byte| raw[..byte].chars().count());
    Ok(Score::flag(last.is_some_and(|position| position > 7)))
}

pub(super) fn prefix_suffix(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.domain.as_str().contains('-')))
}

pub(super) fn having_sub_domain(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(match ctx.domain.as_str().matches('.').count() {
        1 => Score::Benign,
        2 => Score::Ambiguous,
        _ => Score::Suspicious,
    })
}

pub(super) fn ssl_final_state(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(!ctx.url.raw().starts_with("https")))
}

pub(super) fn https_token(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.domain.as_str().contains("https")))
}

pub(super) fn port(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(
        ctx.url.port().is_some_and(|port| !STANDARD_PORTS.contains(&port)),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{context, shorteners};
    use super::*;
    use pretty_assertions::assert_eq;

    fn score(eval: fn(&ExtractionContext<'_>) -> EvalResult, raw: &str) -> i8 {
        let list = shorteners();
        eval(&context(raw, &list)).unwrap().value()
    }

    #[test]
    fn test_having_ip_address() {
        assert_eq!(score(having_ip_address, "http://192.168.1.1/login"), -1);
        assert_eq!(score(having_ip_address, "https://www.google.com"), 1);
        // Only the host is inspected
        assert_eq!(score(having_ip_address, "https://example.com/1.2.3.4"), 1);
    }

    #[test]
    fn test_url_length() {
        assert_eq!(score(url_length, "http://a.co"), 1);

        let sixty = format!("http://example.com/{}", "a".repeat(60 - 19));
        assert_eq!(sixty.len(), 60);
        assert_eq!(score(url_length, &sixty), 0);

        let boundary = format!("http://example.com/{}", "a".repeat(54 - 19));
        assert_eq!(score(url_length, &boundary), 0);

        let long = format!("http://example.com/{}", "a".repeat(200 - 19));
        assert_eq!(score(url_length, &long), -1);
    }

    #[test]
    fn test_shortening_service() {
        assert_eq!(score(shortening_service, "http://bit.ly/3xYz"), -1);
        assert_eq!(score(shortening_service, "https://tinyurl.com/abc"), -1);
        assert_eq!(score(shortening_service, "https://www.example.org/"), 1);
    }

    #[test]
    fn test_having_at_symbol() {
        assert_eq!(score(having_at_symbol, "http://a@b.com"), -1);
        assert_eq!(score(having_at_symbol, "http://a.com"), 1);
    }

    #[test]
    fn test_double_slash_redirecting() {
        assert_eq!(score(double_slash_redirecting, "https://example.com/path"), 1);
        assert_eq!(score(double_slash_redirecting, "http://example.com//evil.com"), -1);
        assert_eq!(
            score(double_slash_redirecting, "https://example.com/?u=http://evil.com"),
            -1
        );
    }

    #[test]
    fn test_prefix_suffix() {
        assert_eq!(score(prefix_suffix, "http://secure-paypal.com"), -1);
        assert_eq!(score(prefix_suffix, "http://paypal.com/a-b"), 1);
    }

    #[test]
    fn test_having_sub_domain() {
        // Dots in the normalized domain: 1 -> 1, 2 -> 0, anything else -> -1
        assert_eq!(score(having_sub_domain, "http://a.com"), 1);
        assert_eq!(score(having_sub_domain, "http://a.b.com"), 0);
        assert_eq!(score(having_sub_domain, "http://a.b.c.com"), -1);
        assert_eq!(score(having_sub_domain, "http://a.b.c.d.com"), -1);
        // "www." is stripped before counting
        assert_eq!(score(having_sub_domain, "http://www.example.com"), 1);
        assert_eq!(score(having_sub_domain, "http://localhost"), -1);
    }

    #[test]
    fn test_ssl_final_state() {
        assert_eq!(score(ssl_final_state, "https://www.google.com"), 1);
        assert_eq!(score(ssl_final_state, "http://192.168.1.1/login"), -1);
    }

    #[test]
    fn test_https_token() {
        assert_eq!(score(https_token, "http://https-login.example.com"), -1);
        assert_eq!(score(https_token, "https://www.google.com"), 1);
    }

    #[test]
    fn test_port() {
        assert_eq!(score(port, "http://example.com:8080/"), -1);
        assert_eq!(score(port, "http://example.com:80/"), 1);
        assert_eq!(score(port, "https://example.com:443/"), 1);
        assert_eq!(score(port, "https://example.com:80/"), 1);
        assert_eq!(score(port, "https://example.com/"), 1);
        // A scheme's own default port is still an explicit, non-web port
        assert_eq!(score(port, "ftp://example.com:21/file"), -1);
        // An out-of-range port is treated as absent
        assert_eq!(score(port, "http://example.com:99999/"), 1);
    }
}
