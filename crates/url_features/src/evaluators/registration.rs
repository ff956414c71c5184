//! WHOIS-derived signals

use super::{EvalError, EvalResult, ExtractionContext};
use crate::features::Score;

const MIN_REGISTRATION_DAYS: i64 = 365;
const MIN_AGE_DAYS: i64 = 180;

pub(super) fn registration_length(ctx: &ExtractionContext<'_>) -> EvalResult {
    let whois = ctx.whois()?;
    let created = whois
        .creation_date()
        .ok_or(EvalError::MissingField("creation_date"))?;
    let expires = whois
        .expiration_date()
        .ok_or(EvalError::MissingField("expiration_date"))?;

    Ok(Score::flag((expires - created).num_days() < MIN_REGISTRATION_DAYS))
}

pub(super) fn abnormal_url(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(!ctx.whois()?.has_domain_name()))
}

pub(super) fn age_of_domain(ctx: &ExtractionContext<'_>) -> EvalResult {
    let created = ctx
        .whois()?
        .creation_date()
        .ok_or(EvalError::MissingField("creation_date"))?;

    Ok(Score::flag((ctx.now - created).num_days() < MIN_AGE_DAYS))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{context, shorteners};
    use super::*;
    use crate::whois::WhoisRecord;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn record(created_days_ago: Option<i64>, lifetime_days: Option<i64>) -> WhoisRecord {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let created = created_days_ago.map(|days| now - Duration::days(days));
        WhoisRecord {
            domain_name: Some("EXAMPLE.COM".to_string()),
            creation_dates: created.into_iter().collect(),
            expiration_dates: created
                .zip(lifetime_days)
                .map(|(created, days)| created + Duration::days(days))
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let list = shorteners();
        let ctx = context("https://example.com", &list);

        assert!(matches!(registration_length(&ctx), Err(EvalError::MissingContext(_))));
        assert!(matches!(abnormal_url(&ctx), Err(EvalError::MissingContext(_))));
        assert!(matches!(age_of_domain(&ctx), Err(EvalError::MissingContext(_))));
    }

    #[test]
    fn test_registration_length() {
        let list = shorteners();
        let mut ctx = context("https://example.com", &list);

        ctx.whois = Some(record(Some(1000), Some(365)));
        assert_eq!(registration_length(&ctx), Ok(Score::Benign));

        ctx.whois = Some(record(Some(1000), Some(364)));
        assert_eq!(registration_length(&ctx), Ok(Score::Suspicious));

        ctx.whois = Some(record(Some(1000), None));
        assert_eq!(
            registration_length(&ctx),
            Err(EvalError::MissingField("expiration_date"))
        );
    }

    #[test]
    fn test_first_date_wins() {
        let list = shorteners();
        let mut ctx = context("https://example.com", &list);
        let mut whois = record(Some(1000), Some(30));
        // A later expiration candidate is ignored
        whois
            .expiration_dates
            .push(whois.creation_dates[0] + Duration::days(3650));
        ctx.whois = Some(whois);

        assert_eq!(registration_length(&ctx), Ok(Score::Suspicious));
    }

    #[test]
    fn test_abnormal_url() {
        let list = shorteners();
        let mut ctx = context("https://example.com", &list);

        ctx.whois = Some(record(Some(1000), Some(365)));
        assert_eq!(abnormal_url(&ctx), Ok(Score::Benign));

        ctx.whois = Some(WhoisRecord {
            domain_name: Some("  ".to_string()),
            ..record(Some(10), None)
        });
        assert_eq!(abnormal_url(&ctx), Ok(Score::Suspicious));
    }

    #[test]
    fn test_age_of_domain() {
        let list = shorteners();
        let mut ctx = context("https://example.com", &list);
        ctx.now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        ctx.whois = Some(record(Some(180), None));
        assert_eq!(age_of_domain(&ctx), Ok(Score::Benign));

        ctx.whois = Some(record(Some(179), None));
        assert_eq!(age_of_domain(&ctx), Ok(Score::Suspicious));

        ctx.whois = Some(record(None, None));
        assert_eq!(age_of_domain(&ctx), Err(EvalError::MissingField("creation_date")));
    }
}
