//! Signals backed by DNS, redirect tracing, the search index and
//! reputation sources

use super::{EvalError, EvalResult, ExtractionContext};
use crate::features::Score;

pub(super) fn redirect(ctx: &ExtractionContext<'_>) -> EvalResult {
    let trace = ctx
        .redirects
        .ok_or(EvalError::MissingContext("redirect trace"))?;
    Ok(match trace.hops {
        0..=1 => Score::Benign,
        2..=4 => Score::Ambiguous,
        _ => Score::Suspicious,
    })
}

pub(super) fn dns_record(ctx: &ExtractionContext<'_>) -> EvalResult {
    let resolves = ctx
        .dns_resolves
        .ok_or(EvalError::MissingContext("DNS answer"))?;
    Ok(Score::flag(!resolves))
}

pub(super) fn google_index(ctx: &ExtractionContext<'_>) -> EvalResult {
    let indexed = ctx
        .indexed
        .ok_or(EvalError::MissingContext("search index answer"))?;
    Ok(Score::flag(!indexed))
}

pub(super) fn web_traffic(ctx: &ExtractionContext<'_>) -> EvalResult {
    ctx.reputation
        .web_traffic
        .ok_or(EvalError::MissingField("web_traffic"))
}

pub(super) fn page_rank(ctx: &ExtractionContext<'_>) -> EvalResult {
    ctx.reputation
        .page_rank
        .ok_or(EvalError::MissingField("page_rank"))
}

pub(super) fn statistical_report(ctx: &ExtractionContext<'_>) -> EvalResult {
    ctx.reputation
        .statistical_report
        .ok_or(EvalError::MissingField("statistical_report"))
}
