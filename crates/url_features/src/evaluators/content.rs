//! Signals read from the fetched page
//!
//! A reference is off-domain when it names a host (absolute or
//! protocol-relative) outside the extraction domain. Relative references
//! are on-domain.

use super::{rate_percentage, EvalResult, ExtractionContext};
use crate::features::Score;
use crate::url::Domain;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static RIGHT_CLICK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"event\.button\s*==\s*2|contextmenu").expect("right-click regex is valid")
});

/// Host named by a reference, if any
fn reference_host(reference: &str) -> Option<String> {
    let reference = reference.trim();
    let parsed = if reference.starts_with("//") {
        Url::parse(&format!("http:{reference}"))
    } else {
        Url::parse(reference)
    };
    parsed.ok()?.host_str().map(str::to_string)
}

fn is_off_domain(reference: &str, domain: &Domain) -> bool {
    reference_host(reference).is_some_and(|host| !domain.covers(&host))
}

pub(super) fn favicon(ctx: &ExtractionContext<'_>) -> EvalResult {
    let page = ctx.page()?;
    Ok(Score::flag(
        page.favicon_hrefs
            .iter()
            .any(|href| is_off_domain(href, &ctx.domain)),
    ))
}

pub(super) fn request_url(ctx: &ExtractionContext<'_>) -> EvalResult {
    let page = ctx.page()?;
    let external = page
        .media_sources
        .iter()
        .filter(|src| is_off_domain(src, &ctx.domain))
        .count();
    Ok(rate_percentage(external, page.media_sources.len(), 22.0, 61.0))
}

pub(super) fn url_of_anchor(ctx: &ExtractionContext<'_>) -> EvalResult {
    let page = ctx.page()?;
    let unsafe_count = page
        .anchor_hrefs
        .iter()
        .filter(|href| {
            let href = href.trim();
            href == "#"
                || href.to_ascii_lowercase().starts_with("javascript:")
                || is_off_domain(href, &ctx.domain)
        })
        .count();
    Ok(rate_percentage(unsafe_count, page.anchor_hrefs.len(), 31.0, 67.0))
}

pub(super) fn links_in_tags(ctx: &ExtractionContext<'_>) -> EvalResult {
    let page = ctx.page()?;
    let external = page
        .tag_references
        .iter()
        .filter(|reference| is_off_domain(reference, &ctx.domain))
        .count();
    Ok(rate_percentage(external, page.tag_references.len(), 17.0, 81.0))
}

/// First form with a blank or off-domain handler decides
pub(super) fn server_form_handler(ctx: &ExtractionContext<'_>) -> EvalResult {
    let page = ctx.page()?;
    for action in &page.form_actions {
        let action = action.trim();
        if action.is_empty() || action == "about:blank" {
            return Ok(Score::Suspicious);
        }
        if is_off_domain(action, &ctx.domain) {
            return Ok(Score::Ambiguous);
        }
    }
    Ok(Score::Benign)
}

pub(super) fn submitting_to_email(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.page()?.serialized.contains("mailto:")))
}

pub(super) fn on_mouseover(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(
        ctx.page()?.serialized.to_lowercase().contains("onmouseover"),
    ))
}

pub(super) fn right_click(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(RIGHT_CLICK_REGEX.is_match(&ctx.page()?.serialized)))
}

pub(super) fn popup_window(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.page()?.serialized.contains("window.open(")))
}

pub(super) fn iframe(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(Score::flag(ctx.page()?.iframe_count > 0))
}

pub(super) fn links_pointing_to_page(ctx: &ExtractionContext<'_>) -> EvalResult {
    Ok(match ctx.page()?.anchor_count {
        0 => Score::Suspicious,
        1..=2 => Score::Ambiguous,
        _ => Score::Benign,
    })
}
