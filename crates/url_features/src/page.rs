//! HTML page digest
//!
//! `scraper::Html` is not `Send`, so the document is parsed once and reduced
//! to the tag inventory the content evaluators need. Only the digest leaves
//! the parsing thread.

use scraper::{Html, Selector};
use tracing::debug;

/// Digest of a fetched HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// `href` of every `<link rel~="icon">`
    pub favicon_hrefs: Vec<String>,
    /// Non-empty `src` of img/audio/embed/iframe tags
    pub media_sources: Vec<String>,
    /// `href` of each `<a>` that has one
    pub anchor_hrefs: Vec<String>,
    /// Total `<a>` tags, with or without `href`
    pub anchor_count: usize,
    /// Non-empty `href` (or else `src`) of meta/script/link tags
    pub tag_references: Vec<String>,
    /// `action` of every form in document order; missing actions are empty
    pub form_actions: Vec<String>,
    pub iframe_count: usize,
    /// Re-serialized document
    pub serialized: String,
    /// Bytes of the response body that were parsed
    pub byte_count: usize,
}

impl PageContent {
    /// Parse an HTML body into its digest
    pub fn parse(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let document = Html::parse_document(&text);

        let favicon_hrefs = collect_attr(&document, r#"link[rel~="icon"]"#, &["href"]);
        let media_sources = collect_attr(&document, "img, audio, embed, iframe", &["src"]);
        let anchor_hrefs = collect_attr(&document, "a", &["href"]);
        let tag_references = collect_attr(&document, "meta, script, link", &["href", "src"]);
        let form_actions = all_attr(&document, "form", "action");
        let anchor_count = count(&document, "a");
        let iframe_count = count(&document, "iframe");

        let page = Self {
            favicon_hrefs,
            media_sources,
            anchor_hrefs,
            anchor_count,
            tag_references,
            form_actions,
            iframe_count,
            serialized: document.html(),
            byte_count: body.len(),
        };

        debug!(
            "Parsed page: {} bytes, {} anchors, {} media, {} forms, {} iframes",
            page.byte_count,
            page.anchor_count,
            page.media_sources.len(),
            page.form_actions.len(),
            page.iframe_count
        );

        page
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First non-empty attribute among `names`, per matching element
fn collect_attr(document: &Html, css: &str, names: &[&str]) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| {
            names
                .iter()
                .filter_map(|name| element.value().attr(name))
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Attribute of every matching element, empty when missing
fn all_attr(document: &Html, css: &str, name: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|element| element.value().attr(name).unwrap_or_default().to_string())
        .collect()
}

fn count(document: &Html, css: &str) -> usize {
    selector(css).map_or(0, |selector| document.select(&selector).count())
}
