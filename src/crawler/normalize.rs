//! Post body normalization
//!
//! Turns the markup of a post body into plain text. Media becomes its direct
//! URL, links become `text (<url>)`, and line structure is kept through `br`
//! and block elements. The parsed tree is never mutated: every element is
//! rendered by the first rule that claims it, and unclaimed elements render
//! their children.

use crate::url::{decode_outbound_link, youtube_watch_url};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#(\w+)").expect("Failed to compile hashtag regex pattern")
});

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("Failed to parse img selector"));

static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe").expect("Failed to parse iframe selector"));

/// A rewrite rule; returns None when the element is not its kind
type Rule = for<'a> fn(ElementRef<'a>) -> Option<String>;

/// Rules in priority order
const RULES: &[Rule] = &[media_rule, video_rule, link_rule, break_rule, block_rule];

/// Normalizes a body given as an HTML fragment
///
/// The result is not trimmed.
pub fn normalize_body_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    render_children(fragment.root_element())
}

/// Renders the children of an already parsed body element
pub fn render_children(element: ElementRef<'_>) -> String {
    let mut out = String::new();

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    out.push_str(&render_element(child));
                }
            }
            _ => {}
        }
    }

    out
}

fn render_element(element: ElementRef<'_>) -> String {
    if matches!(element.value().name(), "script" | "style") {
        return String::new();
    }

    RULES
        .iter()
        .find_map(|rule| rule(element))
        .unwrap_or_else(|| render_children(element))
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Direct source URL of an image element
fn media_rule(element: ElementRef<'_>) -> Option<String> {
    let value = element.value();
    match value.name() {
        "a" if has_class(element, "photoswipe-image") => value.attr("href").map(str::to_string),
        "img" => Some(
            value
                .attr("data-src")
                .or_else(|| value.attr("src"))
                .unwrap_or_default()
                .to_string(),
        ),
        _ => None,
    }
}

fn video_rule(element: ElementRef<'_>) -> Option<String> {
    if element.value().name() != "div" || !has_class(element, "video-youtube") {
        return None;
    }

    let iframe = element.select(&IFRAME_SELECTOR).next()?;
    let src = iframe
        .value()
        .attr("data-src")
        .or_else(|| iframe.value().attr("src"))?;
    youtube_watch_url(src)
}

fn link_rule(element: ElementRef<'_>) -> Option<String> {
    if element.value().name() != "a" {
        return None;
    }

    // An image wrapped in a link stands for the image itself
    if let Some(image) = element.select(&IMG_SELECTOR).next() {
        return media_rule(image);
    }

    let href = element.value().attr("href")?;
    let text = element.text().collect::<String>();
    Some(format!("{} (<{}>)", text.trim(), decode_outbound_link(href)))
}

fn break_rule(element: ElementRef<'_>) -> Option<String> {
    (element.value().name() == "br").then(|| "\n".to_string())
}

fn block_rule(element: ElementRef<'_>) -> Option<String> {
    match element.value().name() {
        "div" | "p" => Some(format!("{}\n", render_children(element).trim())),
        _ => None,
    }
}

/// Extracts hashtags in the order they appear, duplicates included
///
/// The whole finished body is scanned, so a `#fragment` in a rewritten link
/// counts too. Tags only ever select vocabulary entries.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
