//! Post parser
//!
//! Turns one raw post fragment into a structured [`PostRecord`].

use crate::crawler::normalize::{extract_hashtags, render_children};
use crate::crawler::page::RawPostFragment;
use crate::url::resolve_permalink;
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Title a post carries when its author gave it none
pub const NO_TITLE: &str = "No Title";

/// Score the forum shows as a word instead of a number once it passes 1000
pub const SATURATED_SCORE: u32 = 1000;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect("Failed to parse post selector"));
    };
}

selector!(HEADER, "div.c-post__header");
selector!(FLOOR_ANCHOR, "a.tippy-gpbp");
selector!(POST_TITLE, "h1.c-post__header__title");
selector!(USERNAME, "a.username");
selector!(USERID, "a.userid");
selector!(APPROVAL, "span.postgp span");
selector!(DISAPPROVAL, "span.postbp span");
selector!(CONTENT, "div.c-article__content");

/// Post author as shown in the post header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub display_name: String,
    pub user_id: String,
}

/// One extracted post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Position of the post in the thread, from 1
    pub floor: u32,

    /// Post title, or [`NO_TITLE`]
    pub title: String,

    pub author: Author,

    /// Direct link to this floor
    pub permalink: String,

    /// Normalized plain-text body
    pub body: String,

    /// Hashtags found in the body, in encounter order
    pub hashtags: Vec<String>,

    /// Approval (GP) score
    pub approval_score: u32,

    /// Disapproval (BP) score
    pub disapproval_score: u32,
}

impl PostRecord {
    /// Returns true if the author gave the post a title of its own
    pub fn has_own_title(&self) -> bool {
        self.title != NO_TITLE
    }
}

/// Parses a single post fragment
///
/// # Arguments
///
/// * `fragment` - The post's markup
/// * `fallback_link` - Permalink used when the floor anchor has no usable
///   href, normally the URL of the page the post was found on
///
/// # Returns
///
/// * `Ok(PostRecord)` - Successfully parsed post
/// * `Err(ParseError)` - The header block or the floor number is missing or
///   malformed
pub fn parse_post(fragment: &RawPostFragment, fallback_link: &str) -> Result<PostRecord, ParseError> {
    let document = Html::parse_fragment(&fragment.html);
    let root = document.root_element();

    let header = root.select(&HEADER).next().ok_or(ParseError::MissingHeader)?;
    let anchor = header
        .select(&FLOOR_ANCHOR)
        .next()
        .ok_or(ParseError::MissingHeader)?;

    let raw_floor = anchor
        .value()
        .attr("data-floor")
        .ok_or(ParseError::MissingHeader)?;
    let floor = raw_floor
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidFloor(raw_floor.to_string()))?;

    let permalink = resolve_permalink(anchor.value().attr("href"), fallback_link);

    let title = first_text(root, &POST_TITLE)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let author = Author {
        display_name: first_text(header, &USERNAME).unwrap_or_default(),
        user_id: first_text(header, &USERID).unwrap_or_default(),
    };

    let approval_score = parse_score(first_text(root, &APPROVAL).as_deref(), "爆");
    let disapproval_score = parse_score(first_text(root, &DISAPPROVAL).as_deref(), "X");

    let body = root
        .select(&CONTENT)
        .next()
        .map(|content| render_children(content).trim().to_string())
        .unwrap_or_default();
    let hashtags = extract_hashtags(&body);

    Ok(PostRecord {
        floor,
        title,
        author,
        permalink,
        body,
        hashtags,
        approval_score,
        disapproval_score,
    })
}

/// Trimmed text of the first element matching `selector`
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Reads a GP/BP counter
///
/// `-` or an absent counter means zero. Past 1000 the forum prints
/// `saturated` instead of a number.
fn parse_score(text: Option<&str>, saturated: &str) -> u32 {
    match text {
        None | Some("-") | Some("") => 0,
        Some(t) if t == saturated => SATURATED_SCORE,
        Some(t) => t.parse().unwrap_or(0),
    }
}
