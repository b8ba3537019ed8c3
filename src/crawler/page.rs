//! Thread page parser
//!
//! Splits the markup of one thread page into the thread title, the page count
//! and the raw post fragments in document order.

use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.c-menu__scrolldown h1.title").expect("Failed to parse title selector")
});

static PAGINATION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p.BH-pagebtnA a").expect("Failed to parse pagination selector")
});

static POST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"section.c-section[id^="post"]"#).expect("Failed to parse post selector")
});

/// Markup of a single post, detached from the page it came from
///
/// `scraper::Html` is not `Send`, so fragments carry their outer HTML and are
/// parsed again by the post parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPostFragment {
    pub html: String,
}

/// Extracted information from a thread page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Thread title from the page header
    pub title: String,

    /// Number of pages the thread had when this page was served
    pub total_pages: u32,

    /// Post fragments in document order
    pub posts: Vec<RawPostFragment>,
}

/// Parses the markup of a thread page
///
/// # Arguments
///
/// * `html` - The page markup
///
/// # Returns
///
/// * `Ok(ParsedPage)` - Successfully parsed page
/// * `Err(ParseError::MissingTitle)` - The page has no thread header, which
///   happens when a thread was deleted or moved
pub fn parse_page(html: &str) -> Result<ParsedPage, ParseError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or(ParseError::MissingTitle)?;

    let total_pages = extract_total_pages(&document);

    let posts = document
        .select(&POST_SELECTOR)
        .map(|section| RawPostFragment {
            html: section.html(),
        })
        .collect();

    Ok(ParsedPage {
        title,
        total_pages,
        posts,
    })
}

/// Reads the page count from the pagination control
///
/// The last entry is normally the highest page number. When it is something
/// else (a "next" arrow), the largest numeric entry is used. Threads with a
/// single page have no control at all.
fn extract_total_pages(document: &Html) -> u32 {
    let entries: Vec<ElementRef<'_>> = document.select(&PAGINATION_SELECTOR).collect();

    let numeric = |element: &ElementRef<'_>| {
        element
            .text()
            .collect::<String>()
            .trim()
            .parse::<u32>()
            .ok()
    };

    entries
        .last()
        .and_then(numeric)
        .or_else(|| entries.iter().filter_map(numeric).max())
        .unwrap_or(1)
        .max(1)
}
