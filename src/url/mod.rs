//! URL handling module for Floorwatch
//!
//! This module knows the shape of the forum's URLs: how a thread page is
//! addressed, how outbound links are wrapped by the forum's redirector, and
//! how embedded players map back to their canonical video pages.

mod links;
mod thread;

pub use links::{decode_outbound_link, resolve_permalink, youtube_watch_url, REDIRECT_MARKER};
pub use thread::{thread_endpoint, thread_page_url, DEFAULT_FORUM_BASE};
