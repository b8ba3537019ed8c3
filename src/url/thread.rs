//! Thread page addressing

use crate::{UrlError, UrlResult};
use url::Url;

/// Default forum origin
pub const DEFAULT_FORUM_BASE: &str = "https://forum.gamer.com.tw";

/// Path of the thread viewer relative to the forum origin
const THREAD_VIEWER: &str = "C.php";

/// Resolves the thread viewer endpoint against a forum base URL
///
/// # Arguments
///
/// * `base` - Forum origin, e.g. `https://forum.gamer.com.tw`
///
/// # Returns
///
/// * `Ok(Url)` - The `C.php` endpoint without a query
/// * `Err(UrlError)` - The base is not an absolute http(s) URL
pub fn thread_endpoint(base: &str) -> UrlResult<Url> {
    let mut base = Url::parse(base)?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(UrlError::InvalidScheme(base.scheme().to_string()));
    }

    // A base without a trailing slash would have its last segment replaced by join
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    Ok(base.join(THREAD_VIEWER)?)
}

/// Builds the URL of one page of a thread
///
/// Produces `{endpoint}?bsn={board_id}&snA={thread_id}&page={page}`.
pub fn thread_page_url(endpoint: &Url, board_id: u64, thread_id: u64, page: u32) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("bsn", &board_id.to_string())
        .append_pair("snA", &thread_id.to_string())
        .append_pair("page", &page.to_string());
    url
}
