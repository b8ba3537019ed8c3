//! Link rewriting helpers used by body normalization

/// Query marker the forum's outbound redirector puts in front of the real URL
pub const REDIRECT_MARKER: &str = "?url=";

const YOUTUBE_WATCH: &str = "https://www.youtube.com/watch?v=";

/// Recovers the original target of an outbound link
///
/// The forum wraps external links as
/// `https://ref.gamer.com.tw/redir.php?url=https%3A%2F%2Fexample.com%2F`.
/// The href is percent-decoded and everything after the last `?url=` marker
/// is returned. Links without the marker come back decoded but otherwise
/// untouched.
pub fn decode_outbound_link(href: &str) -> String {
    let decoded = match urlencoding::decode(href) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => href.to_string(),
    };

    match decoded.rfind(REDIRECT_MARKER) {
        Some(index) => decoded[index + REDIRECT_MARKER.len()..].to_string(),
        None => decoded,
    }
}

/// Rebuilds the canonical watch URL from an embedded player source
///
/// `https://www.youtube.com/embed/abc123?autoplay=0` becomes
/// `https://www.youtube.com/watch?v=abc123`. Returns None when the source has
/// no usable trailing path segment.
pub fn youtube_watch_url(embed_src: &str) -> Option<String> {
    let without_query = embed_src.split(['?', '#']).next()?;
    let id = without_query.trim_end_matches('/').rsplit('/').next()?;

    if id.is_empty() || id.contains(':') {
        return None;
    }

    Some(format!("{}{}", YOUTUBE_WATCH, id))
}

/// Chooses the permalink for a post
///
/// Absolute hrefs are kept, protocol-relative ones are upgraded to https, and
/// anything else (relative, empty, missing) falls back to the page the post
/// was found on.
pub fn resolve_permalink(href: Option<&str>, fallback: &str) -> String {
    match href.map(str::trim) {
        Some(h) if h.starts_with("https://") || h.starts_with("http://") => h.to_string(),
        Some(h) if h.starts_with("//") && h.len() > 2 => format!("https:{}", h),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_redirected_link() {
        let href = "https://ref.gamer.com.tw/redir.php?url=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1";
        assert_eq!(decode_outbound_link(href), "https://example.com/a?b=1");
    }

    #[test]
    fn test_decode_uses_last_marker() {
        let href = "https://ref.gamer.com.tw/redir.php?url=https%3A%2F%2Fx.com%2Fr%3Furl%3Dhttps%3A%2F%2Fy.com";
        assert_eq!(decode_outbound_link(href), "https://y.com");
    }

    #[test]
    fn test_decode_plain_link() {
        assert_eq!(
            decode_outbound_link("https://example.com/%E5%B7%B4"),
            "https://example.com/巴"
        );
    }

    #[test]
    fn test_youtube_watch_url() {
        assert_eq!(
            youtube_watch_url("https://www.youtube.com/embed/dQw4w9WgXcQ?enablejsapi=1"),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_watch_url("//www.youtube.com/embed/abc123/"),
            Some("https://www.youtube.com/watch?v=abc123".to_string())
        );
        assert_eq!(youtube_watch_url(""), None);
    }

    #[test]
    fn test_resolve_permalink() {
        let fallback = "https://forum.gamer.com.tw/C.php?bsn=1&snA=2&page=1";

        assert_eq!(
            resolve_permalink(Some("https://forum.gamer.com.tw/Co.php?bsn=1&sn=9"), fallback),
            "https://forum.gamer.com.tw/Co.php?bsn=1&sn=9"
        );
        assert_eq!(
            resolve_permalink(Some("//forum.gamer.com.tw/Co.php?bsn=1&sn=9"), fallback),
            "https://forum.gamer.com.tw/Co.php?bsn=1&sn=9"
        );
        assert_eq!(resolve_permalink(Some("Co.php?sn=9"), fallback), fallback);
        assert_eq!(resolve_permalink(Some(""), fallback), fallback);
        assert_eq!(resolve_permalink(None, fallback), fallback);
    }
}
