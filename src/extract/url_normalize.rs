//! URL normalisation for extracted result links.
//!
//! Search-result hrefs arrive percent-escaped, wrapped in redirectors,
//! and littered with tracking parameters. Normalisation produces the
//! clean content URL that identity resolution and display both use:
//!
//! 1. Percent-decode doubly-encoded URLs (relay-wrapped documents emit
//!    `https%3A%2F%2F…` hrefs).
//! 2. Recursively unwrap known redirector wrappers via their inner
//!    `url=` parameter.
//! 3. Strip tracking query parameters — the identity-bearing detail-form
//!    parameters (`blogId`, `logNo`) are never stripped.
//! 4. Drop fragments and trailing slashes.

use percent_encoding::percent_decode_str;
use url::Url;

/// Hosts whose URLs are wrappers around an inner `url=`/`quest=` target.
const REDIRECTOR_HOSTS: &[&str] = &[
    "link.naver.com",
    "api.allorigins.win",
    "corsproxy.io",
    "api.codetabs.com",
    "thingproxy.freeboard.io",
];

/// Query parameters redirectors use to carry the wrapped target.
const REDIRECT_PARAMS: &[&str] = &["url", "quest"];

/// Tracking query parameters stripped during normalisation (lowercased).
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "trackingcode",
    "proxyreferer",
    "referrercode",
];

/// Wrapper-unwrap recursion bound.
const MAX_UNWRAP_DEPTH: usize = 4;

/// Normalise a raw href into a clean content URL.
///
/// If the input cannot be parsed as a URL after decoding and unwrapping,
/// it is returned as-is — callers decide whether an unparseable string
/// is discardable.
pub fn normalize_url(raw: &str) -> String {
    let mut current = raw.trim().to_string();

    // Doubly-encoded hrefs from relay-wrapped documents.
    if current.starts_with("http%3A") || current.starts_with("https%3A") {
        current = percent_decode_str(&current).decode_utf8_lossy().into_owned();
    }

    // Protocol-relative links.
    if current.starts_with("//") {
        current = format!("https:{current}");
    }

    current = unwrap_redirectors(&current, 0);

    let Ok(mut parsed) = Url::parse(&current) else {
        return current;
    };

    parsed.set_fragment(None);
    strip_tracking_params(&mut parsed);

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string()
}

/// Recursively extract the inner target from known redirector wrappers.
///
/// A wrapper that carries no recognised inner parameter is returned
/// unchanged — opaque redirectors cannot be resolved without following
/// them, and downstream identity resolution will reject them.
fn unwrap_redirectors(raw: &str, depth: usize) -> String {
    if depth >= MAX_UNWRAP_DEPTH {
        return raw.to_string();
    }
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return raw.to_string();
    };

    let is_redirector = REDIRECTOR_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{h}")));
    if !is_redirector {
        return raw.to_string();
    }

    let inner = parsed
        .query_pairs()
        .find(|(key, _)| REDIRECT_PARAMS.contains(&key.as_ref()))
        .map(|(_, value)| value.into_owned());

    match inner {
        Some(inner) if !inner.is_empty() => unwrap_redirectors(&inner, depth + 1),
        _ => raw.to_string(),
    }
}

/// Remove tracking parameters, preserving everything else in order.
fn strip_tracking_params(url: &mut Url) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let qs: String = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&qs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_passes_through() {
        let result = normalize_url("https://blog.naver.com/gardener/2231234567");
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn percent_encoded_url_decoded() {
        let result = normalize_url("https%3A%2F%2Fblog.naver.com%2Fgardener%2F2231234567");
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn protocol_relative_url_gets_https() {
        let result = normalize_url("//blog.naver.com/gardener/2231234567");
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn redirector_unwrapped() {
        let result = normalize_url(
            "https://link.naver.com/bridge?url=https%3A%2F%2Fblog.naver.com%2Fgardener%2F2231234567",
        );
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn nested_redirectors_unwrapped_recursively() {
        let inner = "https://blog.naver.com/gardener/2231234567";
        let once = format!(
            "https://link.naver.com/bridge?url={}",
            percent_encoding::utf8_percent_encode(inner, crate::http::COMPONENT)
        );
        let twice = format!(
            "https://api.allorigins.win/raw?url={}",
            percent_encoding::utf8_percent_encode(&once, crate::http::COMPONENT)
        );
        assert_eq!(normalize_url(&twice), inner);
    }

    #[test]
    fn opaque_redirector_returned_unchanged() {
        let raw = "https://link.naver.com/bridge?token=abc123";
        let result = normalize_url(raw);
        assert!(result.starts_with("https://link.naver.com/bridge"));
    }

    #[test]
    fn tracking_params_stripped() {
        let result = normalize_url(
            "https://blog.naver.com/gardener/2231234567?utm_source=share&fbclid=xyz",
        );
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn detail_form_params_preserved() {
        let result = normalize_url(
            "https://blog.naver.com/PostView.naver?blogId=gardener&logNo=2231234567&utm_source=share",
        );
        assert_eq!(
            result,
            "https://blog.naver.com/PostView.naver?blogId=gardener&logNo=2231234567"
        );
    }

    #[test]
    fn fragment_removed() {
        let result = normalize_url("https://blog.naver.com/gardener/2231234567#comments");
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn trailing_slash_removed() {
        let result = normalize_url("https://blog.naver.com/gardener/2231234567/");
        assert_eq!(result, "https://blog.naver.com/gardener/2231234567");
    }

    #[test]
    fn unparseable_input_returned_unchanged() {
        assert_eq!(normalize_url("not a url"), "not a url");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn unwrap_depth_is_bounded() {
        // A self-referencing wrapper must terminate.
        let mut url = "https://blog.naver.com/gardener/2231234567".to_string();
        for _ in 0..8 {
            url = format!(
                "https://link.naver.com/bridge?url={}",
                percent_encoding::utf8_percent_encode(&url, crate::http::COMPONENT)
            );
        }
        let result = normalize_url(&url);
        // Bounded unwrapping stops early; it must not loop forever and
        // must still make progress.
        assert!(result.contains("link.naver.com") || result.contains("blog.naver.com"));
    }
}
