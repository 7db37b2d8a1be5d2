//! Shared HTTP client and wire-format helpers for relay requests.
//!
//! Provides a configured [`reqwest::Client`] with cookie support and
//! rotating User-Agent strings, the browser-like header set the upstream
//! engine requires, and the fixed search-URL builder.
//!
//! Timeouts are **not** set on the client: every relay attempt supplies
//! its own per-request timeout that grows with candidate position.

use crate::config::RankConfig;
use crate::error::RankError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::seq::SliceRandom;

/// The search engine host queried through relays.
pub const SEARCH_HOST: &str = "https://search.naver.com";

/// Content-type discriminator for the search vertical being ranked.
pub const CONTENT_TYPE: &str = "view";

/// Percent-encoding set matching `encodeURIComponent`: everything except
/// RFC 3986 unreserved characters.
pub const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Realistic desktop-browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build the fixed search-engine URL for one keyword.
///
/// Shape: `SEARCH_HOST/search.naver?where=<content type>&query=<keyword>`,
/// with the keyword percent-encoded.
pub fn search_url(keyword: &str) -> String {
    format!(
        "{SEARCH_HOST}/search.naver?where={CONTENT_TYPE}&query={}",
        utf8_percent_encode(keyword, COMPONENT)
    )
}

/// Build the outbound relay request URL: `base_url + percent_encode(target)`.
pub fn relay_url(base_url: &str, target: &str) -> String {
    format!("{base_url}{}", utf8_percent_encode(target, COMPONENT))
}

/// Build a [`reqwest::Client`] configured for relay-proxied scraping.
///
/// The client has:
/// - Cookie store enabled
/// - Random User-Agent from the built-in rotation list (or custom if configured)
/// - Brotli and gzip decompression
/// - No client-level timeout (per-request timeouts are supplied by callers)
///
/// # Errors
///
/// Returns [`RankError::Http`] if the client cannot be constructed.
pub fn build_client(config: &RankConfig) -> Result<reqwest::Client, RankError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| RankError::Http(format!("failed to build HTTP client: {e}")))
}

/// Apply the browser-like headers the upstream engine expects.
///
/// The Referer is pinned to the search host so relay-forwarded requests
/// look like in-site navigation.
pub fn browser_headers(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    request
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
        .header("Referer", format!("{SEARCH_HOST}/"))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}
