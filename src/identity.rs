//! Identity resolution: content URL → `(owner_id, content_id)`.
//!
//! Every supported URL shape for the same logical item collapses to one
//! canonical string pair, so rank matching can compare identities with
//! plain equality. Content ids must be purely numeric with a minimum
//! length — anything shorter or non-numeric resolves to `None` rather
//! than a guess, as do opaque redirectors.

use crate::extract::url_normalize::normalize_url;
use crate::types::{Identity, Platform};
use url::Url;

/// Minimum digit count for an accepted content id. One consistent
/// threshold across every URL-shape branch.
pub const MIN_CONTENT_ID_DIGITS: usize = 7;

/// Hosts serving standard blog posts (desktop + mobile-prefixed).
const BLOG_HOSTS: &[&str] = &["blog.naver.com", "m.blog.naver.com"];

/// Hosts serving creator content pages.
const CREATOR_HOSTS: &[&str] = &["in.naver.com", "m.in.naver.com"];

/// Query-parameter detail pages on the blog host.
const DETAIL_PAGES: &[&str] = &["PostView.naver", "PostView.nhn"];

/// Owner / content query parameters of the detail form.
const OWNER_PARAM: &str = "blogId";
const CONTENT_PARAM: &str = "logNo";

/// Classify a parsed URL by content-hosting platform.
///
/// Returns `None` for hosts outside the supported platforms — such URLs
/// are discarded during extraction.
pub fn classify_platform(url: &Url) -> Option<Platform> {
    let host = url.host_str()?;
    if BLOG_HOSTS.contains(&host) {
        Some(Platform::Blog)
    } else if CREATOR_HOSTS.contains(&host) {
        Some(Platform::Creator)
    } else {
        None
    }
}

/// Resolve a content URL to its two-part identity.
///
/// Supported shapes:
/// - canonical: `blog.naver.com/{owner}/{content}`
/// - mobile-prefixed variant of the canonical form
/// - detail form: `blog.naver.com/PostView.naver?blogId={owner}&logNo={content}`
///   (legacy `PostView.nhn` included)
/// - creator form: `in.naver.com/{owner}/contents/internal/{content}`
///
/// Returns `None` for unsupported hosts or URLs with no owner segment.
/// A resolvable owner with an unacceptable content token yields an
/// identity with `content_id: None`.
pub fn resolve(raw: &str) -> Option<Identity> {
    let normalized = normalize_url(raw);
    let parsed = Url::parse(&normalized).ok()?;
    match classify_platform(&parsed)? {
        Platform::Blog => resolve_blog(&parsed),
        Platform::Creator => resolve_creator(&parsed),
    }
}

/// Build the canonical display URL for a fully resolved identity.
pub fn canonical_url(identity: &Identity) -> Option<String> {
    identity
        .content_id
        .as_ref()
        .map(|content| format!("https://blog.naver.com/{}/{}", identity.owner_id, content))
}

fn resolve_blog(url: &Url) -> Option<Identity> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    // Query-parameter detail form.
    if segments.first().is_some_and(|s| DETAIL_PAGES.contains(s)) {
        let owner = url
            .query_pairs()
            .find(|(key, _)| key == OWNER_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|v| !v.is_empty())?;
        let content = url
            .query_pairs()
            .find(|(key, _)| key == CONTENT_PARAM)
            .and_then(|(_, value)| numeric_content_id(&value));
        return Some(Identity {
            owner_id: owner,
            content_id: content,
        });
    }

    match segments.as_slice() {
        [] => None,
        [owner] => Some(Identity {
            owner_id: (*owner).to_string(),
            content_id: None,
        }),
        [owner, content, ..] => Some(Identity {
            owner_id: (*owner).to_string(),
            content_id: numeric_content_id(content),
        }),
    }
}

fn resolve_creator(url: &Url) -> Option<Identity> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => None,
        [owner, "contents", "internal", content, ..] => Some(Identity {
            owner_id: (*owner).to_string(),
            content_id: numeric_content_id(content),
        }),
        [owner, ..] => Some(Identity {
            owner_id: (*owner).to_string(),
            content_id: None,
        }),
    }
}

/// Accept a token as a content id only if it is purely numeric and long
/// enough. Short or mixed tokens are near-certainly decorative fragments.
fn numeric_content_id(token: &str) -> Option<String> {
    let token = token.trim();
    if token.len() >= MIN_CONTENT_ID_DIGITS && token.bytes().all(|b| b.is_ascii_digit()) {
        Some(token.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_resolves() {
        let identity = resolve("https://blog.naver.com/gardener_kim/2231234567").expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert_eq!(identity.content_id.as_deref(), Some("2231234567"));
    }

    #[test]
    fn mobile_form_equals_canonical() {
        let canonical = resolve("https://blog.naver.com/gardener_kim/2231234567").expect("resolve");
        let mobile = resolve("https://m.blog.naver.com/gardener_kim/2231234567").expect("resolve");
        assert_eq!(canonical, mobile);
    }

    #[test]
    fn detail_form_equals_canonical() {
        let canonical = resolve("https://blog.naver.com/gardener_kim/2231234567").expect("resolve");
        let detail = resolve(
            "https://blog.naver.com/PostView.naver?blogId=gardener_kim&logNo=2231234567",
        )
        .expect("resolve");
        assert_eq!(canonical, detail);
    }

    #[test]
    fn legacy_detail_page_supported() {
        let identity =
            resolve("https://blog.naver.com/PostView.nhn?blogId=gardener_kim&logNo=2231234567")
                .expect("resolve");
        assert_eq!(identity.content_id.as_deref(), Some("2231234567"));
    }

    #[test]
    fn creator_form_resolves() {
        let identity =
            resolve("https://in.naver.com/gardener_kim/contents/internal/2231234567")
                .expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert_eq!(identity.content_id.as_deref(), Some("2231234567"));
    }

    #[test]
    fn round_trip_canonical_url() {
        let identity = Identity {
            owner_id: "gardener_kim".into(),
            content_id: Some("2231234567".into()),
        };
        let url = canonical_url(&identity).expect("canonical url");
        let resolved = resolve(&url).expect("resolve");
        assert_eq!(resolved, identity);
    }

    #[test]
    fn canonical_url_requires_content_id() {
        let owner_only = Identity {
            owner_id: "gardener_kim".into(),
            content_id: None,
        };
        assert!(canonical_url(&owner_only).is_none());
    }

    #[test]
    fn short_numeric_token_rejected() {
        let identity = resolve("https://blog.naver.com/gardener_kim/123456").expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert!(identity.content_id.is_none());
    }

    #[test]
    fn non_numeric_token_rejected() {
        let identity =
            resolve("https://blog.naver.com/gardener_kim/about-me-page").expect("resolve");
        assert!(identity.content_id.is_none());
    }

    #[test]
    fn minimum_length_boundary() {
        // Exactly MIN_CONTENT_ID_DIGITS digits is accepted.
        let identity = resolve("https://blog.naver.com/owner/1234567").expect("resolve");
        assert_eq!(identity.content_id.as_deref(), Some("1234567"));
    }

    #[test]
    fn owner_only_url_resolves_without_content() {
        let identity = resolve("https://blog.naver.com/gardener_kim").expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert!(identity.content_id.is_none());
    }

    #[test]
    fn unsupported_host_is_none() {
        assert!(resolve("https://example.com/gardener_kim/2231234567").is_none());
        assert!(resolve("https://cafe.naver.com/somecafe/12345678").is_none());
    }

    #[test]
    fn unparseable_input_is_none() {
        assert!(resolve("not a url").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn detail_form_without_owner_is_none() {
        assert!(resolve("https://blog.naver.com/PostView.naver?logNo=2231234567").is_none());
    }

    #[test]
    fn detail_form_with_short_log_no_keeps_owner() {
        let identity =
            resolve("https://blog.naver.com/PostView.naver?blogId=gardener_kim&logNo=99")
                .expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert!(identity.content_id.is_none());
    }

    #[test]
    fn redirector_wrapped_url_resolves() {
        let identity = resolve(
            "https://link.naver.com/bridge?url=https%3A%2F%2Fblog.naver.com%2Fgardener_kim%2F2231234567",
        )
        .expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert_eq!(identity.content_id.as_deref(), Some("2231234567"));
    }

    #[test]
    fn opaque_redirector_is_none() {
        assert!(resolve("https://link.naver.com/bridge?token=abc123").is_none());
    }

    #[test]
    fn creator_profile_url_has_no_content() {
        let identity = resolve("https://in.naver.com/gardener_kim").expect("resolve");
        assert_eq!(identity.owner_id, "gardener_kim");
        assert!(identity.content_id.is_none());
    }

    #[test]
    fn classify_platform_by_host() {
        let blog = Url::parse("https://blog.naver.com/owner/1234567").expect("url");
        assert_eq!(classify_platform(&blog), Some(Platform::Blog));

        let creator = Url::parse("https://in.naver.com/owner").expect("url");
        assert_eq!(classify_platform(&creator), Some(Platform::Creator));

        let other = Url::parse("https://example.com/owner").expect("url");
        assert_eq!(classify_platform(&other), None);
    }
}
