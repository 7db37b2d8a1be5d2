//! Entry extraction from one raw search-result document.
//!
//! Pipeline (order matters):
//!
//! 1. Parse the document into an HTML tree.
//! 2. Locate the main results region (falling back to the whole document
//!    when no known region container is present — relay wrapping can
//!    strip outer structure).
//! 3. Walk link-bearing nodes in document order, skipping links inside
//!    noise containers: ads/sponsored and thumbnail-only wrappers always,
//!    video blocks and related/series blocks when the corresponding
//!    filter is enabled.
//! 4. Resolve each link's effective target from `href` or the alternate
//!    `data-url` attribute, then normalise it.
//! 5. Keep only supported platforms with a resolvable content id.
//! 6. Deduplicate by identity, first occurrence wins.
//! 7. Truncate to the configured maximum and assign 1-based positions.
//!
//! Entry order exactly matches on-page order; positions are gap-free and
//! never reassigned after truncation.

use crate::config::RankConfig;
use crate::error::RankError;
use crate::identity;
use crate::types::ContentEntry;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use super::url_normalize::normalize_url;

/// Known containers for the main results list, tried in order. The
/// first selector with any match wins.
const REGION_SELECTORS: &[&str] = &["ul.lst_view", "ul.lst_total", "div.view_wrap", "#main_pack"];

/// Ad / sponsored containers. Always excluded.
const AD_CLASSES: &[&str] = &["link_ad", "splink_ad", "ad_area", "ad_section", "sponsored"];

/// Thumbnail-only wrappers. Always excluded — their links duplicate the
/// title link or point at image assets.
const THUMB_CLASSES: &[&str] = &["thumb", "thumb_area", "thumb_link", "img_box"];

/// Video-result blocks. Excluded when `filter_video` is set.
const VIDEO_CLASSES: &[&str] = &["video_area", "sp_nvideo", "video_bx"];

/// Related/series link blocks. Excluded when `filter_series` is set.
const SERIES_CLASSES: &[&str] = &["series_area", "sp_series", "relation_srch", "related_srch"];

/// Extract the ordered, deduplicated, length-capped entry list from one
/// raw document.
///
/// # Errors
///
/// Returns [`RankError::Parse`] only if a built-in selector fails to
/// compile. Malformed or empty documents yield an empty list.
pub fn extract_entries(html: &str, config: &RankConfig) -> Result<Vec<ContentEntry>, RankError> {
    let document = Html::parse_document(html);

    let link_sel = Selector::parse("a[href], a[data-url]")
        .map_err(|e| RankError::Parse(format!("invalid link selector: {e:?}")))?;

    let mut anchors: Vec<ElementRef> = Vec::new();
    let regions = result_regions(&document)?;
    if regions.is_empty() {
        anchors.extend(document.select(&link_sel));
    } else {
        for region in regions {
            anchors.extend(region.select(&link_sel));
        }
    }

    let mut entries: Vec<ContentEntry> = Vec::new();
    let mut seen: HashSet<crate::types::Identity> = HashSet::new();

    for anchor in anchors {
        if is_excluded(&anchor, config) {
            continue;
        }

        let Some(raw_target) = link_target(&anchor) else {
            continue;
        };

        let normalized = normalize_url(raw_target);
        let Ok(parsed) = Url::parse(&normalized) else {
            continue;
        };
        let Some(platform) = identity::classify_platform(&parsed) else {
            continue;
        };
        let Some(resolved) = identity::resolve(&normalized) else {
            continue;
        };
        // No content id means a decorative or profile link, not a result.
        if resolved.content_id.is_none() {
            continue;
        }
        if !seen.insert(resolved.clone()) {
            continue;
        }

        entries.push(ContentEntry {
            url: raw_target.to_string(),
            normalized_url: normalized,
            platform,
            identity: resolved,
            position: 0,
        });

        if entries.len() >= config.max_entries {
            break;
        }
    }

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index + 1;
    }

    tracing::debug!(count = entries.len(), "entries extracted");
    Ok(entries)
}

/// Find the main results region(s), trying known containers in order.
fn result_regions(document: &Html) -> Result<Vec<ElementRef<'_>>, RankError> {
    for css in REGION_SELECTORS {
        let sel = Selector::parse(css)
            .map_err(|e| RankError::Parse(format!("invalid region selector: {e:?}")))?;
        let regions: Vec<ElementRef<'_>> = document.select(&sel).collect();
        if !regions.is_empty() {
            return Ok(regions);
        }
    }
    Ok(Vec::new())
}

/// The anchor's effective target: `href` unless empty or a fragment,
/// else the alternate `data-url` attribute.
fn link_target<'a>(anchor: &ElementRef<'a>) -> Option<&'a str> {
    anchor
        .value()
        .attr("href")
        .filter(|h| !h.trim().is_empty() && !h.starts_with('#'))
        .or_else(|| anchor.value().attr("data-url"))
}

/// Whether the anchor or any ancestor sits in an excluded container.
fn is_excluded(anchor: &ElementRef<'_>, config: &RankConfig) -> bool {
    if element_excluded(anchor, config) {
        return true;
    }
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| element_excluded(&el, config))
}

fn element_excluded(el: &ElementRef<'_>, config: &RankConfig) -> bool {
    if has_class(el, AD_CLASSES) || has_class(el, THUMB_CLASSES) {
        return true;
    }
    if config.filter_video && has_class(el, VIDEO_CLASSES) {
        return true;
    }
    if config.filter_series && has_class(el, SERIES_CLASSES) {
        return true;
    }
    false
}

fn has_class(el: &ElementRef<'_>, classes: &[&str]) -> bool {
    el.value().classes().any(|c| classes.contains(&c))
}
