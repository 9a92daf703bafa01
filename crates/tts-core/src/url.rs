//! URL splitting and query parameter removal
//!
//! These functions work on the raw URL string so that every byte outside the
//! removed parameters survives untouched. Full WHATWG parsing is only used to
//! validate input and output (see [`crate::sanitizer`]).

use std::borrow::Cow;

use crate::registry::TokenSet;
use crate::types::SchemeMask;

// =============================================================================
// Scheme Extraction
// =============================================================================

/// Fast scheme extraction without URL parsing.
/// Returns the scheme mask, or None for anything but `http`/`https`.
#[inline]
pub fn extract_scheme(url: &str) -> Option<SchemeMask> {
    let bytes = url.as_bytes();
    let has_prefix = |prefix: &[u8]| {
        bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix)
    };

    if has_prefix(b"https://") {
        Some(SchemeMask::HTTPS)
    } else if has_prefix(b"http://") {
        Some(SchemeMask::HTTP)
    } else {
        None
    }
}

/// True for `http://` and `https://` URLs.
#[inline]
pub fn is_web_url(url: &str) -> bool {
    extract_scheme(url).is_some_and(|s| SchemeMask::WEB.contains(s))
}

// =============================================================================
// URL Parts
// =============================================================================

/// A URL split around its query string.
///
/// `base` runs up to (not including) the `?`, `query` excludes the `?`, and
/// `fragment` includes its leading `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub base: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

/// Split a URL into base, query and fragment.
///
/// A `?` that appears after the first `#` belongs to the fragment.
pub fn split_url(url: &str) -> UrlParts<'_> {
    let (before_fragment, fragment) = match url.find('#') {
        Some(hash_pos) => (&url[..hash_pos], Some(&url[hash_pos..])),
        None => (url, None),
    };

    match before_fragment.find('?') {
        Some(q_pos) => UrlParts {
            base: &before_fragment[..q_pos],
            query: Some(&before_fragment[q_pos + 1..]),
            fragment,
        },
        None => UrlParts {
            base: before_fragment,
            query: None,
            fragment,
        },
    }
}

// =============================================================================
// Query Parameter Handling
// =============================================================================

/// Decode the key of a single `key=value` pair using form-urlencoded rules.
///
/// `+` becomes a space and percent escapes are decoded, so `utm%5Fsource`
/// matches `utm_source`.
pub fn query_key(pair: &str) -> Cow<'_, str> {
    let raw = match pair.find('=') {
        Some(eq_pos) => &pair[..eq_pos],
        None => pair,
    };

    if !raw.bytes().any(|b| b == b'%' || b == b'+') {
        return Cow::Borrowed(raw);
    }

    ::url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| Cow::Owned(key.into_owned()))
        .unwrap_or(Cow::Borrowed(raw))
}

/// Outcome of removing parameters from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedUrl {
    pub url: String,
    /// Decoded keys that were removed, in URL order
    pub removed: Vec<String>,
}

/// Remove every query parameter whose decoded key is in `tokens`.
/// Returns the modified URL, or None if no changes.
///
/// Untouched pairs are kept verbatim and in order. Path and fragment are
/// never modified. Empty segments are dropped along with any removal, and if
/// no pairs remain, the `?` is dropped as well.
pub fn remove_query_params(url: &str, tokens: &TokenSet) -> Option<StrippedUrl> {
    let parts = split_url(url);
    let query = parts.query?;

    if query.is_empty() {
        return None;
    }

    let mut kept = Vec::new();
    let mut removed = Vec::new();

    for pair in query.split('&') {
        let key = query_key(pair);
        if tokens.contains(&key) {
            removed.push(key.into_owned());
        } else {
            kept.push(pair);
        }
    }

    if removed.is_empty() {
        return None;
    }

    // Empty `&&` segments go once the query is rewritten anyway
    kept.retain(|pair| !pair.is_empty());

    let fragment = parts.fragment.unwrap_or("");
    let url = if kept.is_empty() {
        format!("{}{}", parts.base, fragment)
    } else {
        format!("{}?{}{}", parts.base, kept.join("&"), fragment)
    };

    Some(StrippedUrl { url, removed })
}
