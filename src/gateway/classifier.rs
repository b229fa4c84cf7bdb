//! Path classification for ambiguous anonymous-route paths
//!
//! A path under `/anonymous/` either starts with a recording name or is
//! already a wayback-style URL (optional timestamp/modifier prefix followed
//! by `http(s)://` or `//`). The URL-shape test is a pluggable predicate so
//! the policy can be swapped or stubbed in tests independently of routing.

use crate::gateway::types::RecordingToken;
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Recognizes wayback-style URL paths: `[<timestamp>][<modifier>_]/` then
/// `http://`, `https://`, or a scheme-relative `//`.
static WB_URL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((\d*)([a-z]+_)?/)?(https?:)?//").expect("wb-url pattern is valid")
});

/// Predicate deciding whether a path suffix is already URL-shaped
pub trait UrlShape: Send + Sync {
    fn looks_like_url(&self, path: &str) -> bool;
}

/// Default URL-shape policy backed by the wayback-url pattern
#[derive(Clone, Copy, Debug, Default)]
pub struct WbUrlShape;

impl UrlShape for WbUrlShape {
    fn looks_like_url(&self, path: &str) -> bool {
        WB_URL_RX.is_match(path)
    }
}

/// Splits an anonymous-route path into a recording token and the remaining
/// target URL
#[derive(Clone)]
pub struct PathClassifier {
    shape: Arc<dyn UrlShape>,
}

impl PathClassifier {
    pub fn new() -> Self {
        Self {
            shape: Arc::new(WbUrlShape),
        }
    }

    /// Swap in an alternative URL-shape policy.
    pub fn with_shape(shape: Arc<dyn UrlShape>) -> Self {
        Self { shape }
    }

    /// Classify a path with the route prefix already stripped.
    ///
    /// A leading segment is taken as a recording name only when the path is
    /// not itself URL-shaped and contains at least one `/`. Everything else
    /// is whole-collection replay of the full path.
    ///
    /// Known quirk, kept deliberately: `example.com/` classifies as the
    /// recording `example.com` with an empty remaining URL, not as a
    /// wildcard replay of `example.com/`.
    pub fn classify(&self, path: &str) -> (RecordingToken, String) {
        if !self.shape.looks_like_url(path) && path.contains('/') {
            let (rec, rest) = path.split_once('/').unwrap_or((path, ""));
            (RecordingToken::Named(rec.to_string()), rest.to_string())
        } else {
            (RecordingToken::Wildcard, path.to_string())
        }
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the closest-timestamp hint from a wayback-style URL.
///
/// Leading digits before the scheme become the hint; without them the
/// literal `now` is used, matching replay-backend convention.
pub fn closest_hint(wb_url: &str) -> String {
    let digits = WB_URL_RX
        .captures(wb_url)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or("");

    if digits.is_empty() {
        "now".to_string()
    } else {
        digits.to_string()
    }
}

/// Re-append the request's query string to a captured wildcard path.
///
/// Wildcard route captures drop the query string, but the target URL must
/// carry it into the upstream call, so this is an explicit step.
pub fn add_query(wb_url: &str, query: Option<&str>) -> String {
    match query {
        Some(qs) if !qs.is_empty() => format!("{wb_url}?{qs}"),
        _ => wb_url.to_string(),
    }
}
