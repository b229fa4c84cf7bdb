//! Canonical-path redirect resolution for renamed recording titles

use crate::gateway::headers::{HOST, X_FORWARDED_PROTO};
use http::HeaderMap;

/// Compute the corrected path when a title sanitized to a different
/// identifier: the first occurrence of the title in the script path is
/// substituted and the remaining target URL re-appended.
///
/// Returns `None` when the identifier equals the title, which is what
/// guarantees redirect chains terminate after one hop.
pub fn resolve_redirect(script_path: &str, title: &str, rec: &str, wb_url: &str) -> Option<String> {
    if rec == title {
        return None;
    }

    let mut target = script_path.replacen(title, rec, 1);
    target.push_str(wb_url);
    Some(target)
}

/// Absolute form of a redirect target, using the request's `Host` header
/// and forwarded scheme when available. Falls back to the path-absolute
/// form, which clients resolve against the current origin anyway.
pub fn absolute_redirect(headers: &HeaderMap, target: &str) -> String {
    let host = headers.get(HOST).and_then(|value| value.to_str().ok());

    match host {
        Some(host) => {
            let scheme = headers
                .get(X_FORWARDED_PROTO)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("http");
            format!("{scheme}://{host}{target}")
        }
        None => target.to_string(),
    }
}
