//! Lazy provisioning of collections and recordings on first reference

use crate::gateway::store::RecordingStore;
use crate::gateway::types::{GatewayError, GatewayResult, Mode};

/// Length bound on sanitized identifiers.
const MAX_IDENTIFIER_LEN: usize = 50;

/// Derive the canonical identifier from a human-supplied title.
///
/// Lowercases, collapses every run of non-alphanumeric characters to a
/// single `-`, trims separators, and bounds the length. Idempotent:
/// `sanitize_title(sanitize_title(t)) == sanitize_title(t)`.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len().min(MAX_IDENTIFIER_LEN));
    let mut pending_sep = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
        if out.len() >= MAX_IDENTIFIER_LEN {
            break;
        }
    }

    out.truncate(MAX_IDENTIFIER_LEN);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Outcome of provisioning one recording reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provisioned {
    /// Canonical recording identifier to continue with.
    pub rec: String,
    /// True when the identifier differs from the supplied title and the
    /// caller must redirect to the corrected path.
    pub needs_redirect: bool,
}

/// Resolve a recording title to its canonical identifier, creating the
/// collection and (in record mode) the recording on first reference.
///
/// Replay of an unknown recording fails with `NoSuchRecording` and never
/// creates anything, but a title whose identifier differs always resolves
/// to a redirect before that check can fire.
pub async fn ensure_recording(
    store: &dyn RecordingStore,
    user: &str,
    coll: &str,
    title: &str,
    mode: Mode,
) -> GatewayResult<Provisioned> {
    if store.has_recording(user, coll, title).await {
        return Ok(Provisioned {
            rec: title.to_string(),
            needs_redirect: false,
        });
    }

    let rec = sanitize_title(title);

    if !store.has_collection(user, coll).await {
        store.create_collection(user, coll).await?;
    }

    if mode == Mode::Record && (rec == title || !store.has_recording(user, coll, &rec).await) {
        store.create_recording(user, coll, &rec, title).await?;
    }

    if rec != title {
        return Ok(Provisioned {
            rec,
            needs_redirect: true,
        });
    }

    if mode == Mode::Replay {
        return Err(GatewayError::NoSuchRecording {
            id: title.to_string(),
        });
    }

    Ok(Provisioned {
        rec,
        needs_redirect: false,
    })
}
