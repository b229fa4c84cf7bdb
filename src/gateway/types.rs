//! Type definitions for the gateway module

use nutype::nutype;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ========== Literals ==========

/// Recording name used when a bare `/record/<url>` request is redirected
/// into the anonymous collection.
pub const DEFAULT_RECORDING_NAME: &str = "my-recording";

/// Collection name for the anonymous-session flow.
pub const ANONYMOUS_COLLECTION: &str = "anonymous";

/// Token standing in for "whole collection" where a recording name would go.
pub const WILDCARD_RECORDING: &str = "*";

// ========== Identifiers ==========

/// Path-safe user identifier derived from the session's anonymous identity
#[nutype(
    derive(Clone, Debug, Display, PartialEq, Eq, Hash, Deserialize, Serialize, TryFrom, AsRef),
    validate(predicate = |s: &str| !s.is_empty()),
)]
pub struct UserId(String);

// ========== Mode ==========

/// Request mode, selecting which backend and parameter set handles a request
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[display("live")]
    Live,
    #[display("record")]
    Record,
    #[display("replay")]
    Replay,
    #[display("replay-coll")]
    ReplayColl,
}

impl Mode {
    /// Whether results produced under this mode are fresh fetches rather
    /// than archived captures.
    pub fn is_live(self) -> bool {
        matches!(self, Mode::Live | Mode::Record)
    }

    /// Whether this mode runs the provisioning/redirect logic.
    pub fn provisions(self) -> bool {
        matches!(self, Mode::Record | Mode::Replay)
    }
}

// ========== Recording token ==========

/// Either a concrete recording name or the whole-collection wildcard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingToken {
    Named(String),
    Wildcard,
}

impl RecordingToken {
    /// The string form used in upstream parameters (`*` for the wildcard).
    pub fn as_str(&self) -> &str {
        match self {
            RecordingToken::Named(name) => name,
            RecordingToken::Wildcard => WILDCARD_RECORDING,
        }
    }

    /// The concrete name, if this token is not the wildcard.
    pub fn name(&self) -> Option<&str> {
        match self {
            RecordingToken::Named(name) => Some(name),
            RecordingToken::Wildcard => None,
        }
    }
}

// ========== Resolved request ==========

/// A fully disambiguated request, built fresh per inbound request and
/// never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub user: UserId,
    pub coll: String,
    pub rec: RecordingToken,
    pub mode: Mode,
    /// Target URL, including the re-appended query string.
    pub wb_url: String,
    /// Closest-timestamp hint for replay snapshot selection.
    pub closest: String,
}

// ========== Errors ==========

/// Errors produced while classifying, provisioning, or dispatching
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Replay of a recording that was never created.
    #[error("No Such Recording")]
    NoSuchRecording { id: String },

    /// Download target recording does not exist.
    #[error("Recording not found")]
    RecordingNotFound { id: String },

    /// Download target collection does not exist.
    #[error("Collection not found")]
    CollectionNotFound { id: String },

    /// Backend export call failed or answered with an error status. The
    /// backend's own error body is logged, never forwarded.
    #[error("Unable to download WARC")]
    DownloadFailed,

    /// Upstream resource call could not be completed.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// An internal invariant was broken. Indicates a defect, not bad input.
    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
