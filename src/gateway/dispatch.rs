//! Upstream URL construction and per-mode dispatch
//!
//! Each mode maps to one fixed upstream template on either the record or
//! the replay backend. The templates are expressed as a tagged union so a
//! variant can only carry the parameters its template consumes; a missing
//! or extra parameter is unrepresentable.

use crate::gateway::types::{
    GatewayError, GatewayResult, Mode, RecordingToken, ResolvedRequest,
};
use serde_json::Value;

/// Backend endpoint addresses, supplied at startup
#[derive(Clone, Debug)]
pub struct BackendHosts {
    /// Capture/record backend base URL.
    pub record: String,
    /// Lookup/replay backend base URL.
    pub replay: String,
}

/// Download target kind for WARC exports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadKind {
    Recording,
    Collection,
}

impl DownloadKind {
    /// The `type=` parameter value on the export endpoint.
    pub fn as_param(self) -> &'static str {
        match self {
            DownloadKind::Recording => "rec",
            DownloadKind::Collection => "coll",
        }
    }
}

/// One upstream request, fully parameterized for its mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamSpec {
    Live {
        url: String,
        closest: String,
    },
    Record {
        url: String,
        closest: String,
        user: String,
        coll: String,
        rec: String,
    },
    Replay {
        url: String,
        closest: String,
        user: String,
        coll: String,
        rec: String,
    },
    ReplayColl {
        url: String,
        closest: String,
        user: String,
        coll: String,
    },
}

impl UpstreamSpec {
    /// Build the spec for a resolved request.
    ///
    /// A replay or record request carrying the wildcard token is a defect
    /// in the caller, not bad user input.
    pub fn for_request(resolved: &ResolvedRequest) -> GatewayResult<Self> {
        let url = resolved.wb_url.clone();
        let closest = resolved.closest.clone();
        let user = resolved.user.to_string();
        let coll = resolved.coll.clone();

        match resolved.mode {
            Mode::Live => Ok(UpstreamSpec::Live { url, closest }),
            Mode::Record => {
                let rec = Self::named_rec(&resolved.rec, Mode::Record)?;
                Ok(UpstreamSpec::Record {
                    url,
                    closest,
                    user,
                    coll,
                    rec,
                })
            }
            Mode::Replay => {
                let rec = Self::named_rec(&resolved.rec, Mode::Replay)?;
                Ok(UpstreamSpec::Replay {
                    url,
                    closest,
                    user,
                    coll,
                    rec,
                })
            }
            Mode::ReplayColl => Ok(UpstreamSpec::ReplayColl {
                url,
                closest,
                user,
                coll,
            }),
        }
    }

    fn named_rec(rec: &RecordingToken, mode: Mode) -> GatewayResult<String> {
        rec.name().map(str::to_string).ok_or_else(|| {
            GatewayError::Contract(format!("{mode} dispatch requires a concrete recording"))
        })
    }

    pub fn mode(&self) -> Mode {
        match self {
            UpstreamSpec::Live { .. } => Mode::Live,
            UpstreamSpec::Record { .. } => Mode::Record,
            UpstreamSpec::Replay { .. } => Mode::Replay,
            UpstreamSpec::ReplayColl { .. } => Mode::ReplayColl,
        }
    }
}

/// Maps upstream specs onto concrete backend URLs
#[derive(Clone, Debug)]
pub struct DispatchRouter {
    hosts: BackendHosts,
}

impl DispatchRouter {
    pub fn new(hosts: BackendHosts) -> Self {
        Self { hosts }
    }

    /// Render the upstream resource URL for a spec.
    pub fn upstream_url(&self, spec: &UpstreamSpec) -> String {
        match spec {
            UpstreamSpec::Live { url, closest } => format!(
                "{}/live/resource/postreq?url={}&closest={}",
                self.hosts.replay,
                urlencoding::encode(url),
                closest,
            ),
            UpstreamSpec::Record {
                url,
                closest,
                user,
                coll,
                rec,
            } => format!(
                "{}/record/live/resource/postreq?url={}&closest={}&param.recorder.user={}&param.recorder.coll={}&param.recorder.rec={}",
                self.hosts.record,
                urlencoding::encode(url),
                closest,
                user,
                coll,
                rec,
            ),
            UpstreamSpec::Replay {
                url,
                closest,
                user,
                coll,
                rec,
            } => format!(
                "{}/replay/resource/postreq?url={}&closest={}&param.replay.user={}&param.replay.coll={}&param.replay.rec={}",
                self.hosts.replay,
                urlencoding::encode(url),
                closest,
                user,
                coll,
                rec,
            ),
            UpstreamSpec::ReplayColl {
                url,
                closest,
                user,
                coll,
            } => format!(
                "{}/replay-coll/resource/postreq?url={}&closest={}&param.user={}&param.coll={}",
                self.hosts.replay,
                urlencoding::encode(url),
                closest,
                user,
                coll,
            ),
        }
    }

    /// Render the export endpoint URL on the record backend.
    pub fn download_url(
        &self,
        kind: DownloadKind,
        user: &str,
        coll: &str,
        rec: &str,
        filename: &str,
    ) -> String {
        format!(
            "{}/download?user={}&coll={}&rec={}&filename={}&type={}",
            self.hosts.record,
            user,
            coll,
            rec,
            urlencoding::encode(filename),
            kind.as_param(),
        )
    }

    /// Tag an index result as a fresh fetch when the mode serves live
    /// traffic, so downstream consumers can tell it from archived content.
    pub fn annotate_index_entry(mode: Mode, entry: &mut Value) {
        if mode.is_live() {
            if let Value::Object(map) = entry {
                map.insert("is_live".to_string(), Value::String("true".to_string()));
            }
        }
    }
}
