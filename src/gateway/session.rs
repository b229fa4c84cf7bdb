//! Session capability and anonymous-identity normalization
//!
//! Sessions are owned by an external collaborator; the gateway only reads
//! the anon flag, sets it on first record request, and derives a path-safe
//! user identifier from the anonymous identity. The in-memory provider here
//! is the standalone/test stand-in for that collaborator.

use crate::gateway::types::{GatewayError, GatewayResult, UserId};
use http::HeaderMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Internal marker prefix on anonymous identities issued by the session store
pub const ANON_ID_MARKER: &str = "@anon-";

/// Path-safe prefix substituted for the marker in user identifiers
pub const ANON_PATH_PREFIX: &str = "anon/";

/// Cookie carrying the session key
pub const SESSION_COOKIE: &str = "warcgate_sess";

/// Capability surface of an externally owned session
pub trait Session: Send + Sync {
    fn is_anon(&self) -> bool;

    /// Mark the session as an anonymous capture session.
    fn set_anon(&self);

    /// The session's anonymous identity, carrying the internal marker prefix.
    fn anon_id(&self) -> String;
}

/// Yields the session for an inbound request
pub trait SessionProvider: Send + Sync {
    fn session(&self, headers: &HeaderMap) -> Arc<dyn Session>;
}

/// Derive the path-safe user identifier from the session's anonymous
/// identity by swapping the internal marker for the `anon/` prefix.
pub fn anon_user(session: &dyn Session) -> GatewayResult<UserId> {
    let user = session.anon_id().replacen(ANON_ID_MARKER, ANON_PATH_PREFIX, 1);
    UserId::try_new(user)
        .map_err(|_| GatewayError::Contract("session produced an empty anonymous identity".into()))
}

/// In-memory session with an atomically flipped anon flag
pub struct AnonSession {
    anon: AtomicBool,
    id: String,
}

impl AnonSession {
    pub fn new() -> Self {
        Self {
            anon: AtomicBool::new(false),
            id: format!("{}{}", ANON_ID_MARKER, Uuid::now_v7().simple()),
        }
    }

    /// Build a session with a fixed identity, for tests.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            anon: AtomicBool::new(false),
            id: id.into(),
        }
    }
}

impl Default for AnonSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for AnonSession {
    fn is_anon(&self) -> bool {
        self.anon.load(Ordering::Relaxed)
    }

    fn set_anon(&self) {
        self.anon.store(true, Ordering::Relaxed);
    }

    fn anon_id(&self) -> String {
        self.id.clone()
    }
}

/// Cookie-keyed in-memory session provider
pub struct AnonSessionProvider {
    sessions: RwLock<HashMap<String, Arc<AnonSession>>>,
}

impl AnonSessionProvider {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn session_key(headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get(http::header::COOKIE)?.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
    }
}

impl Default for AnonSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for AnonSessionProvider {
    fn session(&self, headers: &HeaderMap) -> Arc<dyn Session> {
        let key = Self::session_key(headers)
            .unwrap_or_else(|| Uuid::now_v7().simple().to_string());

        let mut sessions = self.sessions.write();
        let session = sessions
            .entry(key)
            .or_insert_with(|| Arc::new(AnonSession::new()));
        Arc::clone(session) as Arc<dyn Session>
    }
}
