//! Collection/recording metadata store seam
//!
//! The real store is an external collaborator; the gateway consumes it via
//! the [`RecordingStore`] trait. Creation is idempotent: "already exists"
//! is success, which is what makes provisioning safe under races. The
//! in-memory implementation backs tests and standalone operation.

use crate::gateway::types::GatewayResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

/// Stored metadata for one recording
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordingInfo {
    /// Canonical (sanitized) identifier.
    pub id: String,
    /// Original human-supplied title.
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Stored metadata for one collection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata store for collections and recordings
#[async_trait]
pub trait RecordingStore: Send + Sync {
    async fn has_collection(&self, user: &str, coll: &str) -> bool;

    /// Create the collection if absent. Re-creation is a no-op, not an error.
    async fn create_collection(&self, user: &str, coll: &str) -> GatewayResult<()>;

    async fn get_collection(&self, user: &str, coll: &str) -> Option<CollectionInfo>;

    async fn has_recording(&self, user: &str, coll: &str, rec: &str) -> bool;

    /// Create the recording if absent. Re-creation is a no-op, not an error.
    async fn create_recording(
        &self,
        user: &str,
        coll: &str,
        rec: &str,
        title: &str,
    ) -> GatewayResult<()>;

    async fn get_recording(&self, user: &str, coll: &str, rec: &str) -> Option<RecordingInfo>;

    /// Metadata surfaced to the rewrite renderer's top-level frame.
    async fn content_inject_info(&self, user: &str, coll: &str, rec: &str) -> serde_json::Value;
}

#[derive(Clone, Debug)]
struct CollectionEntry {
    info: CollectionInfo,
    recordings: HashMap<String, RecordingInfo>,
}

/// In-memory store keyed by `(user, collection)`
pub struct InMemoryStore {
    collections: RwLock<HashMap<(String, String), CollectionEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn key(user: &str, coll: &str) -> (String, String) {
        (user.to_string(), coll.to_string())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordingStore for InMemoryStore {
    async fn has_collection(&self, user: &str, coll: &str) -> bool {
        self.collections.read().contains_key(&Self::key(user, coll))
    }

    async fn create_collection(&self, user: &str, coll: &str) -> GatewayResult<()> {
        self.collections
            .write()
            .entry(Self::key(user, coll))
            .or_insert_with(|| CollectionEntry {
                info: CollectionInfo {
                    id: coll.to_string(),
                    title: coll.to_string(),
                    created_at: Utc::now(),
                },
                recordings: HashMap::new(),
            });
        Ok(())
    }

    async fn get_collection(&self, user: &str, coll: &str) -> Option<CollectionInfo> {
        self.collections
            .read()
            .get(&Self::key(user, coll))
            .map(|entry| entry.info.clone())
    }

    async fn has_recording(&self, user: &str, coll: &str, rec: &str) -> bool {
        self.collections
            .read()
            .get(&Self::key(user, coll))
            .is_some_and(|entry| entry.recordings.contains_key(rec))
    }

    async fn create_recording(
        &self,
        user: &str,
        coll: &str,
        rec: &str,
        title: &str,
    ) -> GatewayResult<()> {
        let mut collections = self.collections.write();
        let entry = collections
            .entry(Self::key(user, coll))
            .or_insert_with(|| CollectionEntry {
                info: CollectionInfo {
                    id: coll.to_string(),
                    title: coll.to_string(),
                    created_at: Utc::now(),
                },
                recordings: HashMap::new(),
            });

        entry
            .recordings
            .entry(rec.to_string())
            .or_insert_with(|| RecordingInfo {
                id: rec.to_string(),
                title: title.to_string(),
                created_at: Utc::now(),
            });
        Ok(())
    }

    async fn get_recording(&self, user: &str, coll: &str, rec: &str) -> Option<RecordingInfo> {
        self.collections
            .read()
            .get(&Self::key(user, coll))
            .and_then(|entry| entry.recordings.get(rec).cloned())
    }

    async fn content_inject_info(&self, user: &str, coll: &str, rec: &str) -> serde_json::Value {
        let recording = self.get_recording(user, coll, rec).await;
        json!({
            "user": user,
            "coll": coll,
            "rec": rec,
            "rec_title": recording.map(|info| info.title),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collection_creation_is_idempotent() {
        let store = InMemoryStore::new();

        store.create_collection("anon/u1", "anonymous").await.unwrap();
        let first = store.get_collection("anon/u1", "anonymous").await.unwrap();

        store.create_collection("anon/u1", "anonymous").await.unwrap();
        let second = store.get_collection("anon/u1", "anonymous").await.unwrap();

        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn recording_creation_is_idempotent_and_keeps_first_title() {
        let store = InMemoryStore::new();

        store
            .create_recording("anon/u1", "anonymous", "my-recording", "My Recording!")
            .await
            .unwrap();
        store
            .create_recording("anon/u1", "anonymous", "my-recording", "Other Title")
            .await
            .unwrap();

        let info = store
            .get_recording("anon/u1", "anonymous", "my-recording")
            .await
            .unwrap();
        assert_eq!(info.title, "My Recording!");
    }

    #[tokio::test]
    async fn missing_resources_report_absent() {
        let store = InMemoryStore::new();
        assert!(!store.has_collection("anon/u1", "anonymous").await);
        assert!(!store.has_recording("anon/u1", "anonymous", "rec1").await);
        assert!(store.get_recording("anon/u1", "anonymous", "rec1").await.is_none());
    }

    #[tokio::test]
    async fn inject_info_carries_recording_title() {
        let store = InMemoryStore::new();
        store
            .create_recording("anon/u1", "anonymous", "rec1", "Test")
            .await
            .unwrap();

        let info = store.content_inject_info("anon/u1", "anonymous", "rec1").await;
        assert_eq!(info["rec_title"], "Test");
        assert_eq!(info["coll"], "anonymous");
    }
}
