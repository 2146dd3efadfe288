//! Inverted-index store contract and the in-memory implementation

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::EngineError;
use crate::fingerprint::Fingerprint;

/// Dense track identifier assigned by the store at ingest time.
pub type TrackId = i64;

/// Inverted index of hash tokens to the tracks that contain them.
///
/// `save_track` is transactional: either the track and all of its postings
/// are persisted or none are. Posting lists may list the same track more
/// than once; scoring treats repeats additively.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Persist a new track and append one posting per token. Returns the
    /// freshly assigned id.
    async fn save_track(
        &self,
        title: &str,
        fingerprints: &[Fingerprint],
    ) -> Result<TrackId, EngineError>;

    /// Posting list for `hash`, empty when the hash was never stored.
    /// Never fails for missing keys.
    async fn lookup(&self, hash: &str) -> Result<Vec<TrackId>, EngineError>;

    /// Title of a stored track.
    async fn title_of(&self, id: TrackId) -> Result<String, EngineError>;

    /// All track titles in insertion order.
    async fn list_titles(&self) -> Result<Vec<String>, EngineError>;
}

/// In-memory store for tests and embedded use.
///
/// Ids start at 1 to line up with the rowid semantics of the persistent
/// store, so either backend can sit behind the same engine.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryIndex>,
}

#[derive(Default)]
struct MemoryIndex {
    titles: Vec<String>,
    postings: HashMap<String, Vec<TrackId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn save_track(
        &self,
        title: &str,
        fingerprints: &[Fingerprint],
    ) -> Result<TrackId, EngineError> {
        // The write guard spans the whole update, so a track and its
        // postings appear atomically to readers.
        let mut index = self.inner.write().await;
        index.titles.push(title.to_string());
        let id = index.titles.len() as TrackId;
        for fp in fingerprints {
            index.postings.entry(fp.hash.clone()).or_default().push(id);
        }
        Ok(id)
    }

    async fn lookup(&self, hash: &str) -> Result<Vec<TrackId>, EngineError> {
        let index = self.inner.read().await;
        Ok(index.postings.get(hash).cloned().unwrap_or_default())
    }

    async fn title_of(&self, id: TrackId) -> Result<String, EngineError> {
        let index = self.inner.read().await;
        usize::try_from(id - 1)
            .ok()
            .and_then(|i| index.titles.get(i).cloned())
            .ok_or(EngineError::TrackNotFound(id))
    }

    async fn list_titles(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.inner.read().await.titles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(hash: &str, time_anchor: usize) -> Fingerprint {
        Fingerprint {
            hash: hash.to_string(),
            time_anchor,
        }
    }

    #[tokio::test]
    async fn ids_are_dense_and_start_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.save_track("a", &[]).await.unwrap(), 1);
        assert_eq!(store.save_track("b", &[]).await.unwrap(), 2);
        assert_eq!(store.title_of(1).await.unwrap(), "a");
        assert_eq!(store.list_titles().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn missing_hash_looks_up_empty() {
        let store = MemoryStore::new();
        assert!(store.lookup("1.2.3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_tokens_append_repeated_postings() {
        let store = MemoryStore::new();
        let id = store
            .save_track("a", &[token("7.8.9", 0), token("7.8.9", 5)])
            .await
            .unwrap();
        assert_eq!(store.lookup("7.8.9").await.unwrap(), vec![id, id]);
    }

    #[tokio::test]
    async fn unknown_track_id_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.title_of(42).await,
            Err(EngineError::TrackNotFound(42))
        ));
    }
}
