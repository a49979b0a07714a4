//! InMemoryContentStore - 開発・テスト用のコンテンツストア
//!
//! # 実装詳細
//! - HashMap<String, StoredImage> を tokio の Mutex で保護
//! - put は 1 回のロック内で entry API を使うため、並行 put でも一意性が保たれる

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StoreError, StoredImage};
use crate::ports::ContentStore;

#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    records: Arc<Mutex<HashMap<String, StoredImage>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Stored names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        // map のキーがそのまま一意制約
        Ok(())
    }

    async fn put(&self, image: StoredImage) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        match records.entry(image.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(image.name)),
            Entry::Vacant(slot) => {
                slot.insert(image);
                Ok(())
            }
        }
    }

    async fn get(&self, name: &str) -> Result<StoredImage, StoreError> {
        self.records
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImageId;
    use chrono::Utc;
    use ulid::Ulid;

    fn record(name: &str, payload: &[u8]) -> StoredImage {
        StoredImage {
            id: ImageId::from_ulid(Ulid::new()),
            name: name.to_string(),
            source_path: format!("/in/{name}"),
            directory: "/in".to_string(),
            payload: payload.to_vec(),
            original_size: 100,
            ingested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryContentStore::new();
        store.initialize().await.unwrap();
        let image = record("logo.png", b"abc");
        store.put(image.clone()).await.unwrap();

        let fetched = store.get("logo.png").await.unwrap();
        assert_eq!(fetched, image);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryContentStore::new();
        let err = store.get("missing.png").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(name) if name == "missing.png"));
    }

    #[tokio::test]
    async fn test_duplicate_does_not_overwrite() {
        let store = InMemoryContentStore::new();
        store.put(record("logo.png", b"first")).await.unwrap();

        let err = store.put(record("logo.png", b"second")).await.unwrap_err();
        assert!(err.is_duplicate_key());

        let kept = store.get("logo.png").await.unwrap();
        assert_eq!(kept.payload, b"first");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = InMemoryContentStore::new();
        store.initialize().await.unwrap();
        store.put(record("a.png", b"a")).await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.names().await, vec!["a.png".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_same_name_only_one_wins() {
        let store = InMemoryContentStore::new();

        let mut joins = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            joins.push(tokio::spawn(async move {
                store.put(record("race.png", &[i])).await
            }));
        }

        let mut ok = 0;
        let mut duplicates = 0;
        for join in joins {
            match join.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::DuplicateKey(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.len().await, 1);
    }
}
