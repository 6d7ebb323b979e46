//! Key-value sibling store.

use crate::error::{CoreError, CoreResult};
use chronicle_gateway::StorageGateway;
use serde_json::Value;
use std::sync::Arc;

/// A simple key→document store sharing the storage gateway.
///
/// Writes upsert on key conflict; the row's `updated` column is refreshed
/// by the backend on every overwrite.
pub struct KeyValueStore {
    gateway: Arc<dyn StorageGateway>,
}

impl KeyValueStore {
    /// Creates a key-value store over a gateway.
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self { gateway }
    }

    /// Reads the document stored under `key`, if any.
    pub async fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        if key.trim().is_empty() {
            return Err(CoreError::validation("key is empty"));
        }
        Ok(self.gateway.kv_get(key).await?)
    }

    /// Stores a document under `key`, overwriting any previous value.
    pub async fn set(&self, key: &str, value: Value) -> CoreResult<()> {
        if key.trim().is_empty() {
            return Err(CoreError::validation("key is empty"));
        }
        self.gateway.kv_put(key, value).await?;
        Ok(())
    }
}

impl std::fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_gateway::MemoryGateway;
    use serde_json::json;

    fn store() -> KeyValueStore {
        KeyValueStore::new(Arc::new(MemoryGateway::new()))
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = store();
        assert!(store.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = store();
        store.set("greeting", json!({"text": "hello"})).await.unwrap();
        assert_eq!(
            store.get("greeting").await.unwrap(),
            Some(json!({"text": "hello"}))
        );
    }

    #[tokio::test]
    async fn set_overwrites_on_conflict() {
        let store = store();
        store.set("counter", json!({"n": 1})).await.unwrap();
        store.set("counter", json!({"n": 2})).await.unwrap();
        assert_eq!(store.get("counter").await.unwrap(), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let store = store();
        assert!(matches!(
            store.get("").await,
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            store.set("  ", json!(1)).await,
            Err(CoreError::Validation { .. })
        ));
    }
}
