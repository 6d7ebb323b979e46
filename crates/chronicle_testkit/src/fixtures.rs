//! Test fixtures and store helpers.
//!
//! Provides convenience constructors for in-memory stores and common
//! document shapes.

use chronicle_core::{Document, EntityStore, KeyValueStore, MemoryGateway, StorageGateway};
use serde_json::json;
use std::sync::Arc;

/// An in-memory entity store with its gateway exposed for assertions.
pub struct TestStore {
    /// The engine under test.
    pub store: EntityStore,
    /// The gateway backing it.
    pub gateway: Arc<MemoryGateway>,
}

impl TestStore {
    /// Creates a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        let store = EntityStore::new(Arc::clone(&gateway) as Arc<dyn StorageGateway>);
        Self { store, gateway }
    }

    /// Creates a store whose reads go through an explicit reader handle
    /// onto the same tables, as a replica deployment would.
    #[must_use]
    pub fn with_reader() -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        let primary = Arc::clone(&gateway) as Arc<dyn StorageGateway>;
        let reader = Arc::clone(&gateway) as Arc<dyn StorageGateway>;
        Self {
            store: EntityStore::with_reader(primary, reader),
            gateway,
        }
    }

    /// A key-value store sharing this store's gateway.
    #[must_use]
    pub fn key_value(&self) -> KeyValueStore {
        KeyValueStore::new(Arc::clone(&self.gateway) as Arc<dyn StorageGateway>)
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = EntityStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// A person document with the given name.
#[must_use]
pub fn person(name: &str) -> Document {
    Document::new("person", json!({ "name": name }))
}

/// A person document with a caller-supplied id.
#[must_use]
pub fn person_with_id(id: &str, name: &str) -> Document {
    person(name).with_id(id)
}

/// Installs a tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
