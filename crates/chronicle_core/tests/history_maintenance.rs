//! History compaction.

use chronicle_core::VersionStatus;
use chronicle_testkit::prelude::*;
use serde_json::json;

#[tokio::test]
async fn compaction_leaves_exactly_the_given_document() {
    let store = TestStore::new();

    let outcome = store.upsert(person("v1")).await.unwrap();
    let id = outcome.entity_id.clone();
    for name in ["v2", "v3", "v4"] {
        store
            .upsert(person(name).with_id(id.clone()))
            .await
            .unwrap();
    }
    assert_eq!(store.list_versions(&id, true).await.unwrap().len(), 4);

    let replacement = person("compacted").with_id(id.clone());
    store.clean_history(replacement.clone()).await.unwrap();

    let versions = store.list_versions(&id, true).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].status, VersionStatus::Current);

    let loaded = store.load(&id, false).await.unwrap().unwrap();
    assert_eq!(loaded.attributes, replacement.attributes);
}

#[tokio::test]
async fn compaction_works_on_a_removed_entity_and_keeps_it_removed() {
    let store = TestStore::new();

    let outcome = store.upsert(person("v1")).await.unwrap();
    let id = outcome.entity_id.clone();
    store.upsert(person("v2").with_id(id.clone())).await.unwrap();
    store.remove(&id, None).await.unwrap();

    store
        .clean_history(person("scrubbed").with_id(id.clone()))
        .await
        .unwrap();

    // Still soft-deleted, but the whole history is now one scrubbed version.
    assert!(store.load(&id, false).await.unwrap().is_none());
    let loaded = store.load(&id, true).await.unwrap().unwrap();
    assert_eq!(loaded.attributes, json!({"name": "scrubbed"}));
    assert_eq!(store.list_versions(&id, true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn compacted_entity_keeps_accepting_new_versions() {
    let store = TestStore::new();

    let outcome = store.upsert(person("v1")).await.unwrap();
    let id = outcome.entity_id.clone();
    store.upsert(person("v2").with_id(id.clone())).await.unwrap();

    store
        .clean_history(person("compacted").with_id(id.clone()))
        .await
        .unwrap();
    let outcome = store
        .upsert(person("after").with_id(id.clone()))
        .await
        .unwrap();
    assert!(!outcome.was_conflict);

    let versions = store.list_versions(&id, true).await.unwrap();
    assert_eq!(versions.len(), 2);
    let loaded = store.load(&id, false).await.unwrap().unwrap();
    assert_eq!(loaded.attributes, json!({"name": "after"}));
}
