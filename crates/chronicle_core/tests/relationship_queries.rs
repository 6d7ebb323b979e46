//! Relationship and external-id lookups.

use chronicle_core::{CoreError, ExternalIdQuery, Relationship, RelationshipQuery};
use chronicle_testkit::prelude::*;
use serde_json::json;

async fn seed(store: &TestStore) {
    // Two people at company c-1, one at c-2, one unrelated place.
    store
        .upsert(
            person_with_id("p-1", "A").with_relationship(Relationship::new("employer", "c-1")),
        )
        .await
        .unwrap();
    store
        .upsert(
            person_with_id("p-2", "B")
                .with_relationship(Relationship::new("employer", "c-1").in_system("crm"))
                .with_relationship(Relationship::new("manager", "p-1")),
        )
        .await
        .unwrap();
    store
        .upsert(
            person_with_id("p-3", "C").with_relationship(Relationship::new("employer", "c-2")),
        )
        .await
        .unwrap();
    store
        .upsert(
            chronicle_core::Document::new("place", json!({"name": "HQ"}))
                .with_id("pl-1")
                .with_relationship(Relationship::new("employer", "c-1")),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn matches_are_restricted_to_the_entity_type() {
    let store = TestStore::new();
    seed(&store).await;

    let query = RelationshipQuery::new("person", vec![Relationship::new("employer", "c-1")]);
    let mut docs = store.query_by_relationships(&query).await.unwrap();
    docs.sort_by(|a, b| a.id.cmp(&b.id));

    let ids: Vec<_> = docs
        .iter()
        .map(|d| d.id.as_ref().unwrap().as_str().to_string())
        .collect();
    assert_eq!(ids, ["p-1", "p-2"]);
}

#[tokio::test]
async fn superset_match_requires_every_criterion() {
    let store = TestStore::new();
    seed(&store).await;

    let query = RelationshipQuery::new(
        "person",
        vec![
            Relationship::new("employer", "c-1"),
            Relationship::new("manager", "p-1"),
        ],
    );
    let docs = store.query_by_relationships(&query).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id.as_ref().unwrap().as_str(), "p-2");
}

#[tokio::test]
async fn criterion_with_a_system_only_matches_that_system() {
    let store = TestStore::new();
    seed(&store).await;

    let query = RelationshipQuery::new(
        "person",
        vec![Relationship::new("employer", "c-1").in_system("crm")],
    );
    let docs = store.query_by_relationships(&query).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id.as_ref().unwrap().as_str(), "p-2");
}

#[tokio::test]
async fn removed_entities_never_match() {
    let store = TestStore::new();
    seed(&store).await;
    store
        .remove(&chronicle_core::EntityId::new("p-1"), None)
        .await
        .unwrap();

    let query = RelationshipQuery::new("person", vec![Relationship::new("employer", "c-1")]);
    let docs = store.query_by_relationships(&query).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id.as_ref().unwrap().as_str(), "p-2");
}

#[tokio::test]
async fn no_match_is_empty_unless_asked_to_fail() {
    let store = TestStore::new();
    seed(&store).await;

    let query = RelationshipQuery::new("person", vec![Relationship::new("employer", "c-9")]);
    assert!(store.query_by_relationships(&query).await.unwrap().is_empty());

    let failing = query.error_on_not_found();
    assert!(matches!(
        store.query_by_relationships(&failing).await,
        Err(CoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn find_one_returns_the_single_match() {
    let store = TestStore::new();
    seed(&store).await;

    let query = RelationshipQuery::new("person", vec![Relationship::new("manager", "p-1")]);
    let doc = store.find_one_by_relationships(&query).await.unwrap();
    assert_eq!(doc.unwrap().id.unwrap().as_str(), "p-2");

    let none = RelationshipQuery::new("person", vec![Relationship::new("manager", "p-9")]);
    assert!(store
        .find_one_by_relationships(&none)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn find_one_refuses_to_pick_among_many() {
    let store = TestStore::new();
    seed(&store).await;

    let query = RelationshipQuery::new("person", vec![Relationship::new("employer", "c-1")]);
    assert!(matches!(
        store.find_one_by_relationships(&query).await,
        Err(CoreError::Ambiguous { .. })
    ));
}

#[tokio::test]
async fn external_id_lookup_finds_the_unique_owner() {
    let store = TestStore::new();
    store
        .upsert(person_with_id("p-1", "A").with_external_id("crm", "customerNumber", json!("1234")))
        .await
        .unwrap();
    store
        .upsert(person_with_id("p-2", "B").with_external_id("crm", "customerNumber", json!("5678")))
        .await
        .unwrap();

    let query = ExternalIdQuery::new("person", "crm", "customerNumber", json!("1234"));
    let doc = store.load_by_external_id(&query).await.unwrap().unwrap();
    assert_eq!(doc.id.unwrap().as_str(), "p-1");
}

#[tokio::test]
async fn external_id_lookup_supports_structured_ids() {
    let store = TestStore::new();
    store
        .upsert(
            person_with_id("p-1", "A")
                .with_external_id("ledger", "accountNo", json!({"branch": "a", "no": 7})),
        )
        .await
        .unwrap();

    let query = ExternalIdQuery::new(
        "person",
        "ledger",
        "accountNo",
        json!({"branch": "a", "no": 7}),
    );
    assert!(store.load_by_external_id(&query).await.unwrap().is_some());

    let other = ExternalIdQuery::new(
        "person",
        "ledger",
        "accountNo",
        json!({"branch": "a", "no": 8}),
    );
    assert!(store.load_by_external_id(&other).await.unwrap().is_none());
}

#[tokio::test]
async fn shared_external_id_is_a_data_integrity_error() {
    let store = TestStore::new();
    for id in ["p-1", "p-2"] {
        store
            .upsert(person_with_id(id, "X").with_external_id("crm", "customerNumber", json!("dup")))
            .await
            .unwrap();
    }

    let query = ExternalIdQuery::new("person", "crm", "customerNumber", json!("dup"));
    assert!(matches!(
        store.load_by_external_id(&query).await,
        Err(CoreError::Ambiguous { .. })
    ));
}

#[tokio::test]
async fn external_id_lookup_validates_and_reports_absence() {
    let store = TestStore::new();

    let invalid = ExternalIdQuery::new("", "crm", "customerNumber", json!("1234"));
    assert!(matches!(
        store.load_by_external_id(&invalid).await,
        Err(CoreError::Validation { .. })
    ));

    let absent = ExternalIdQuery::new("person", "crm", "customerNumber", json!("1234"));
    assert!(store.load_by_external_id(&absent).await.unwrap().is_none());

    let failing = absent.error_on_not_found();
    assert!(matches!(
        store.load_by_external_id(&failing).await,
        Err(CoreError::NotFound { .. })
    ));
}
