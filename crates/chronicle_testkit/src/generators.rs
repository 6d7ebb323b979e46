//! Property-based test generators.

use chronicle_core::{Document, Relationship};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for opaque attribute payloads: shallow JSON objects of
/// booleans, integers and short strings.
pub fn arb_attributes() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ];
    prop::collection::btree_map("[a-z][a-z0-9]{0,10}", leaf, 0..8)
        .prop_map(|map| serde_json::to_value(map).unwrap())
}

/// Strategy for relationship tuples.
pub fn arb_relationship() -> impl Strategy<Value = Relationship> {
    (
        "[a-z]{1,10}",
        "[a-z0-9-]{1,12}",
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(rel_type, id, system)| {
            let relationship = Relationship::new(rel_type, id);
            match system {
                Some(system) => relationship.in_system(system),
                None => relationship,
            }
        })
}

/// Strategy for documents of the given entity type.
pub fn arb_document(entity_type: &'static str) -> impl Strategy<Value = Document> {
    (
        arb_attributes(),
        prop::collection::vec(arb_relationship(), 0..4),
    )
        .prop_map(move |(attributes, relationships)| {
            let mut document = Document::new(entity_type, attributes);
            for relationship in relationships {
                document = document.with_relationship(relationship);
            }
            document
        })
}
