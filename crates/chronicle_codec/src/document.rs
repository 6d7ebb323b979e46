//! The typed document envelope.
//!
//! Documents have a fixed envelope (id, type, relationships, external ids,
//! metadata) around an opaque `attributes` payload. Typing the envelope
//! catches malformed input at the boundary instead of deep inside the
//! engine.

use crate::ids::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A versioned entity document.
///
/// Wire field names are camelCase (`type`, `externalIds`), matching the
/// persisted JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The entity id; absent on first insert when the engine generates one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// The entity type.
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Opaque caller payload.
    #[serde(default)]
    pub attributes: Value,

    /// Typed links to other entities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,

    /// Ids this entity is known by in external systems,
    /// keyed `system -> id type -> id`.
    #[serde(
        default,
        rename = "externalIds",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub external_ids: BTreeMap<String, BTreeMap<String, Value>>,

    /// Engine- and caller-managed metadata.
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

/// One relationship tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// The relationship type (e.g. `"author"`).
    #[serde(rename = "type")]
    pub rel_type: String,

    /// Id of the related entity.
    pub id: String,

    /// The system the related id belongs to, if not this store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Relationship {
    /// Creates a relationship tuple.
    pub fn new(rel_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            id: id.into(),
            system: None,
        }
    }

    /// Sets the originating system.
    #[must_use]
    pub fn in_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Whether this tuple satisfies a query criterion.
    ///
    /// Type and id must match; the system is compared only when the
    /// criterion names one (subset semantics, as a JSON containment match
    /// would behave).
    #[must_use]
    pub fn satisfies(&self, criterion: &Relationship) -> bool {
        if self.rel_type != criterion.rel_type || self.id != criterion.id {
            return false;
        }
        match &criterion.system {
            Some(system) => self.system.as_deref() == Some(system.as_str()),
            None => true,
        }
    }
}

/// Document metadata.
///
/// `created_at` and `updated_at` are engine-managed: whatever a stored
/// document carries is overridden at read time by the authoritative row
/// timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Caller-supplied tag linking a version to the event that caused it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// First insertion time of the entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Creation time of the current version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Meta {
    /// Whether every field is unset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.correlation_id.is_none() && self.created_at.is_none() && self.updated_at.is_none()
    }
}

impl Document {
    /// Creates a document of the given type with an opaque payload.
    pub fn new(entity_type: impl Into<String>, attributes: Value) -> Self {
        Self {
            id: None,
            entity_type: entity_type.into(),
            attributes,
            relationships: Vec::new(),
            external_ids: BTreeMap::new(),
            meta: Meta::default(),
        }
    }

    /// Sets the entity id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a relationship tuple.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Records an external id under `system` and `id_type`.
    #[must_use]
    pub fn with_external_id(
        mut self,
        system: impl Into<String>,
        id_type: impl Into<String>,
        id: Value,
    ) -> Self {
        self.external_ids
            .entry(system.into())
            .or_default()
            .insert(id_type.into(), id);
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.meta.correlation_id = Some(correlation_id.into());
        self
    }

    /// Builds the emptied document recorded when an entity is removed.
    ///
    /// Same id and type; attributes, relationships and external ids are
    /// cleared, and the given correlation id is carried so the tombstone
    /// version can be traced to the removal event.
    #[must_use]
    pub fn tombstone(&self, correlation_id: Option<String>) -> Self {
        Self {
            id: self.id.clone(),
            entity_type: self.entity_type.clone(),
            attributes: Value::Object(serde_json::Map::new()),
            relationships: Vec::new(),
            external_ids: BTreeMap::new(),
            meta: Meta {
                correlation_id,
                created_at: None,
                updated_at: None,
            },
        }
    }

    /// Superset match: every criterion is satisfied by some relationship
    /// of this document.
    #[must_use]
    pub fn contains_relationships(&self, criteria: &[Relationship]) -> bool {
        criteria.iter().all(|criterion| {
            self.relationships
                .iter()
                .any(|relationship| relationship.satisfies(criterion))
        })
    }

    /// Whether `externalIds[system][id_type]` equals the given value.
    ///
    /// The value may be a plain string or a structured JSON value.
    #[must_use]
    pub fn external_id_matches(&self, system: &str, id_type: &str, id: &Value) -> bool {
        self.external_ids
            .get(system)
            .and_then(|ids| ids.get(id_type))
            .is_some_and(|stored| stored == id)
    }
}
