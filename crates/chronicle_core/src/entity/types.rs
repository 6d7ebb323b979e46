//! Inputs and outputs of the engine operations.

use chrono::{DateTime, Utc};
use chronicle_codec::{Document, EntityId, Relationship, VersionId};
use serde::Serialize;
use serde_json::Value;

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// The entity written to (caller-supplied or freshly generated).
    pub entity_id: EntityId,
    /// Id of the new version row; `None` when the write conflicted.
    pub version_id: Option<VersionId>,
    /// Whether the entity head was created rather than updated.
    pub was_insert: bool,
    /// Whether the write was rejected because the entity is soft-deleted.
    pub was_conflict: bool,
}

/// Result of a remove.
///
/// `removed: None` means nothing was removed (the entity did not exist or
/// was already soft-deleted) - a valid outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    /// The removed entity's id, when the removal actually happened.
    pub removed: Option<EntityId>,
}

/// Publication status of one version in an entity's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// The entity head's latest pointer references this version.
    Current,
    /// A superseded version.
    PreviouslyPublished,
}

/// One entry of an entity's version history.
#[derive(Debug, Clone)]
pub struct VersionSummary {
    /// The version's id.
    pub version_id: VersionId,
    /// When the version was written.
    pub created: DateTime<Utc>,
    /// Correlation tag recorded with the version.
    pub correlation_id: Option<String>,
    /// Whether this is the current version.
    pub status: VersionStatus,
}

/// A fully loaded historical version.
#[derive(Debug, Clone)]
pub struct VersionRecord {
    /// When the version was written.
    pub created: DateTime<Utc>,
    /// The version's id.
    pub version_id: VersionId,
    /// Correlation tag recorded with the version.
    pub correlation_id: Option<String>,
    /// The document captured by this version, metadata overlaid.
    pub entity: Document,
}

/// Criteria for relationship lookups.
#[derive(Debug, Clone)]
pub struct RelationshipQuery {
    /// Entity type to search within.
    pub entity_type: String,
    /// Tuples the latest version must all contain (superset match).
    pub relationships: Vec<Relationship>,
    /// Fail with [`CoreError::NotFound`](crate::CoreError::NotFound)
    /// instead of returning an empty result.
    pub error_on_not_found: bool,
}

impl RelationshipQuery {
    /// Creates a query over the given entity type and criteria.
    pub fn new(entity_type: impl Into<String>, relationships: Vec<Relationship>) -> Self {
        Self {
            entity_type: entity_type.into(),
            relationships,
            error_on_not_found: false,
        }
    }

    /// Makes an empty result a not-found failure.
    #[must_use]
    pub fn error_on_not_found(mut self) -> Self {
        self.error_on_not_found = true;
        self
    }
}

/// Criteria for an external-id lookup.
#[derive(Debug, Clone)]
pub struct ExternalIdQuery {
    /// Entity type to search within.
    pub entity_type: String,
    /// The external system the id belongs to.
    pub system: String,
    /// The kind of id within that system.
    pub id_type: String,
    /// The id itself; a plain string or a structured value.
    pub id: Value,
    /// Fail with [`CoreError::NotFound`](crate::CoreError::NotFound)
    /// instead of returning `None`.
    pub error_on_not_found: bool,
}

impl ExternalIdQuery {
    /// Creates a lookup for `externalIds[system][id_type] == id`.
    pub fn new(
        entity_type: impl Into<String>,
        system: impl Into<String>,
        id_type: impl Into<String>,
        id: impl Into<Value>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            system: system.into(),
            id_type: id_type.into(),
            id: id.into(),
            error_on_not_found: false,
        }
    }

    /// Makes a missing match a not-found failure.
    #[must_use]
    pub fn error_on_not_found(mut self) -> Self {
        self.error_on_not_found = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_status_wire_names() {
        assert_eq!(
            serde_json::to_value(VersionStatus::Current).unwrap(),
            serde_json::json!("current")
        );
        assert_eq!(
            serde_json::to_value(VersionStatus::PreviouslyPublished).unwrap(),
            serde_json::json!("previously_published")
        );
    }
}
