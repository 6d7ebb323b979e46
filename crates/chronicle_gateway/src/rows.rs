//! Row shapes exchanged with the storage gateway.
//!
//! The gateway speaks plain column values: string ids, JSON payloads and
//! backend-assigned timestamps. Interpretation of the payload belongs to the
//! codec layer; the gateway never looks inside `doc`.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A version row to be inserted by [`publish`](crate::StorageGateway::publish).
///
/// The `created` column is assigned by the backend at insert time.
#[derive(Debug, Clone)]
pub struct NewVersionRow {
    /// Unique id for the new version.
    pub version_id: String,
    /// The owning entity's id.
    pub entity_id: String,
    /// Caller-supplied correlation tag, if any.
    pub correlation_id: Option<String>,
    /// The full serialized document captured at this point in time.
    pub doc: Value,
}

/// The head columns accompanying a version insert.
///
/// `entity_created` and `latest_version_id` are managed by the gateway:
/// the creation timestamp is fixed on first insert and the latest pointer
/// always tracks the version row published alongside.
#[derive(Debug, Clone)]
pub struct NewHeadRow {
    /// The entity's id.
    pub entity_id: String,
    /// The entity's type.
    pub entity_type: String,
}

/// Write-guard mode for [`publish`](crate::StorageGateway::publish).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Reject the write when the entity is soft-deleted.
    Guarded,
    /// Write regardless of removal state (history compaction).
    Force,
}

/// Outcome of a [`publish`](crate::StorageGateway::publish) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The guarded insert hit a soft-deleted entity; nothing was written.
    Conflict,
    /// Version row inserted and head upserted.
    Published(Published),
}

/// Columns reported back from a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// The new version row's creation timestamp.
    pub version_created: DateTime<Utc>,
    /// The head's creation timestamp (first-write-wins).
    pub entity_created: DateTime<Utc>,
    /// Whether the head row was created rather than updated.
    pub was_insert: bool,
}

/// An entity head joined to its latest version.
#[derive(Debug, Clone)]
pub struct LatestRow {
    /// The entity's id.
    pub entity_id: String,
    /// The entity's type.
    pub entity_type: String,
    /// When the head row was first created.
    pub entity_created: DateTime<Utc>,
    /// Soft-deletion timestamp, if the entity is removed.
    pub removed_at: Option<DateTime<Utc>>,
    /// Id of the latest version.
    pub version_id: String,
    /// When the latest version was written.
    pub version_created: DateTime<Utc>,
    /// Correlation tag recorded with the latest version.
    pub correlation_id: Option<String>,
    /// The latest version's document payload.
    pub doc: Value,
}

/// A single version row joined to its entity's head columns.
#[derive(Debug, Clone)]
pub struct VersionRow {
    /// The version's id.
    pub version_id: String,
    /// The owning entity's id.
    pub entity_id: String,
    /// When this version was written.
    pub created: DateTime<Utc>,
    /// When the owning entity was first created.
    pub entity_created: DateTime<Utc>,
    /// Correlation tag recorded with this version.
    pub correlation_id: Option<String>,
    /// The document payload captured by this version.
    pub doc: Value,
}

/// One entry of an entity's version history.
#[derive(Debug, Clone)]
pub struct VersionSummaryRow {
    /// The version's id.
    pub version_id: String,
    /// When this version was written.
    pub created: DateTime<Utc>,
    /// Correlation tag recorded with this version.
    pub correlation_id: Option<String>,
    /// Whether the head's latest pointer references this version.
    pub is_latest: bool,
}
