//! Storage gateway trait definition.

use crate::error::GatewayResult;
use crate::rows::{
    LatestRow, NewHeadRow, NewVersionRow, PublishMode, PublishOutcome, VersionRow,
    VersionSummaryRow,
};
use async_trait::async_trait;
use serde_json::Value;

/// Executes parameterized statements against the relational backend.
///
/// Gateways are **opaque row stores**. They return column values and row
/// sets; the versioning protocol (conflict semantics, tombstones, metadata
/// computation) is owned by the engine. Gateways own two things the engine
/// must not reimplement:
///
/// - **Atomicity**: [`publish`](Self::publish) applies the conditional
///   version insert and the head upsert as one logical transaction. A
///   backend with single-statement conditional upserts uses that; others
///   wrap the two statements in an explicit transaction.
/// - **The clock**: row timestamps (`created`, `entity_created`,
///   `entity_removed`, `updated`) are assigned by the backend, never by the
///   caller.
///
/// # Errors
///
/// All methods fail with [`GatewayError`](crate::GatewayError); timeouts
/// fail the whole call without partial effects, and
/// [`is_transient`](crate::GatewayError::is_transient) tells callers whether
/// a retry can help.
///
/// # Implementors
///
/// - [`MemoryGateway`](crate::MemoryGateway) - in-process tables for tests
///   and embedded use
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Atomically inserts a version row and upserts the entity head.
    ///
    /// In [`PublishMode::Guarded`] the insert is conditioned on the entity
    /// not being soft-deleted; a failed condition inserts zero rows and
    /// reports [`PublishOutcome::Conflict`]. [`PublishMode::Force`] skips
    /// the guard. On success the head's `latest_version_id` points at the
    /// new version and `entity_created` keeps its first-insert value.
    async fn publish(
        &self,
        version: NewVersionRow,
        head: NewHeadRow,
        mode: PublishMode,
    ) -> GatewayResult<PublishOutcome>;

    /// Returns the entity head joined to its latest version.
    ///
    /// Soft-deleted entities yield `None` unless `include_removed` is set.
    async fn latest(&self, entity_id: &str, include_removed: bool)
        -> GatewayResult<Option<LatestRow>>;

    /// Returns one version row joined to its entity's head columns.
    ///
    /// Versions of a soft-deleted entity yield `None` unless
    /// `include_removed` is set.
    async fn version(
        &self,
        version_id: &str,
        include_removed: bool,
    ) -> GatewayResult<Option<VersionRow>>;

    /// Returns an entity's version rows ordered by creation time ascending.
    ///
    /// When the entity is soft-deleted and `include_removed` is not set, the
    /// result is empty.
    async fn versions(
        &self,
        entity_id: &str,
        include_removed: bool,
    ) -> GatewayResult<Vec<VersionSummaryRow>>;

    /// Returns the latest rows of all non-removed entities of a type.
    async fn latest_of_type(&self, entity_type: &str) -> GatewayResult<Vec<LatestRow>>;

    /// Sets `entity_removed` to the backend's current time.
    ///
    /// Returns `false` when the entity does not exist or is already removed.
    async fn mark_removed(&self, entity_id: &str) -> GatewayResult<bool>;

    /// Clears `entity_removed`.
    ///
    /// Returns `false` when the entity does not exist or was not removed.
    async fn clear_removed(&self, entity_id: &str) -> GatewayResult<bool>;

    /// Deletes every version row of an entity except `keep_version_id`.
    ///
    /// Returns the number of rows deleted.
    async fn prune_versions(&self, entity_id: &str, keep_version_id: &str) -> GatewayResult<u64>;

    /// Reads a document from the key-value sibling table.
    async fn kv_get(&self, key: &str) -> GatewayResult<Option<Value>>;

    /// Writes a document to the key-value sibling table.
    ///
    /// Overwrites on key conflict and refreshes the row's `updated` column.
    async fn kv_put(&self, key: &str, doc: Value) -> GatewayResult<()>;

    /// Executes one DDL script (schema bootstrap only).
    async fn run_script(&self, sql: &str) -> GatewayResult<()>;

    /// Liveness round trip.
    async fn ping(&self) -> GatewayResult<()>;
}
