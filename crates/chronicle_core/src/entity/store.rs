//! The versioning engine.

use crate::entity::types::{
    ExternalIdQuery, RelationshipQuery, Removed, UpsertOutcome, VersionRecord, VersionStatus,
    VersionSummary,
};
use crate::error::{CoreError, CoreResult};
use chronicle_codec::{
    document_from_latest, document_from_version, encode_document, Document, EntityId, VersionId,
};
use chronicle_gateway::{
    NewHeadRow, NewVersionRow, PublishMode, PublishOutcome, StorageGateway,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Versioned entity store.
///
/// `EntityStore` owns the conflict-detection and latest-pointer-update
/// protocol over an append-only version history. It holds no locks of its
/// own: cross-writer consistency rests entirely on the gateway's atomic
/// publish, so concurrent upserts race to append versions and the last head
/// update to commit wins as "latest".
///
/// Reads go to the reader gateway (a replica, when one is configured);
/// mutations and must-be-fresh reads always go to the primary.
///
/// # Example
///
/// ```rust,ignore
/// use chronicle_core::EntityStore;
/// use chronicle_gateway::MemoryGateway;
/// use std::sync::Arc;
///
/// let store = EntityStore::new(Arc::new(MemoryGateway::new()));
/// let outcome = store.upsert(document).await?;
/// let loaded = store.load(&outcome.entity_id, false).await?;
/// ```
pub struct EntityStore {
    /// Read-write gateway.
    primary: Arc<dyn StorageGateway>,
    /// Read-only gateway; the primary when no replica is configured.
    reader: Arc<dyn StorageGateway>,
}

impl EntityStore {
    /// Creates a store over a single read-write gateway.
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        let reader = Arc::clone(&gateway);
        Self {
            primary: gateway,
            reader,
        }
    }

    /// Creates a store with a separate read-only gateway for lookups.
    pub fn with_reader(primary: Arc<dyn StorageGateway>, reader: Arc<dyn StorageGateway>) -> Self {
        Self { primary, reader }
    }

    /// Writes a document as a new version of its entity.
    ///
    /// The entity id is taken from the document or freshly generated. The
    /// version insert is conditioned on the entity not being soft-deleted;
    /// a removed entity rejects the write, reported as `was_conflict` with
    /// nothing written. `was_insert` distinguishes entity creation from an
    /// update of an existing entity.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the document has no type.
    pub async fn upsert(&self, document: Document) -> CoreResult<UpsertOutcome> {
        self.publish_document(document, PublishMode::Guarded).await
    }

    /// Loads an entity's current document.
    ///
    /// Returns `None` for unknown entities and, unless `force` is set, for
    /// soft-deleted ones. Engine-managed metadata is overlaid from the
    /// authoritative row timestamps.
    pub async fn load(&self, id: &EntityId, force: bool) -> CoreResult<Option<Document>> {
        let Some(row) = self.reader.latest(id.as_str(), force).await? else {
            return Ok(None);
        };
        Ok(Some(document_from_latest(&row)?))
    }

    /// Loads one immutable version.
    ///
    /// Returns `None` when the version does not exist or, unless `force`
    /// is set, when its owning entity is soft-deleted.
    pub async fn load_version(
        &self,
        version_id: &VersionId,
        force: bool,
    ) -> CoreResult<Option<VersionRecord>> {
        let Some(row) = self.reader.version(version_id.as_str(), force).await? else {
            return Ok(None);
        };
        let entity = document_from_version(&row)?;
        Ok(Some(VersionRecord {
            created: row.created,
            version_id: VersionId::from(row.version_id),
            correlation_id: row.correlation_id,
            entity,
        }))
    }

    /// Lists an entity's version history, oldest first.
    ///
    /// Exactly one entry is [`VersionStatus::Current`]. Unless `force` is
    /// set, a soft-deleted entity yields an empty list - the same shape an
    /// unknown entity yields, so callers need no special casing.
    pub async fn list_versions(
        &self,
        entity_id: &EntityId,
        force: bool,
    ) -> CoreResult<Vec<VersionSummary>> {
        let rows = self.reader.versions(entity_id.as_str(), force).await?;
        Ok(rows
            .into_iter()
            .map(|row| VersionSummary {
                version_id: VersionId::from(row.version_id),
                created: row.created,
                correlation_id: row.correlation_id,
                status: if row.is_latest {
                    VersionStatus::Current
                } else {
                    VersionStatus::PreviouslyPublished
                },
            })
            .collect())
    }

    /// Soft-deletes an entity.
    ///
    /// Records a tombstone version (emptied document carrying the given
    /// correlation id), then marks the head removed. Removing an unknown or
    /// already-removed entity is a no-op reported as `removed: None`.
    pub async fn remove(
        &self,
        id: &EntityId,
        correlation_id: Option<String>,
    ) -> CoreResult<Removed> {
        let Some(row) = self.primary.latest(id.as_str(), true).await? else {
            return Ok(Removed { removed: None });
        };
        if row.removed_at.is_some() {
            return Ok(Removed { removed: None });
        }

        let current = document_from_latest(&row)?;
        let outcome = self.upsert(current.tombstone(correlation_id)).await?;
        if outcome.was_conflict {
            // A concurrent remover won the race to the tombstone.
            return Ok(Removed { removed: None });
        }

        let marked = self.primary.mark_removed(id.as_str()).await?;
        debug!(entity_id = %id, marked, "entity removed");
        Ok(Removed {
            removed: marked.then(|| id.clone()),
        })
    }

    /// Restores an entity to the state captured by one of its versions.
    ///
    /// Clears the entity's removed mark, then re-writes the target
    /// version's document as a brand-new version with fresh timestamps and
    /// the given correlation id. Restoration appends to history; it never
    /// rewinds it.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] when the version does not exist.
    pub async fn restore_version(
        &self,
        version_id: &VersionId,
        correlation_id: Option<String>,
    ) -> CoreResult<UpsertOutcome> {
        let Some(row) = self.primary.version(version_id.as_str(), true).await? else {
            return Err(CoreError::not_found(format!("version {version_id}")));
        };

        self.primary.clear_removed(&row.entity_id).await?;

        let mut document = document_from_version(&row)?;
        document.meta.correlation_id = correlation_id;
        document.meta.created_at = None;
        document.meta.updated_at = None;

        let outcome = self.upsert(document).await?;
        info!(
            entity_id = %outcome.entity_id,
            restored_from = %version_id,
            "version restored"
        );
        Ok(outcome)
    }

    /// Irreversibly compacts an entity's history down to one version.
    ///
    /// The given document is force-written as a new version (the removal
    /// guard does not apply), then every other version row of the entity is
    /// deleted. The write strictly precedes the delete so the entity has at
    /// least one version row at all times.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the document lacks an id or type, and
    /// [`CoreError::NotFound`] when the entity does not exist.
    pub async fn clean_history(&self, document: Document) -> CoreResult<()> {
        let Some(id) = document.id.clone() else {
            return Err(CoreError::validation("document has no id"));
        };
        if document.entity_type.trim().is_empty() {
            return Err(CoreError::validation("document has no type"));
        }
        if self.primary.latest(id.as_str(), true).await?.is_none() {
            return Err(CoreError::not_found(format!("entity {id}")));
        }

        let outcome = self.publish_document(document, PublishMode::Force).await?;
        let Some(version_id) = outcome.version_id else {
            return Err(chronicle_gateway::GatewayError::backend(
                "forced publish reported a conflict",
            )
            .into());
        };

        let pruned = self
            .primary
            .prune_versions(id.as_str(), version_id.as_str())
            .await?;
        info!(entity_id = %id, pruned, "entity history compacted");
        Ok(())
    }

    /// Finds entities whose latest version contains all given relationship
    /// tuples (superset match), restricted to non-removed entities of the
    /// given type.
    ///
    /// An empty result is `Ok` unless the query asks to error on no match.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the type or the criteria are missing.
    pub async fn query_by_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> CoreResult<Vec<Document>> {
        let documents = self.relationship_matches(query).await?;
        if documents.is_empty() && query.error_on_not_found {
            return Err(CoreError::not_found(format!(
                "no {} entity matches the given relationships",
                query.entity_type
            )));
        }
        Ok(documents)
    }

    /// Like [`query_by_relationships`](Self::query_by_relationships), but
    /// expects at most one match.
    ///
    /// # Errors
    ///
    /// [`CoreError::Ambiguous`] when more than one entity matches.
    pub async fn find_one_by_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> CoreResult<Option<Document>> {
        let mut documents = self.relationship_matches(query).await?;
        if documents.len() > 1 {
            return Err(CoreError::ambiguous(format!(
                "{} {} entities match the given relationships",
                documents.len(),
                query.entity_type
            )));
        }
        match documents.pop() {
            Some(document) => Ok(Some(document)),
            None if query.error_on_not_found => Err(CoreError::not_found(format!(
                "no {} entity matches the given relationships",
                query.entity_type
            ))),
            None => Ok(None),
        }
    }

    /// Looks an entity up by one of its external ids.
    ///
    /// Matches `externalIds[system][id_type]` against the given id on the
    /// latest versions of non-removed entities of the given type. More than
    /// one match is a data-integrity failure surfaced to the caller, never
    /// silently resolved.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] on missing criteria and
    /// [`CoreError::Ambiguous`] on duplicate matches.
    pub async fn load_by_external_id(
        &self,
        query: &ExternalIdQuery,
    ) -> CoreResult<Option<Document>> {
        if query.entity_type.trim().is_empty()
            || query.system.trim().is_empty()
            || query.id_type.trim().is_empty()
            || query.id.is_null()
        {
            return Err(CoreError::validation(
                "external-id lookup needs a type, system, id type and id",
            ));
        }

        let rows = self.reader.latest_of_type(&query.entity_type).await?;
        let mut matches = Vec::new();
        for row in rows {
            let document = document_from_latest(&row)?;
            if document.external_id_matches(&query.system, &query.id_type, &query.id) {
                matches.push(document);
            }
        }

        if matches.len() > 1 {
            warn!(
                entity_type = %query.entity_type,
                system = %query.system,
                id_type = %query.id_type,
                count = matches.len(),
                "external id is not unique"
            );
            return Err(CoreError::ambiguous(format!(
                "{} {} entities share external id {}/{}",
                matches.len(),
                query.entity_type,
                query.system,
                query.id_type
            )));
        }
        match matches.pop() {
            Some(document) => Ok(Some(document)),
            None if query.error_on_not_found => Err(CoreError::not_found(format!(
                "no {} entity carries external id {}/{}",
                query.entity_type, query.system, query.id_type
            ))),
            None => Ok(None),
        }
    }

    /// Liveness probe: round-trips both gateways.
    pub async fn status(&self) -> CoreResult<()> {
        self.primary.ping().await?;
        self.reader.ping().await?;
        Ok(())
    }

    async fn relationship_matches(&self, query: &RelationshipQuery) -> CoreResult<Vec<Document>> {
        if query.entity_type.trim().is_empty() {
            return Err(CoreError::validation("relationship query has no type"));
        }
        if query.relationships.is_empty() {
            return Err(CoreError::validation(
                "relationship query has no criteria",
            ));
        }
        if query
            .relationships
            .iter()
            .any(|criterion| criterion.rel_type.trim().is_empty() || criterion.id.trim().is_empty())
        {
            return Err(CoreError::validation(
                "relationship criteria need a type and an id",
            ));
        }

        let rows = self.reader.latest_of_type(&query.entity_type).await?;
        let mut documents = Vec::new();
        for row in rows {
            let document = document_from_latest(&row)?;
            if document.contains_relationships(&query.relationships) {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    async fn publish_document(
        &self,
        mut document: Document,
        mode: PublishMode,
    ) -> CoreResult<UpsertOutcome> {
        if document.entity_type.trim().is_empty() {
            return Err(CoreError::validation("document has no type"));
        }

        let entity_id = document.id.clone().unwrap_or_else(EntityId::random);
        document.id = Some(entity_id.clone());
        let version_id = VersionId::random();

        let version = NewVersionRow {
            version_id: version_id.to_string(),
            entity_id: entity_id.to_string(),
            correlation_id: document.meta.correlation_id.clone(),
            doc: encode_document(&document)?,
        };
        let head = NewHeadRow {
            entity_id: entity_id.to_string(),
            entity_type: document.entity_type.clone(),
        };

        match self.primary.publish(version, head, mode).await? {
            PublishOutcome::Conflict => {
                debug!(entity_id = %entity_id, "upsert rejected: entity is removed");
                Ok(UpsertOutcome {
                    entity_id,
                    version_id: None,
                    was_insert: false,
                    was_conflict: true,
                })
            }
            PublishOutcome::Published(published) => {
                debug!(
                    entity_id = %entity_id,
                    version_id = %version_id,
                    was_insert = published.was_insert,
                    "version published"
                );
                Ok(UpsertOutcome {
                    entity_id,
                    version_id: Some(version_id),
                    was_insert: published.was_insert,
                    was_conflict: false,
                })
            }
        }
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_gateway::MemoryGateway;
    use serde_json::json;

    fn store() -> EntityStore {
        EntityStore::new(Arc::new(MemoryGateway::new()))
    }

    #[tokio::test]
    async fn upsert_generates_an_id_when_absent() {
        let store = store();
        let outcome = store
            .upsert(Document::new("person", json!({"name": "J Doe"})))
            .await
            .unwrap();

        assert!(outcome.was_insert);
        assert!(!outcome.was_conflict);
        assert!(outcome.version_id.is_some());
        assert!(!outcome.entity_id.as_str().is_empty());
    }

    #[tokio::test]
    async fn upsert_without_type_is_rejected() {
        let store = store();
        let result = store.upsert(Document::new("", json!({}))).await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn load_overlays_engine_metadata() {
        let store = store();
        let mut doc = Document::new("person", json!({"name": "J Doe"}));
        doc.meta.correlation_id = Some("corr-1".to_string());
        let outcome = store.upsert(doc).await.unwrap();

        let loaded = store.load(&outcome.entity_id, false).await.unwrap().unwrap();
        assert_eq!(loaded.meta.correlation_id.as_deref(), Some("corr-1"));
        assert!(loaded.meta.created_at.is_some());
        assert!(loaded.meta.updated_at.is_some());
    }

    #[tokio::test]
    async fn load_unknown_entity_is_none() {
        let store = store();
        let loaded = store.load(&EntityId::new("missing"), false).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn restore_of_unknown_version_is_not_found() {
        let store = store();
        let result = store
            .restore_version(&VersionId::new("missing"), None)
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn clean_history_validates_input() {
        let store = store();

        let no_id = Document::new("person", json!({}));
        assert!(matches!(
            store.clean_history(no_id).await,
            Err(CoreError::Validation { .. })
        ));

        let no_type = Document::new("", json!({})).with_id("e1");
        assert!(matches!(
            store.clean_history(no_type).await,
            Err(CoreError::Validation { .. })
        ));

        let unknown = Document::new("person", json!({})).with_id("missing");
        assert!(matches!(
            store.clean_history(unknown).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn relationship_query_validates_criteria() {
        let store = store();

        let empty = RelationshipQuery::new("person", vec![]);
        assert!(matches!(
            store.query_by_relationships(&empty).await,
            Err(CoreError::Validation { .. })
        ));

        let blank = RelationshipQuery::new(
            "person",
            vec![chronicle_codec::Relationship::new("", "c1")],
        );
        assert!(matches!(
            store.query_by_relationships(&blank).await,
            Err(CoreError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn status_round_trips() {
        let store = store();
        store.status().await.unwrap();
    }
}
