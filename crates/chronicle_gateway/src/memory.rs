//! In-memory storage gateway.

use crate::error::GatewayResult;
use crate::gateway::StorageGateway;
use crate::rows::{
    LatestRow, NewHeadRow, NewVersionRow, PublishMode, PublishOutcome, Published, VersionRow,
    VersionSummaryRow,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct HeadRow {
    entity_type: String,
    entity_created: DateTime<Utc>,
    latest_version_id: String,
    removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    entity_id: String,
    created: DateTime<Utc>,
    correlation_id: Option<String>,
    doc: Value,
}

#[derive(Debug, Clone)]
struct KvRow {
    doc: Value,
    updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    heads: HashMap<String, HeadRow>,
    // Insertion order doubles as creation order.
    versions: Vec<StoredVersion>,
    kv: HashMap<String, KvRow>,
    scripts: Vec<String>,
}

/// An in-memory storage gateway.
///
/// Holds the `entity`, `entity_version` and `key_value` tables in process
/// memory. Suitable for:
/// - Unit and integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// All tables sit behind a single [`parking_lot::RwLock`]; every trait
/// method is one lock acquisition, so the guarded publish is linearized
/// exactly as a single conditional SQL statement would be.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: RwLock<Tables>,
}

impl MemoryGateway {
    /// Creates a new empty in-memory gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the DDL scripts executed so far, in order.
    ///
    /// Useful for testing the schema bootstrapper.
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.tables.read().scripts.clone()
    }

    /// Returns when a key-value row was last written.
    ///
    /// Useful for testing the upsert-on-conflict refresh semantics.
    #[must_use]
    pub fn kv_updated_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.tables.read().kv.get(key).map(|row| row.updated)
    }

    /// Drops all rows from all tables.
    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.heads.clear();
        tables.versions.clear();
        tables.kv.clear();
    }

    fn latest_row(tables: &Tables, entity_id: &str, head: &HeadRow) -> Option<LatestRow> {
        let version = tables
            .versions
            .iter()
            .find(|v| v.version_id == head.latest_version_id)?;
        Some(LatestRow {
            entity_id: entity_id.to_string(),
            entity_type: head.entity_type.clone(),
            entity_created: head.entity_created,
            removed_at: head.removed_at,
            version_id: version.version_id.clone(),
            version_created: version.created,
            correlation_id: version.correlation_id.clone(),
            doc: version.doc.clone(),
        })
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn publish(
        &self,
        version: NewVersionRow,
        head: NewHeadRow,
        mode: PublishMode,
    ) -> GatewayResult<PublishOutcome> {
        let mut tables = self.tables.write();

        if mode == PublishMode::Guarded {
            if let Some(existing) = tables.heads.get(&head.entity_id) {
                if existing.removed_at.is_some() {
                    return Ok(PublishOutcome::Conflict);
                }
            }
        }

        let now = Utc::now();
        tables.versions.push(StoredVersion {
            version_id: version.version_id.clone(),
            entity_id: version.entity_id,
            created: now,
            correlation_id: version.correlation_id,
            doc: version.doc,
        });

        let (entity_created, was_insert) = match tables.heads.get_mut(&head.entity_id) {
            Some(existing) => {
                existing.latest_version_id = version.version_id;
                (existing.entity_created, false)
            }
            None => {
                tables.heads.insert(
                    head.entity_id,
                    HeadRow {
                        entity_type: head.entity_type,
                        entity_created: now,
                        latest_version_id: version.version_id,
                        removed_at: None,
                    },
                );
                (now, true)
            }
        };

        Ok(PublishOutcome::Published(Published {
            version_created: now,
            entity_created,
            was_insert,
        }))
    }

    async fn latest(
        &self,
        entity_id: &str,
        include_removed: bool,
    ) -> GatewayResult<Option<LatestRow>> {
        let tables = self.tables.read();
        let Some(head) = tables.heads.get(entity_id) else {
            return Ok(None);
        };
        if !include_removed && head.removed_at.is_some() {
            return Ok(None);
        }
        Ok(Self::latest_row(&tables, entity_id, head))
    }

    async fn version(
        &self,
        version_id: &str,
        include_removed: bool,
    ) -> GatewayResult<Option<VersionRow>> {
        let tables = self.tables.read();
        let Some(version) = tables.versions.iter().find(|v| v.version_id == version_id) else {
            return Ok(None);
        };
        let Some(head) = tables.heads.get(&version.entity_id) else {
            return Ok(None);
        };
        if !include_removed && head.removed_at.is_some() {
            return Ok(None);
        }
        Ok(Some(VersionRow {
            version_id: version.version_id.clone(),
            entity_id: version.entity_id.clone(),
            created: version.created,
            entity_created: head.entity_created,
            correlation_id: version.correlation_id.clone(),
            doc: version.doc.clone(),
        }))
    }

    async fn versions(
        &self,
        entity_id: &str,
        include_removed: bool,
    ) -> GatewayResult<Vec<VersionSummaryRow>> {
        let tables = self.tables.read();
        if !include_removed {
            if let Some(head) = tables.heads.get(entity_id) {
                if head.removed_at.is_some() {
                    return Ok(Vec::new());
                }
            }
        }
        let latest_id = tables
            .heads
            .get(entity_id)
            .map(|h| h.latest_version_id.clone());
        Ok(tables
            .versions
            .iter()
            .filter(|v| v.entity_id == entity_id)
            .map(|v| VersionSummaryRow {
                version_id: v.version_id.clone(),
                created: v.created,
                correlation_id: v.correlation_id.clone(),
                is_latest: latest_id.as_deref() == Some(v.version_id.as_str()),
            })
            .collect())
    }

    async fn latest_of_type(&self, entity_type: &str) -> GatewayResult<Vec<LatestRow>> {
        let tables = self.tables.read();
        Ok(tables
            .heads
            .iter()
            .filter(|(_, head)| head.entity_type == entity_type && head.removed_at.is_none())
            .filter_map(|(id, head)| Self::latest_row(&tables, id, head))
            .collect())
    }

    async fn mark_removed(&self, entity_id: &str) -> GatewayResult<bool> {
        let mut tables = self.tables.write();
        match tables.heads.get_mut(entity_id) {
            Some(head) if head.removed_at.is_none() => {
                head.removed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_removed(&self, entity_id: &str) -> GatewayResult<bool> {
        let mut tables = self.tables.write();
        match tables.heads.get_mut(entity_id) {
            Some(head) => Ok(head.removed_at.take().is_some()),
            None => Ok(false),
        }
    }

    async fn prune_versions(&self, entity_id: &str, keep_version_id: &str) -> GatewayResult<u64> {
        let mut tables = self.tables.write();
        let before = tables.versions.len();
        tables
            .versions
            .retain(|v| v.entity_id != entity_id || v.version_id == keep_version_id);
        Ok((before - tables.versions.len()) as u64)
    }

    async fn kv_get(&self, key: &str) -> GatewayResult<Option<Value>> {
        Ok(self.tables.read().kv.get(key).map(|row| row.doc.clone()))
    }

    async fn kv_put(&self, key: &str, doc: Value) -> GatewayResult<()> {
        self.tables.write().kv.insert(
            key.to_string(),
            KvRow {
                doc,
                updated: Utc::now(),
            },
        );
        Ok(())
    }

    async fn run_script(&self, sql: &str) -> GatewayResult<()> {
        self.tables.write().scripts.push(sql.to_string());
        Ok(())
    }

    async fn ping(&self) -> GatewayResult<()> {
        Ok(())
    }
}
