//! # Chronicle Core
//!
//! Versioned entity store engine.
//!
//! Chronicle keeps an immutable, append-only history of document versions
//! per entity on top of a relational backend, with:
//! - "latest" pointer semantics and optimistic concurrency
//! - soft deletion and restoration
//! - relationship and external-id lookups
//! - irreversible history compaction
//!
//! The backend is reached through the [`chronicle_gateway::StorageGateway`]
//! trait; documents are typed by [`chronicle_codec`]. This crate owns the
//! versioning protocol: what counts as a conflict, how tombstones are
//! recorded, and which timestamps are authoritative.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bootstrap;
mod entity;
mod error;
mod kv;

pub use bootstrap::SchemaBootstrapper;
pub use entity::{
    EntityStore, ExternalIdQuery, RelationshipQuery, Removed, UpsertOutcome, VersionRecord,
    VersionStatus, VersionSummary,
};
pub use error::{CoreError, CoreResult};
pub use kv::KeyValueStore;

// Re-exported so callers can work with a single crate.
pub use chronicle_codec::{Document, EntityId, Meta, Relationship, VersionId};
pub use chronicle_gateway::{GatewayError, MemoryGateway, StorageGateway};
