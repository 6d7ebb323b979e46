//! Versioned entity operations.

mod store;
mod types;

pub use store::EntityStore;
pub use types::{
    ExternalIdQuery, RelationshipQuery, Removed, UpsertOutcome, VersionRecord, VersionStatus,
    VersionSummary,
};
