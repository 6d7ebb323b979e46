//! # Chronicle Codec
//!
//! Typed document envelope and row codec for Chronicle.
//!
//! This crate maps between the wire-level entity representation (id, type,
//! attributes, relationships, external ids, metadata) and the two persisted
//! row shapes (entity head, entity version). The envelope is fully typed so
//! malformed input is caught at the boundary; only `attributes` stays
//! opaque.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod ids;
mod merge;

pub use document::{Document, Meta, Relationship};
pub use error::{CodecError, CodecResult};
pub use ids::{EntityId, VersionId};
pub use merge::{decode_document, document_from_latest, document_from_version, encode_document};
