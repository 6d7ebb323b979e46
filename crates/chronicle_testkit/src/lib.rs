//! # Chronicle Testkit
//!
//! Test utilities for Chronicle.
//!
//! This crate provides:
//! - In-memory store fixtures and common document shapes
//! - Property-based test generators using proptest
//! - A tracing bootstrap for integration tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chronicle_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_store() {
//!     let store = TestStore::new();
//!     store.upsert(person("J Doe")).await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
