//! # sdj-core — Foundational Types for Self-Describing JSON
//!
//! A self-describing JSON document is an envelope of the shape
//! `{"schema": "iglu:vendor/name/format/1-0-0", "data": ...}`: the envelope
//! names the schema that governs its payload. This crate defines the pure,
//! I/O-free building blocks used to validate such documents.
//!
//! ## Key Design Principles
//!
//! 1. **Validated constructors for schema identity.** `SchemaKey`,
//!    `SchemaVer`, and `SchemaCriterion` can only be produced by parsers that
//!    enforce the key grammar. No bare strings past the parse boundary.
//!
//! 2. **Failure is never empty.** `ValidationErrors` is a head + tail
//!    collection. A failed validation always carries at least one
//!    `ProcessingMessage`.
//!
//! 3. **One error shape.** Envelope, key, criterion, resolution, compile, and
//!    structural failures all surface as `ProcessingMessage`, tagged with a
//!    `FailureKind`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sdj-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod criterion;
pub mod envelope;
pub mod error;
pub mod key;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use criterion::SchemaCriterion;
pub use envelope::{split, Envelope};
pub use error::{
    FailureKind, KeyParseError, ProcessingMessage, ValidationErrors, ValidationResult,
    VersionParseError,
};
pub use key::SchemaKey;
pub use version::{PartialSchemaVer, SchemaVer};
