//! # sdj-schema — Resolution-Aware Validation
//!
//! Validates self-describing JSON documents against schemas fetched through
//! a pluggable [`Resolver`].
//!
//! ## Pipeline (`validator`)
//!
//! [`Validator::validate_and_identify_schema`] runs, in order:
//!
//! 1. envelope shape check against the self-describing meta-schema
//!    (itself fetched through the resolver),
//! 2. envelope split into schema key string and payload,
//! 3. schema key parse (and, for [`Validator::verify_schema_and_validate`],
//!    a criterion check),
//! 4. schema resolution,
//! 5. payload validation.
//!
//! The first failing stage ends the call; its messages are the result.
//!
//! ## Engine (`engine`)
//!
//! [`SchemaEngine`] is the compile + validate seam. [`JsonSchemaEngine`]
//! implements it with the `jsonschema` crate, reporting every violation of
//! one pass in traversal order.
//!
//! ## Resolvers (`resolver`)
//!
//! The pipeline only consumes the [`Resolver`] trait. [`StaticResolver`]
//! (in-memory) and [`DirectoryResolver`] (static repository on disk) are
//! reference implementations; any `Fn(&SchemaKey, u32)` closure also works.
//!
//! ## Crate Policy
//!
//! - Depends only on `sdj-core` internally.
//! - No caching of compiled schemas; caching belongs to resolvers.
//! - Validation never panics on well-formed JSON input.

pub mod engine;
pub mod meta;
pub mod resolver;
pub mod validator;

pub use engine::{CompiledSchema, JsonSchemaEngine, SchemaEngine};
pub use resolver::{DirectoryResolver, RepositoryError, Resolver, StaticResolver};
pub use validator::{Validator, RESOLUTION_ATTEMPTS};
