//! # Schema Resolution
//!
//! The validation pipeline obtains schema documents only through the
//! [`Resolver`] capability. Caching, retries, and storage are the resolver's
//! business; the pipeline passes an attempt budget through unchanged and
//! surfaces whatever messages the resolver returns.
//!
//! Two reference resolvers are provided:
//!
//! - [`StaticResolver`]: an in-memory map, optionally bootstrapped with the
//!   self-describing meta-schema.
//! - [`DirectoryResolver`]: a static repository on disk laid out as
//!   `<root>/schemas/<vendor>/<name>/<format>/<version>`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use sdj_core::{FailureKind, ProcessingMessage, SchemaKey, ValidationErrors, ValidationResult};
use serde_json::Value;
use thiserror::Error;

use crate::meta;

/// Looks up schema documents by key.
///
/// `max_attempts` is an opaque tuning parameter for implementations that
/// retry; the pipeline always passes
/// [`RESOLUTION_ATTEMPTS`](crate::RESOLUTION_ATTEMPTS).
pub trait Resolver {
    /// Fetch the schema document for `key`, or explain why it is unavailable.
    fn lookup_schema(&self, key: &SchemaKey, max_attempts: u32) -> ValidationResult<Value>;
}

impl<F> Resolver for F
where
    F: Fn(&SchemaKey, u32) -> ValidationResult<Value>,
{
    fn lookup_schema(&self, key: &SchemaKey, max_attempts: u32) -> ValidationResult<Value> {
        self(key, max_attempts)
    }
}

fn resolution_failure(key: &SchemaKey, reason: impl std::fmt::Display) -> ValidationErrors {
    ValidationErrors::one(
        ProcessingMessage::new(FailureKind::ResolutionFailure, reason.to_string())
            .with_targets([key.to_string()]),
    )
}

// ---------------------------------------------------------------------------
// StaticResolver
// ---------------------------------------------------------------------------

/// In-memory resolver over a fixed set of schemas.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    schemas: HashMap<SchemaKey, Value>,
}

impl StaticResolver {
    /// An empty resolver. Envelope checks fail against it until the
    /// meta-schema is registered; see [`StaticResolver::bootstrapped`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver preloaded with the self-describing meta-schema.
    pub fn bootstrapped() -> Self {
        Self::new().with_schema(meta::self_describing_key(), meta::self_describing_schema())
    }

    /// Builder form of [`StaticResolver::insert`].
    pub fn with_schema(mut self, key: SchemaKey, schema: Value) -> Self {
        self.insert(key, schema);
        self
    }

    /// Register `schema` under `key`, returning any schema it replaces.
    pub fn insert(&mut self, key: SchemaKey, schema: Value) -> Option<Value> {
        self.schemas.insert(key, schema)
    }

    pub fn contains(&self, key: &SchemaKey) -> bool {
        self.schemas.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Resolver for StaticResolver {
    fn lookup_schema(&self, key: &SchemaKey, _max_attempts: u32) -> ValidationResult<Value> {
        self.schemas
            .get(key)
            .cloned()
            .ok_or_else(|| resolution_failure(key, format!("schema {key} is not registered")))
    }
}

// ---------------------------------------------------------------------------
// DirectoryResolver
// ---------------------------------------------------------------------------

/// Error reading a schema from a static repository.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No file exists for the key.
    #[error("schema {key} not found at {path}")]
    NotFound {
        /// The requested key.
        key: String,
        /// Where the schema was expected.
        path: String,
    },

    /// The file exists but could not be read.
    #[error("failed to read schema {key} from {path} after {attempts} attempt(s): {source}")]
    Io {
        /// The requested key.
        key: String,
        /// The file that failed to read.
        path: String,
        /// Number of reads attempted.
        attempts: u32,
        /// The last I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON.
    #[error("schema {key} at {path} is not valid JSON: {source}")]
    InvalidJson {
        /// The requested key.
        key: String,
        /// The file that failed to parse.
        path: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Resolver over a static schema repository on the local filesystem.
///
/// A key `iglu:com.acme/event/jsonschema/1-0-0` resolves to
/// `<root>/schemas/com.acme/event/jsonschema/1-0-0`. The self-describing
/// meta-schema is served from the embedded copy when the repository does
/// not carry it.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a key resolves to.
    pub fn schema_path(&self, key: &SchemaKey) -> PathBuf {
        self.root
            .join("schemas")
            .join(key.vendor())
            .join(key.name())
            .join(key.format())
            .join(key.version().to_string())
    }

    /// Read and parse the schema for `key`.
    ///
    /// I/O errors other than `NotFound` are retried until `max_attempts`
    /// reads have been made (at least one read is always made). Parse
    /// errors are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] describing the final failure.
    pub fn read_schema(&self, key: &SchemaKey, max_attempts: u32) -> Result<Value, RepositoryError> {
        let path = self.schema_path(key);
        let attempts = max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    return serde_json::from_str(&content).map_err(|source| {
                        RepositoryError::InvalidJson {
                            key: key.to_string(),
                            path: path.display().to_string(),
                            source,
                        }
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(RepositoryError::NotFound {
                        key: key.to_string(),
                        path: path.display().to_string(),
                    })
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        schema = %key,
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "schema read failed; retrying"
                    );
                }
                Err(source) => {
                    return Err(RepositoryError::Io {
                        key: key.to_string(),
                        path: path.display().to_string(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}

impl Resolver for DirectoryResolver {
    fn lookup_schema(&self, key: &SchemaKey, max_attempts: u32) -> ValidationResult<Value> {
        match self.read_schema(key, max_attempts) {
            Ok(schema) => {
                tracing::debug!(schema = %key, "resolved schema from repository");
                Ok(schema)
            }
            Err(RepositoryError::NotFound { .. }) if *key == meta::self_describing_key() => {
                Ok(meta::self_describing_schema())
            }
            Err(e) => {
                tracing::debug!(schema = %key, error = %e, "schema resolution failed");
                Err(resolution_failure(key, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> SchemaKey {
        SchemaKey::parse(s).unwrap()
    }

    #[test]
    fn test_static_resolver_lookup() {
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        let resolver = StaticResolver::new().with_schema(k.clone(), json!({"type": "object"}));
        assert_eq!(resolver.len(), 1);
        assert!(resolver.contains(&k));
        assert_eq!(resolver.lookup_schema(&k, 3).unwrap(), json!({"type": "object"}));
    }

    #[test]
    fn test_static_resolver_missing_key() {
        let resolver = StaticResolver::new();
        assert!(resolver.is_empty());
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        let errors = resolver.lookup_schema(&k, 3).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().kind(), FailureKind::ResolutionFailure);
        assert_eq!(
            errors.first().targets(),
            Some(&["iglu:com.acme/event/jsonschema/1-0-0".to_string()][..])
        );
    }

    #[test]
    fn test_static_resolver_bootstrapped_has_meta_schema() {
        let resolver = StaticResolver::bootstrapped();
        assert_eq!(
            resolver.lookup_schema(&meta::self_describing_key(), 3).unwrap(),
            meta::self_describing_schema()
        );
    }

    #[test]
    fn test_insert_replaces() {
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        let mut resolver = StaticResolver::new();
        assert!(resolver.insert(k.clone(), json!({})).is_none());
        assert_eq!(resolver.insert(k, json!({"type": "string"})), Some(json!({})));
    }

    #[test]
    fn test_closure_resolver_receives_attempts() {
        let resolver = |_: &SchemaKey, attempts: u32| -> ValidationResult<Value> {
            Ok(json!({ "attempts": attempts }))
        };
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        assert_eq!(resolver.lookup_schema(&k, 7).unwrap(), json!({"attempts": 7}));
    }

    #[test]
    fn test_directory_resolver_layout() {
        let resolver = DirectoryResolver::new("/repo");
        let path = resolver.schema_path(&key("iglu:com.acme/event/jsonschema/1-2-0"));
        assert_eq!(
            path,
            PathBuf::from("/repo/schemas/com.acme/event/jsonschema/1-2-0")
        );
    }

    #[test]
    fn test_directory_resolver_reads_schema() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        let path = resolver.schema_path(&k);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();
        assert_eq!(resolver.lookup_schema(&k, 3).unwrap(), json!({"type": "object"}));
    }

    #[test]
    fn test_directory_resolver_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        assert!(matches!(
            resolver.read_schema(&k, 3),
            Err(RepositoryError::NotFound { .. })
        ));
        let errors = resolver.lookup_schema(&k, 3).unwrap_err();
        assert_eq!(errors.first().kind(), FailureKind::ResolutionFailure);
        assert!(errors.first().message().contains("not found"));
    }

    #[test]
    fn test_directory_resolver_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        let path = resolver.schema_path(&k);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            resolver.read_schema(&k, 3),
            Err(RepositoryError::InvalidJson { .. })
        ));
        let errors = resolver.lookup_schema(&k, 3).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().kind(), FailureKind::ResolutionFailure);
        assert!(errors.first().message().contains("is not valid JSON"));
        assert_eq!(
            errors.first().targets(),
            Some(&["iglu:com.acme/event/jsonschema/1-0-0".to_string()][..])
        );
    }

    #[test]
    fn test_directory_resolver_io_error_reports_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        let k = key("iglu:com.acme/event/jsonschema/1-0-0");
        // A directory where the schema file should be makes every read fail.
        std::fs::create_dir_all(resolver.schema_path(&k)).unwrap();
        match resolver.read_schema(&k, 3) {
            Err(RepositoryError::Io { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_resolver_serves_embedded_meta_schema() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        assert_eq!(
            resolver.lookup_schema(&meta::self_describing_key(), 3).unwrap(),
            meta::self_describing_schema()
        );
    }
}
