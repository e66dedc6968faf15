//! # Self-Describing Meta-Schemas
//!
//! The envelope meta-schema every self-describing document must satisfy,
//! embedded so resolvers can serve it without a repository on disk.

use sdj_core::SchemaKey;
use serde_json::{json, Value};

/// `$schema` URI of the self-describing schema dialect. Schemas written in
/// this dialect are JSON Schema Draft 4 documents with a `self` block.
pub const SELF_DESCRIBING_DIALECT: &str =
    "http://iglucentral.com/schemas/com.snowplowanalytics.self-desc/schema/jsonschema/1-0-0#";

/// `$schema` URI of JSON Schema Draft 4.
pub const DRAFT4_DIALECT: &str = "http://json-schema.org/draft-04/schema#";

/// Pattern a schema key must match inside an envelope.
pub const SCHEMA_KEY_PATTERN: &str =
    "^iglu:[a-zA-Z0-9_.-]+/[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+/[0-9]+-[0-9]+-[0-9]+$";

/// Key under which [`self_describing_schema`] is resolved.
pub fn self_describing_key() -> SchemaKey {
    SchemaKey::self_describing_instance()
}

/// The self-describing instance meta-schema.
///
/// An envelope is an object with exactly two properties: `schema`, a string
/// matching [`SCHEMA_KEY_PATTERN`], and `data`, of any type.
pub fn self_describing_schema() -> Value {
    json!({
        "$schema": SELF_DESCRIBING_DIALECT,
        "description": "Schema for a self-describing JSON instance",
        "self": {
            "vendor": "com.snowplowanalytics.self-desc",
            "name": "instance",
            "format": "jsonschema",
            "version": "1-0-0"
        },
        "type": "object",
        "properties": {
            "schema": {
                "type": "string",
                "pattern": SCHEMA_KEY_PATTERN
            },
            "data": {}
        },
        "required": ["schema", "data"],
        "additionalProperties": false
    })
}
