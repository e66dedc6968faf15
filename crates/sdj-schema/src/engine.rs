//! # Validation Engine Adapter
//!
//! Wraps the `jsonschema` crate behind the narrow [`SchemaEngine`] seam:
//! compile a schema document once, then validate an instance against it.
//! Engine-native error records are translated into [`ProcessingMessage`]s.
//!
//! ## Dialect
//!
//! All schemas compile as JSON Schema Draft 4. Schemas declaring the
//! self-describing dialect (`$schema` = [`SELF_DESCRIBING_DIALECT`]) are
//! rewritten to the Draft 4 URI before compilation; their extra `self`
//! block is an unknown keyword and is ignored. Any other declared `$schema`
//! (draft-07, 2020-12, ...) fails compilation instead of being validated
//! under Draft 4 rules. Remote `$ref` retrieval is
//! disabled: schemas arrive through resolvers, never through the engine.
//!
//! ## Error mapping
//!
//! | engine field       | message field |
//! |--------------------|---------------|
//! | `instance_path`    | `json_path`   |
//! | last `schema_path` segment | `keyword` |
//! | error kind         | `targets`     |
//!
//! Every violation of one pass is reported, in the engine's traversal order.

use std::fmt;

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{Draft, Retrieve, Uri, ValidationError, Validator};
use sdj_core::{FailureKind, ProcessingMessage, ValidationErrors, ValidationResult};
use serde_json::Value;

use crate::meta::{DRAFT4_DIALECT, SELF_DESCRIBING_DIALECT};

/// Compile + validate contract of a JSON Schema engine.
///
/// Implementations must report every violation found in one pass, in a
/// deterministic order, and must not cache across calls.
pub trait SchemaEngine: Send + Sync {
    /// The executable form of a schema document.
    type Compiled;

    /// Compile `schema`, failing with one
    /// [`FailureKind::SchemaCompileFailure`] message if it is not a valid
    /// schema.
    fn compile(&self, schema: &Value) -> Result<Self::Compiled, ProcessingMessage>;

    /// Validate `instance`, failing with one
    /// [`FailureKind::StructuralViolation`] message per violation.
    fn validate(&self, compiled: &Self::Compiled, instance: &Value) -> ValidationResult<()>;
}

/// [`SchemaEngine`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaEngine;

/// A schema compiled by [`JsonSchemaEngine`], scoped to a single call.
pub struct CompiledSchema {
    validator: Validator,
    /// The dialect-normalized document, used to look up keyword arguments.
    document: Value,
}

impl CompiledSchema {
    /// The schema document the validator was compiled from.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl SchemaEngine for JsonSchemaEngine {
    type Compiled = CompiledSchema;

    fn compile(&self, schema: &Value) -> Result<CompiledSchema, ProcessingMessage> {
        let document = normalize_dialect(schema)?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .with_retriever(NoRemoteRetriever)
            .build(&document)
            .map_err(|e| compile_failure(&e))?;
        Ok(CompiledSchema {
            validator,
            document,
        })
    }

    fn validate(&self, compiled: &CompiledSchema, instance: &Value) -> ValidationResult<()> {
        let messages: Vec<ProcessingMessage> = compiled
            .validator
            .iter_errors(instance)
            .map(|e| violation(&e))
            .collect();
        match ValidationErrors::from_vec(messages) {
            None => Ok(()),
            Some(errors) => Err(errors),
        }
    }
}

/// Rejects every `$ref` the engine would otherwise fetch over the network.
struct NoRemoteRetriever;

impl Retrieve for NoRemoteRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("remote schema retrieval is disabled: {}", uri.as_str()).into())
    }
}

/// Rewrite the self-describing `$schema` URI and Draft 4 aliases to the
/// canonical Draft 4 URI, and reject any other declared dialect.
fn normalize_dialect(schema: &Value) -> Result<Value, ProcessingMessage> {
    let mut document = schema.clone();
    if let Some(object) = document.as_object_mut() {
        let declared = object.get("$schema").map(|value| match value {
            Value::String(uri) if uri == SELF_DESCRIBING_DIALECT || is_draft4(uri) => Ok(()),
            other => Err(other.to_string()),
        });
        match declared {
            None => {}
            Some(Ok(())) => {
                object.insert(
                    "$schema".to_string(),
                    Value::String(DRAFT4_DIALECT.to_string()),
                );
            }
            Some(Err(other)) => {
                return Err(ProcessingMessage::new(
                    FailureKind::SchemaCompileFailure,
                    format!("invalid schema: unsupported $schema dialect {other}"),
                )
                .with_keyword("$schema"))
            }
        }
    }
    Ok(document)
}

fn is_draft4(uri: &str) -> bool {
    let trimmed = uri.trim_end_matches('#');
    trimmed == DRAFT4_DIALECT.trim_end_matches('#')
        || trimmed == "https://json-schema.org/draft-04/schema"
}

/// Compile errors locate the problem inside the schema, so the location goes
/// into the message rather than `json_path`.
fn compile_failure(error: &ValidationError<'_>) -> ProcessingMessage {
    let location = error.instance_path.to_string();
    let text = if location.is_empty() {
        format!("invalid schema: {error}")
    } else {
        format!("invalid schema at {location}: {error}")
    };
    let message = ProcessingMessage::new(FailureKind::SchemaCompileFailure, text);
    match keyword_of(&error.schema_path.to_string()) {
        Some(keyword) => message.with_keyword(keyword),
        None => message,
    }
}

fn violation(error: &ValidationError<'_>) -> ProcessingMessage {
    let schema_path = error.schema_path.to_string();
    let mut message =
        ProcessingMessage::new(FailureKind::StructuralViolation, error.to_string())
            .with_json_path(error.instance_path.to_string());
    if let Some(keyword) = keyword_of(&schema_path) {
        message = message.with_keyword(keyword);
    }
    if let Some(targets) = targets_of(error) {
        message = message.with_targets(targets);
    }
    message
}

/// The violated keyword: the last non-index segment of the schema path.
fn keyword_of(schema_path: &str) -> Option<&str> {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.bytes().all(|b| b.is_ascii_digit()))
}

fn targets_of(error: &ValidationError<'_>) -> Option<Vec<String>> {
    match &error.kind {
        // Found type first, then every expected type.
        ValidationErrorKind::Type { kind } => {
            let mut targets = vec![json_type_name(&error.instance).to_string()];
            match kind {
                TypeKind::Single(expected) => targets.push(expected.to_string()),
                TypeKind::Multiple(expected) => {
                    targets.extend((*expected).into_iter().map(|t| t.to_string()));
                }
            }
            Some(targets)
        }
        ValidationErrorKind::Required { property } => Some(vec![property
            .as_str()
            .map_or_else(|| property.to_string(), str::to_string)]),
        ValidationErrorKind::AdditionalProperties { unexpected } => Some(unexpected.clone()),
        ValidationErrorKind::Enum { options } => Some(match options {
            Value::Array(items) => items.iter().map(Value::to_string).collect(),
            other => vec![other.to_string()],
        }),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(schema: &Value, instance: &Value) -> ValidationResult<()> {
        let engine = JsonSchemaEngine;
        let compiled = engine.compile(schema).unwrap();
        engine.validate(&compiled, instance)
    }

    #[test]
    fn test_valid_instance_passes() {
        let schema = json!({"type": "object", "properties": {"id": {"type": "string"}}});
        validate(&schema, &json!({"id": "abc"})).unwrap();
    }

    #[test]
    fn test_type_violation_mapping() {
        let schema = json!({"type": "object", "properties": {"id": {"type": "string"}}});
        let errors = validate(&schema, &json!({"id": 123})).unwrap_err();
        assert_eq!(errors.len(), 1);
        let m = errors.first();
        assert_eq!(m.kind(), FailureKind::StructuralViolation);
        assert_eq!(m.json_path(), Some("/id"));
        assert_eq!(m.keyword(), Some("type"));
        assert_eq!(
            m.targets(),
            Some(&["integer".to_string(), "string".to_string()][..])
        );
    }

    #[test]
    fn test_multiple_expected_types() {
        let schema = json!({"type": ["string", "null"]});
        let errors = validate(&schema, &json!(1.5)).unwrap_err();
        let targets = errors.first().targets().unwrap();
        assert_eq!(targets[0], "number");
        let mut expected = targets[1..].to_vec();
        expected.sort_unstable();
        assert_eq!(expected, ["null", "string"]);
        assert_eq!(errors.first().json_path(), Some(""));
    }

    #[test]
    fn test_type_targets_through_ref() {
        let schema = json!({
            "definitions": {"s": {"type": "string"}},
            "properties": {"id": {"$ref": "#/definitions/s"}}
        });
        let errors = validate(&schema, &json!({"id": 5})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().keyword(), Some("type"));
        assert_eq!(errors.first().json_path(), Some("/id"));
        assert_eq!(
            errors.first().targets(),
            Some(&["integer".to_string(), "string".to_string()][..])
        );
    }

    #[test]
    fn test_required_violation_targets_missing_property() {
        let schema = json!({"type": "object", "required": ["name"]});
        let errors = validate(&schema, &json!({})).unwrap_err();
        assert_eq!(errors.first().keyword(), Some("required"));
        assert_eq!(errors.first().targets(), Some(&["name".to_string()][..]));
    }

    #[test]
    fn test_additional_properties_targets() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {}},
            "additionalProperties": false
        });
        let errors = validate(&schema, &json!({"a": 1, "b": 2})).unwrap_err();
        assert_eq!(errors.first().keyword(), Some("additionalProperties"));
        assert_eq!(errors.first().targets(), Some(&["b".to_string()][..]));
    }

    #[test]
    fn test_enum_targets_render_options() {
        let schema = json!({"enum": ["a", 1]});
        let errors = validate(&schema, &json!("z")).unwrap_err();
        assert_eq!(errors.first().keyword(), Some("enum"));
        assert_eq!(
            errors.first().targets(),
            Some(&["\"a\"".to_string(), "1".to_string()][..])
        );
    }

    #[test]
    fn test_all_violations_reported_in_one_pass() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "count": {"type": "integer", "minimum": 0}
            },
            "required": ["name"]
        });
        let errors = validate(&schema, &json!({"id": 1, "count": -1})).unwrap_err();
        assert_eq!(errors.len(), 3);
        let mut keywords: Vec<_> = errors.iter().filter_map(|m| m.keyword()).collect();
        keywords.sort_unstable();
        assert_eq!(keywords, ["minimum", "required", "type"]);
    }

    #[test]
    fn test_array_item_paths() {
        let schema = json!({"type": "array", "items": {"type": "integer"}});
        let errors = validate(&schema, &json!([1, "two", 3])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().json_path(), Some("/1"));
        assert_eq!(errors.first().keyword(), Some("type"));
    }

    #[test]
    fn test_compile_failure_is_single_message() {
        let err = JsonSchemaEngine
            .compile(&json!({"type": "not-a-type"}))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::SchemaCompileFailure);
        assert!(err.message().starts_with("invalid schema"));
        assert_eq!(err.json_path(), None);
    }

    #[test]
    fn test_compile_failure_location_goes_to_message() {
        let err = JsonSchemaEngine
            .compile(&json!({"properties": {"id": {"type": 12}}}))
            .unwrap_err();
        assert_eq!(err.json_path(), None);
        assert!(err.message().contains("/properties/id"), "{}", err.message());
    }

    #[test]
    fn test_other_declared_dialects_are_rejected() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "properties": {"a": {"const": 1}}
        });
        let err = JsonSchemaEngine.compile(&schema).unwrap_err();
        assert_eq!(err.kind(), FailureKind::SchemaCompileFailure);
        assert_eq!(err.keyword(), Some("$schema"));
        assert!(err.message().contains("draft-07"));
    }

    #[test]
    fn test_declared_draft4_is_accepted() {
        for uri in [DRAFT4_DIALECT, "http://json-schema.org/draft-04/schema"] {
            let schema = json!({"$schema": uri, "type": "string"});
            let compiled = JsonSchemaEngine.compile(&schema).unwrap();
            assert!(JsonSchemaEngine.validate(&compiled, &json!(1)).is_err());
        }
    }

    #[test]
    fn test_compile_rejects_non_object_keyword_values() {
        assert!(JsonSchemaEngine.compile(&json!({"properties": 5})).is_err());
    }

    #[test]
    fn test_self_describing_dialect_compiles_as_draft4() {
        let schema = json!({
            "$schema": SELF_DESCRIBING_DIALECT,
            "self": {
                "vendor": "com.acme",
                "name": "event",
                "format": "jsonschema",
                "version": "1-0-0"
            },
            "type": "object",
            "properties": {"id": {"type": "string"}},
            "additionalProperties": false
        });
        let compiled = JsonSchemaEngine.compile(&schema).unwrap();
        assert_eq!(compiled.document()["$schema"], DRAFT4_DIALECT);
        assert!(JsonSchemaEngine.validate(&compiled, &json!({"id": "x"})).is_ok());
        assert!(JsonSchemaEngine.validate(&compiled, &json!({"other": 1})).is_err());
    }

    #[test]
    fn test_remote_refs_are_not_fetched() {
        let schema = json!({"$ref": "http://example.invalid/schemas/remote.json"});
        assert!(JsonSchemaEngine.compile(&schema).is_err());
    }

    #[test]
    fn test_keyword_of_skips_indices() {
        assert_eq!(keyword_of("/properties/id/type"), Some("type"));
        assert_eq!(keyword_of("/items/0/type"), Some("type"));
        assert_eq!(keyword_of("/anyOf/1"), Some("anyOf"));
        assert_eq!(keyword_of(""), None);
    }

    #[test]
    fn test_violations_keep_engine_order() {
        let schema = json!({
            "type": "object",
            "properties": {
                "z": {"type": "string"},
                "a": {"type": "integer", "minimum": 10},
                "list": {"items": {"type": "boolean"}}
            },
            "required": ["m", "b"],
            "additionalProperties": false
        });
        let instance = json!({"z": 1, "a": 2, "list": [true, 0, "x"], "extra": null});

        let raw = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .unwrap();
        let expected: Vec<(String, Option<String>)> = raw
            .iter_errors(&instance)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                (
                    e.instance_path.to_string(),
                    keyword_of(&schema_path).map(str::to_string),
                )
            })
            .collect();

        let errors = crate::Validator::new()
            .validate_against_schema(&instance, &schema)
            .unwrap_err();
        let actual: Vec<(String, Option<String>)> = errors
            .iter()
            .map(|m| {
                (
                    m.json_path().unwrap_or_default().to_string(),
                    m.keyword().map(str::to_string),
                )
            })
            .collect();

        assert!(expected.len() >= 6, "{expected:?}");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
            "required": ["c", "d"]
        });
        let instance = json!({"a": 1, "b": 2});
        let first = validate(&schema, &instance).unwrap_err();
        let second = validate(&schema, &instance).unwrap_err();
        assert_eq!(first, second);
    }
}
