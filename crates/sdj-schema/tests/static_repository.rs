//! Integration test: validation against a static schema repository on disk.

use std::path::Path;

use sdj_core::{FailureKind, SchemaKey};
use sdj_schema::{DirectoryResolver, Validator};
use serde_json::json;

fn write_schema(root: &Path, key: &str, schema: &serde_json::Value) {
    let resolver = DirectoryResolver::new(root);
    let path = resolver.schema_path(&SchemaKey::parse(key).unwrap());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(schema).unwrap()).unwrap();
}

#[test]
fn test_validates_against_repository_schemas() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "iglu:com.acme/page_view/jsonschema/1-0-1",
        &json!({
            "type": "object",
            "properties": {"url": {"type": "string"}},
            "required": ["url"],
            "additionalProperties": false
        }),
    );
    let resolver = DirectoryResolver::new(dir.path());
    let validator = Validator::new();

    let good = json!({
        "schema": "iglu:com.acme/page_view/jsonschema/1-0-1",
        "data": {"url": "https://acme.test/"}
    });
    let (key, data) = validator
        .validate_and_identify_schema(&resolver, &good, true)
        .unwrap();
    assert_eq!(key.version().to_string(), "1-0-1");
    assert_eq!(data, json!({"url": "https://acme.test/"}));

    let bad = json!({
        "schema": "iglu:com.acme/page_view/jsonschema/1-0-1",
        "data": {"href": "https://acme.test/"}
    });
    let errors = validator
        .validate_and_identify_schema(&resolver, &bad, true)
        .unwrap_err();
    let mut keywords: Vec<_> = errors.iter().filter_map(|m| m.keyword()).collect();
    keywords.sort_unstable();
    assert_eq!(keywords, ["additionalProperties", "required"]);
}

#[test]
fn test_missing_repository_schema_is_resolution_failure() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = DirectoryResolver::new(dir.path());
    let instance = json!({"schema": "iglu:com.acme/absent/jsonschema/1-0-0", "data": {}});
    let errors = Validator::new()
        .validate_and_identify_schema(&resolver, &instance, false)
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().kind(), FailureKind::ResolutionFailure);
    assert_eq!(
        errors.first().targets(),
        Some(&["iglu:com.acme/absent/jsonschema/1-0-0".to_string()][..])
    );
}

#[test]
fn test_repository_meta_schema_overrides_embedded_copy() {
    let dir = tempfile::tempdir().unwrap();
    // A permissive meta-schema in the repository wins over the embedded one.
    write_schema(
        dir.path(),
        "iglu:com.snowplowanalytics.self-desc/instance/jsonschema/1-0-0",
        &json!({"type": "object"}),
    );
    let resolver = DirectoryResolver::new(dir.path());
    let instance = json!({"schema": "anything", "data": 1, "extra": true});
    assert!(Validator::new()
        .validate_as_self_describing(&resolver, &instance)
        .is_ok());
}

#[test]
fn test_dot_vendor_cannot_escape_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(repo.join("schemas")).unwrap();
    // Outside `<repo>/schemas`, reachable only via a `..` vendor.
    let outside = repo.join("x/jsonschema");
    std::fs::create_dir_all(&outside).unwrap();
    std::fs::write(outside.join("1-0-0"), r#"{"type": "object"}"#).unwrap();

    let resolver = DirectoryResolver::new(&repo);
    let instance = json!({"schema": "iglu:../x/jsonschema/1-0-0", "data": {}});
    let errors = Validator::new()
        .validate_and_identify_schema(&resolver, &instance, false)
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().kind(), FailureKind::KeyParseError);
}
