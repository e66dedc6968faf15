//! # Envelope Splitting
//!
//! Splits a self-describing JSON document `{"schema": ..., "data": ...}`
//! into its schema-reference string and payload. The split is a pure
//! structural check; it does not parse the key or resolve anything.

use serde_json::Value;

use crate::error::{FailureKind, KeyParseError, ProcessingMessage};
use crate::key::SchemaKey;

/// Name of the envelope field holding the schema key.
pub const SCHEMA_FIELD: &str = "schema";

/// Name of the envelope field holding the payload.
pub const DATA_FIELD: &str = "data";

/// Maximum number of characters of the offending document quoted in a
/// malformed-envelope message.
pub const MAX_RENDERED_CHARS: usize = 255;

/// A borrowed view of a self-describing document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope<'a> {
    schema: &'a str,
    data: &'a Value,
}

impl<'a> Envelope<'a> {
    /// The raw schema key string, as written in the document.
    pub fn schema(&self) -> &'a str {
        self.schema
    }

    /// The payload sub-document.
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Parse the schema string into a [`SchemaKey`].
    pub fn schema_key(&self) -> Result<SchemaKey, KeyParseError> {
        SchemaKey::parse(self.schema)
    }
}

/// Split `json` into schema string and payload.
///
/// # Errors
///
/// Returns one [`FailureKind::MalformedEnvelope`] message when `json` is not
/// an object, `schema` is absent or not a string, or `data` is absent.
pub fn split(json: &Value) -> Result<Envelope<'_>, ProcessingMessage> {
    let Some(object) = json.as_object() else {
        return Err(malformed(json, "document is not a JSON object", None));
    };
    let schema = match object.get(SCHEMA_FIELD) {
        Some(Value::String(schema)) => schema.as_str(),
        Some(_) => {
            return Err(malformed(
                json,
                "'schema' field is not a string",
                Some(SCHEMA_FIELD),
            ))
        }
        None => return Err(malformed(json, "'schema' field is absent", Some(SCHEMA_FIELD))),
    };
    let Some(data) = object.get(DATA_FIELD) else {
        return Err(malformed(json, "'data' field is absent", Some(DATA_FIELD)));
    };
    Ok(Envelope { schema, data })
}

fn malformed(json: &Value, reason: &str, field: Option<&str>) -> ProcessingMessage {
    let message = ProcessingMessage::new(
        FailureKind::MalformedEnvelope,
        format!(
            "not a self-describing JSON document, {reason}: {}",
            render_truncated(json)
        ),
    );
    match field {
        Some(field) => message
            .with_json_path(format!("/{field}"))
            .with_targets([field]),
        None => message,
    }
}

fn render_truncated(json: &Value) -> String {
    let rendered = json.to_string();
    match rendered.char_indices().nth(MAX_RENDERED_CHARS) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}
