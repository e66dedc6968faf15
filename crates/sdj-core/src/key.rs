//! # Schema Keys
//!
//! A [`SchemaKey`] names exactly one schema: `vendor/name/format/version`,
//! written on the wire with an `iglu:` prefix
//! (`iglu:com.acme/event/jsonschema/1-0-0`).
//!
//! ## Grammar
//!
//! - vendor: `[a-zA-Z0-9-_.]+` (reverse-DNS, dots allowed, not dots only)
//! - name, format: `[a-zA-Z0-9-_]+`
//! - version: a full [`SchemaVer`] (`1-0-0`)
//!
//! Keys are immutable; the parser is the only way to build one from text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyParseError;
use crate::version::SchemaVer;

/// URI scheme prefix of schema keys embedded in envelopes.
pub const IGLU_URI_PREFIX: &str = "iglu:";

/// Vendor of the well-known self-describing instance meta-schema.
pub const SELF_DESCRIBING_VENDOR: &str = "com.snowplowanalytics.self-desc";

/// A structured, versioned schema reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaKey {
    vendor: String,
    name: String,
    format: String,
    version: SchemaVer,
}

impl SchemaKey {
    /// Build a key from components, applying the segment grammar.
    pub fn new(
        vendor: &str,
        name: &str,
        format: &str,
        version: SchemaVer,
    ) -> Result<Self, KeyParseError> {
        let input = format!("{vendor}/{name}/{format}/{version}");
        check_segment(&input, "vendor", vendor, is_vendor_char)?;
        check_segment(&input, "name", name, is_name_char)?;
        check_segment(&input, "format", format, is_name_char)?;
        Ok(Self {
            vendor: vendor.to_string(),
            name: name.to_string(),
            format: format.to_string(),
            version,
        })
    }

    /// Parse `vendor/name/format/version` or `iglu:vendor/name/format/version`.
    pub fn parse(input: &str) -> Result<Self, KeyParseError> {
        let [vendor, name, format, version] = split_segments(input)?;
        let version =
            SchemaVer::parse(version).map_err(|source| KeyParseError::InvalidVersion {
                input: input.to_string(),
                source,
            })?;
        Ok(Self {
            vendor: vendor.to_string(),
            name: name.to_string(),
            format: format.to_string(),
            version,
        })
    }

    /// Key of the meta-schema every self-describing envelope must satisfy:
    /// `iglu:com.snowplowanalytics.self-desc/instance/jsonschema/1-0-0`.
    pub fn self_describing_instance() -> Self {
        Self {
            vendor: SELF_DESCRIBING_VENDOR.to_string(),
            name: "instance".to_string(),
            format: "jsonschema".to_string(),
            version: SchemaVer::FIRST,
        }
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn version(&self) -> SchemaVer {
        self.version
    }

    /// The bare `vendor/name/format/version` form.
    pub fn to_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.vendor, self.name, self.format, self.version
        )
    }
}

/// Renders the `iglu:` URI form.
impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{IGLU_URI_PREFIX}{}", self.to_path())
    }
}

impl FromStr for SchemaKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaKey> for String {
    fn from(key: SchemaKey) -> Self {
        key.to_string()
    }
}

/// Split a key or criterion into its four segments, validating the
/// vendor/name/format grammar. The version segment is returned raw.
pub(crate) fn split_segments(input: &str) -> Result<[&str; 4], KeyParseError> {
    let body = input.strip_prefix(IGLU_URI_PREFIX).unwrap_or(input);
    let segments: Vec<&str> = body.split('/').collect();
    let [vendor, name, format, version] = segments[..] else {
        return Err(KeyParseError::SegmentCount {
            input: input.to_string(),
            found: segments.len(),
        });
    };
    check_segment(input, "vendor", vendor, is_vendor_char)?;
    check_segment(input, "name", name, is_name_char)?;
    check_segment(input, "format", format, is_name_char)?;
    if version.is_empty() {
        return Err(KeyParseError::EmptySegment {
            input: input.to_string(),
            segment: "version",
        });
    }
    Ok([vendor, name, format, version])
}

fn check_segment(
    input: &str,
    segment: &'static str,
    value: &str,
    allowed: fn(char) -> bool,
) -> Result<(), KeyParseError> {
    if value.is_empty() {
        return Err(KeyParseError::EmptySegment {
            input: input.to_string(),
            segment,
        });
    }
    // `.` and `..` would name a directory, not a vendor.
    if !value.chars().all(allowed) || value.chars().all(|c| c == '.') {
        return Err(KeyParseError::InvalidSegment {
            input: input.to_string(),
            segment,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn is_vendor_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}
