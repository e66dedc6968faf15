//! # Schema Criteria
//!
//! A [`SchemaCriterion`] asserts that a document belongs to a schema family,
//! optionally within a version range: `iglu:com.acme/event/jsonschema/1-*-*`
//! accepts every `1-x-y` version of `com.acme/event`. Vendor, name, and
//! format must match exactly; version components match where fixed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyParseError;
use crate::key::{split_segments, SchemaKey, IGLU_URI_PREFIX};
use crate::version::PartialSchemaVer;

/// A partial matcher over [`SchemaKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaCriterion {
    vendor: String,
    name: String,
    format: String,
    version: PartialSchemaVer,
}

impl SchemaCriterion {
    /// Parse `vendor/name/format/version-pattern`, with or without the
    /// `iglu:` prefix. The version may use trailing `*` wildcards.
    pub fn parse(input: &str) -> Result<Self, KeyParseError> {
        let [vendor, name, format, version] = split_segments(input)?;
        let version =
            PartialSchemaVer::parse(version).map_err(|source| KeyParseError::InvalidVersion {
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

    /// A criterion matching `key` and nothing else.
    pub fn exact(key: &SchemaKey) -> Self {
        Self {
            vendor: key.vendor().to_string(),
            name: key.name().to_string(),
            format: key.format().to_string(),
            version: key.version().into(),
        }
    }

    /// A criterion matching every version of `key`'s schema family that
    /// shares its model.
    pub fn same_model(key: &SchemaKey) -> Self {
        Self {
            version: PartialSchemaVer::model_of(key.version()),
            ..Self::exact(key)
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

    pub fn version(&self) -> PartialSchemaVer {
        self.version
    }

    /// Whether `key` belongs to the family and version range.
    pub fn matches(&self, key: &SchemaKey) -> bool {
        self.vendor == key.vendor()
            && self.name == key.name()
            && self.format == key.format()
            && self.version.matches(&key.version())
    }
}

impl fmt::Display for SchemaCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{IGLU_URI_PREFIX}{}/{}/{}/{}",
            self.vendor, self.name, self.format, self.version
        )
    }
}

impl FromStr for SchemaCriterion {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaCriterion {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaCriterion> for String {
    fn from(criterion: SchemaCriterion) -> Self {
        criterion.to_string()
    }
}
