//! # SchemaVer — Schema Versions
//!
//! Schema versions use the `MODEL-REVISION-ADDITION` form (`1-0-0`):
//!
//! - **model**: breaking change; starts at 1.
//! - **revision**: change that may invalidate some historical data.
//! - **addition**: change compatible with all historical data.
//!
//! A [`SchemaVer`] is always fully specified and is what a `SchemaKey`
//! carries. A [`PartialSchemaVer`] allows trailing `*` wildcards
//! (`1-*-*`, `1-0-*`, `*-*-*`) and is what a `SchemaCriterion` carries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionParseError;

/// A fully specified `MODEL-REVISION-ADDITION` version.
///
/// Orders lexicographically by (model, revision, addition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVer {
    model: u32,
    revision: u32,
    addition: u32,
}

impl SchemaVer {
    /// `1-0-0`, the first version of any schema.
    pub const FIRST: SchemaVer = SchemaVer {
        model: 1,
        revision: 0,
        addition: 0,
    };

    /// Construct a version, rejecting model 0.
    pub fn new(model: u32, revision: u32, addition: u32) -> Result<Self, VersionParseError> {
        if model == 0 {
            return Err(VersionParseError::ZeroModel(format!(
                "{model}-{revision}-{addition}"
            )));
        }
        Ok(Self {
            model,
            revision,
            addition,
        })
    }

    /// Parse `MODEL-REVISION-ADDITION`. Components are decimal without
    /// leading zeros; the model must be at least 1.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let [model, revision, addition] = split_components(input)?;
        let model = parse_component(model, input)?;
        let revision = parse_component(revision, input)?;
        let addition = parse_component(addition, input)?;
        if model == 0 {
            return Err(VersionParseError::ZeroModel(input.to_string()));
        }
        Ok(Self {
            model,
            revision,
            addition,
        })
    }

    pub fn model(&self) -> u32 {
        self.model
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn addition(&self) -> u32 {
        self.addition
    }
}

impl fmt::Display for SchemaVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.model, self.revision, self.addition)
    }
}

impl FromStr for SchemaVer {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaVer {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaVer> for String {
    fn from(version: SchemaVer) -> Self {
        version.to_string()
    }
}

/// A version pattern with optional trailing wildcards.
///
/// `None` components are `*` and match any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartialSchemaVer {
    model: Option<u32>,
    revision: Option<u32>,
    addition: Option<u32>,
}

impl PartialSchemaVer {
    /// The `*-*-*` pattern, matching every version.
    pub const ANY: Self = Self {
        model: None,
        revision: None,
        addition: None,
    };

    /// `MODEL-*-*` for the model of `version`.
    pub fn model_of(version: SchemaVer) -> Self {
        Self {
            model: Some(version.model),
            revision: None,
            addition: None,
        }
    }

    /// Parse a version pattern such as `1-*-*` or `2-1-0`.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let components = split_components(input)?;
        let mut parsed = [None; 3];
        let mut seen_wildcard = false;
        for (slot, component) in parsed.iter_mut().zip(components) {
            if component == "*" {
                seen_wildcard = true;
                continue;
            }
            if seen_wildcard {
                return Err(VersionParseError::NonTrailingWildcard(input.to_string()));
            }
            *slot = Some(parse_component(component, input)?);
        }
        if parsed[0] == Some(0) {
            return Err(VersionParseError::ZeroModel(input.to_string()));
        }
        let [model, revision, addition] = parsed;
        Ok(Self {
            model,
            revision,
            addition,
        })
    }

    /// Whether `version` agrees with every fixed component.
    pub fn matches(&self, version: &SchemaVer) -> bool {
        self.model.map_or(true, |m| m == version.model)
            && self.revision.map_or(true, |r| r == version.revision)
            && self.addition.map_or(true, |a| a == version.addition)
    }

    /// The full version, if no component is a wildcard.
    pub fn as_full(&self) -> Option<SchemaVer> {
        Some(SchemaVer {
            model: self.model?,
            revision: self.revision?,
            addition: self.addition?,
        })
    }

    pub fn model(&self) -> Option<u32> {
        self.model
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    pub fn addition(&self) -> Option<u32> {
        self.addition
    }
}

impl From<SchemaVer> for PartialSchemaVer {
    fn from(version: SchemaVer) -> Self {
        Self {
            model: Some(version.model),
            revision: Some(version.revision),
            addition: Some(version.addition),
        }
    }
}

impl fmt::Display for PartialSchemaVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn component(value: Option<u32>) -> String {
            value.map_or_else(|| "*".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "{}-{}-{}",
            component(self.model),
            component(self.revision),
            component(self.addition)
        )
    }
}

impl FromStr for PartialSchemaVer {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PartialSchemaVer {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PartialSchemaVer> for String {
    fn from(version: PartialSchemaVer) -> Self {
        version.to_string()
    }
}

fn split_components(input: &str) -> Result<[&str; 3], VersionParseError> {
    let mut parts = input.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(r), Some(a), None) => Ok([m, r, a]),
        _ => Err(VersionParseError::Malformed(input.to_string())),
    }
}

fn parse_component(component: &str, input: &str) -> Result<u32, VersionParseError> {
    let well_formed = !component.is_empty()
        && component.bytes().all(|b| b.is_ascii_digit())
        && !(component.len() > 1 && component.starts_with('0'));
    if !well_formed {
        return Err(VersionParseError::Malformed(input.to_string()));
    }
    component
        .parse()
        .map_err(|_| VersionParseError::Overflow(input.to_string()))
}
