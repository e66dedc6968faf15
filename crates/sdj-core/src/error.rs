//! # Error Types — Processing Messages and Parse Errors
//!
//! Every failure a validation pipeline can report is a [`ProcessingMessage`]:
//! a human-readable message plus optional machine-readable context (the
//! JSON Pointer into the instance, the violated schema keyword, and
//! keyword-specific targets). Messages are grouped into [`ValidationErrors`],
//! which cannot be empty.
//!
//! ## Design
//!
//! - Parse errors (`KeyParseError`, `VersionParseError`) use `thiserror` and
//!   convert into a single `ProcessingMessage` at the pipeline boundary.
//! - Only structural violations produce more than one message per result.
//! - Messages are immutable once built: the `with_*` builders consume `self`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a validation step: the validated value, or at least one error.
pub type ValidationResult<T> = Result<T, ValidationErrors>;

// ---------------------------------------------------------------------------
// Failure taxonomy
// ---------------------------------------------------------------------------

/// The stage of the validation pipeline a message originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Envelope missing `schema`/`data`, or `schema` not a string.
    MalformedEnvelope,
    /// Schema key string violates the four-segment/version grammar.
    KeyParseError,
    /// Declared key does not satisfy the caller's criterion.
    SchemaCriterionMismatch,
    /// The resolver could not produce a schema document.
    ResolutionFailure,
    /// The schema document is itself not a valid schema.
    SchemaCompileFailure,
    /// The instance fails a schema constraint.
    StructuralViolation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedEnvelope => "malformed envelope",
            Self::KeyParseError => "key parse error",
            Self::SchemaCriterionMismatch => "schema criterion mismatch",
            Self::ResolutionFailure => "resolution failure",
            Self::SchemaCompileFailure => "schema compile failure",
            Self::StructuralViolation => "structural violation",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ProcessingMessage
// ---------------------------------------------------------------------------

/// A single validation failure with structured context.
///
/// `json_path` is a JSON Pointer into the validated instance (empty for the
/// root). `keyword` names the violated schema construct (`"type"`,
/// `"required"`, ...). `targets` carries keyword-specific arguments, e.g.
/// `["integer", "string"]` for a `type` violation (found, then expected).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMessage {
    kind: FailureKind,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    targets: Option<Vec<String>>,
}

impl ProcessingMessage {
    /// Create a message with no path, keyword, or targets.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            json_path: None,
            keyword: None,
            targets: None,
        }
    }

    /// Attach the JSON Pointer of the offending location.
    pub fn with_json_path(mut self, json_path: impl Into<String>) -> Self {
        self.json_path = Some(json_path.into());
        self
    }

    /// Attach the violated schema keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Attach keyword-specific targets, preserving their order.
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn json_path(&self) -> Option<&str> {
        self.json_path.as_deref()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn targets(&self) -> Option<&[String]> {
        self.targets.as_deref()
    }
}

impl fmt::Display for ProcessingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.json_path.as_deref() {
            None => write!(f, "{}: {}", self.kind, self.message),
            Some("") => write!(f, "{}: (root): {}", self.kind, self.message),
            Some(path) => write!(f, "{}: {}: {}", self.kind, path, self.message),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationErrors
// ---------------------------------------------------------------------------

/// One or more processing messages, in the order they were reported.
///
/// The head + tail representation makes "failure implies at least one
/// diagnostic" structural: there is no way to build an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ProcessingMessage>", into = "Vec<ProcessingMessage>")]
pub struct ValidationErrors {
    head: ProcessingMessage,
    tail: Vec<ProcessingMessage>,
}

impl ValidationErrors {
    /// A collection holding exactly one message.
    pub fn one(message: ProcessingMessage) -> Self {
        Self {
            head: message,
            tail: Vec::new(),
        }
    }

    /// Build from a list, returning `None` when the list is empty.
    pub fn from_vec(messages: Vec<ProcessingMessage>) -> Option<Self> {
        let mut iter = messages.into_iter();
        let head = iter.next()?;
        Some(Self {
            head,
            tail: iter.collect(),
        })
    }

    /// Append a message after all existing ones.
    pub fn push(&mut self, message: ProcessingMessage) {
        self.tail.push(message);
    }

    /// The first reported message.
    pub fn first(&self) -> &ProcessingMessage {
        &self.head
    }

    /// Number of messages (always at least one).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessingMessage> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    /// Consume into an ordered `Vec`.
    pub fn into_vec(self) -> Vec<ProcessingMessage> {
        let mut messages = Vec::with_capacity(self.len());
        messages.push(self.head);
        messages.extend(self.tail);
        messages
    }
}

impl From<ProcessingMessage> for ValidationErrors {
    fn from(message: ProcessingMessage) -> Self {
        Self::one(message)
    }
}

impl From<KeyParseError> for ValidationErrors {
    fn from(err: KeyParseError) -> Self {
        Self::one(err.into())
    }
}

impl From<ValidationErrors> for Vec<ProcessingMessage> {
    fn from(errors: ValidationErrors) -> Self {
        errors.into_vec()
    }
}

impl TryFrom<Vec<ProcessingMessage>> for ValidationErrors {
    type Error = &'static str;

    fn try_from(messages: Vec<ProcessingMessage>) -> Result<Self, Self::Error> {
        Self::from_vec(messages).ok_or("validation errors must contain at least one message")
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ProcessingMessage;
    type IntoIter = std::vec::IntoIter<ProcessingMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Error parsing a `MODEL-REVISION-ADDITION` version.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// Not three dash-separated numeric components.
    #[error("'{0}' is not a MODEL-REVISION-ADDITION version")]
    Malformed(String),

    /// Models start at 1.
    #[error("version '{0}' has model 0; models start at 1")]
    ZeroModel(String),

    /// A component does not fit in 32 bits.
    #[error("version '{0}' has a component out of range")]
    Overflow(String),

    /// A fixed component follows a `*` wildcard (e.g. `*-0-*`).
    #[error("version '{0}' has a fixed component after a wildcard")]
    NonTrailingWildcard(String),
}

/// Error parsing a schema key or schema criterion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    /// Not exactly four `/`-separated segments.
    #[error("schema key '{input}' has {found} segment(s); expected vendor/name/format/version")]
    SegmentCount {
        /// The rejected input.
        input: String,
        /// Number of segments found.
        found: usize,
    },

    /// One of the segments is empty.
    #[error("schema key '{input}' has an empty {segment} segment")]
    EmptySegment {
        /// The rejected input.
        input: String,
        /// Which segment was empty.
        segment: &'static str,
    },

    /// A segment contains characters outside its grammar.
    #[error("schema key '{input}' has an invalid {segment} segment '{value}'")]
    InvalidSegment {
        /// The rejected input.
        input: String,
        /// Which segment was invalid.
        segment: &'static str,
        /// The offending segment.
        value: String,
    },

    /// The version segment does not parse.
    #[error("schema key '{input}' has an invalid version: {source}")]
    InvalidVersion {
        /// The rejected input.
        input: String,
        /// Why the version was rejected.
        #[source]
        source: VersionParseError,
    },
}

impl KeyParseError {
    /// The input string that failed to parse.
    pub fn input(&self) -> &str {
        match self {
            Self::SegmentCount { input, .. }
            | Self::EmptySegment { input, .. }
            | Self::InvalidSegment { input, .. }
            | Self::InvalidVersion { input, .. } => input,
        }
    }
}

impl From<KeyParseError> for ProcessingMessage {
    fn from(err: KeyParseError) -> Self {
        let input = err.input().to_string();
        ProcessingMessage::new(FailureKind::KeyParseError, err.to_string()).with_targets([input])
    }
}
