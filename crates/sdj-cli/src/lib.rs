//! # sdj-cli — Command Line for Self-Describing JSON
//!
//! Provides the `sdj` command-line interface over `sdj-core` and
//! `sdj-schema`.
//!
//! ## Subcommands
//!
//! - `sdj validate` — validate self-describing documents against a static
//!   schema repository.
//! - `sdj parse-key` — parse and print a schema key.
//!
//! ```bash
//! sdj validate events.json --repo ./iglu
//! sdj validate events.jsonl --lines --criterion 'iglu:com.acme/event/jsonschema/1-*-*'
//! sdj parse-key iglu:com.acme/event/jsonschema/1-0-0 --format json
//! ```
//!
//! ## Exit codes
//!
//! `0` success, `1` validation or parse failure, `2` operational error
//! (unreadable input, missing repository).

pub mod parse_key;
pub mod validate;

use clap::ValueEnum;

/// Output rendering shared by all subcommands.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}
