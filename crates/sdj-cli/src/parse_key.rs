//! # Parse-Key Subcommand
//!
//! Parses a schema key (or, with `--criterion`, a schema criterion) and
//! prints its components.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sdj_core::{ProcessingMessage, SchemaCriterion, SchemaKey};

use crate::OutputFormat;

/// Arguments for the `sdj parse-key` subcommand.
#[derive(Args, Debug)]
pub struct ParseKeyArgs {
    /// Key in `iglu:vendor/name/format/version` or bare form.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Parse as a criterion, allowing `*` in trailing version components.
    #[arg(long)]
    pub criterion: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Components {
    vendor: String,
    name: String,
    format: String,
    version: String,
    uri: String,
}

impl From<&SchemaKey> for Components {
    fn from(key: &SchemaKey) -> Self {
        Self {
            vendor: key.vendor().to_string(),
            name: key.name().to_string(),
            format: key.format().to_string(),
            version: key.version().to_string(),
            uri: key.to_string(),
        }
    }
}

impl From<&SchemaCriterion> for Components {
    fn from(criterion: &SchemaCriterion) -> Self {
        Self {
            vendor: criterion.vendor().to_string(),
            name: criterion.name().to_string(),
            format: criterion.format().to_string(),
            version: criterion.version().to_string(),
            uri: criterion.to_string(),
        }
    }
}

/// Execute the parse-key subcommand, writing to stdout.
///
/// Returns exit code 0 when the key parses, 1 when it does not.
pub fn run_parse_key(args: &ParseKeyArgs) -> Result<u8> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    parse_key_to(args, &mut out)
}

/// Execute the parse-key subcommand, writing to `out`.
pub fn parse_key_to<W: Write>(args: &ParseKeyArgs, out: &mut W) -> Result<u8> {
    let parsed = if args.criterion {
        SchemaCriterion::parse(&args.key).map(|c| Components::from(&c))
    } else {
        SchemaKey::parse(&args.key).map(|k| Components::from(&k))
    };

    match (parsed, args.format) {
        (Ok(components), OutputFormat::Text) => {
            writeln!(out, "vendor:  {}", components.vendor)?;
            writeln!(out, "name:    {}", components.name)?;
            writeln!(out, "format:  {}", components.format)?;
            writeln!(out, "version: {}", components.version)?;
            Ok(0)
        }
        (Ok(components), OutputFormat::Json) => {
            serde_json::to_writer(&mut *out, &components).context("failed to serialize key")?;
            writeln!(out)?;
            Ok(0)
        }
        (Err(e), OutputFormat::Text) => {
            writeln!(out, "invalid schema key: {e}")?;
            Ok(1)
        }
        (Err(e), OutputFormat::Json) => {
            let message = ProcessingMessage::from(e);
            serde_json::to_writer(&mut *out, &message).context("failed to serialize error")?;
            writeln!(out)?;
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn run(key: &str, criterion: bool, format: OutputFormat) -> (u8, String) {
        let args = ParseKeyArgs {
            key: key.to_string(),
            criterion,
            format,
        };
        let mut out = Vec::new();
        let code = parse_key_to(&args, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn prints_components() {
        let (code, output) = run("iglu:com.acme/event/jsonschema/1-2-3", false, OutputFormat::Text);
        assert_eq!(code, 0);
        assert!(output.contains("vendor:  com.acme"));
        assert!(output.contains("version: 1-2-3"));
    }

    #[test]
    fn json_output_includes_uri() {
        let (code, output) = run("com.acme/event/jsonschema/1-0-0", false, OutputFormat::Json);
        assert_eq!(code, 0);
        let value: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["uri"], "iglu:com.acme/event/jsonschema/1-0-0");
        assert_eq!(value["name"], "event");
    }

    #[test]
    fn wildcards_need_criterion_flag() {
        let (code, _) = run("iglu:com.acme/event/jsonschema/1-*-*", false, OutputFormat::Text);
        assert_eq!(code, 1);
        let (code, output) = run("iglu:com.acme/event/jsonschema/1-*-*", true, OutputFormat::Text);
        assert_eq!(code, 0);
        assert!(output.contains("version: 1-*-*"));
    }

    #[test]
    fn invalid_key_json_is_processing_message() {
        let (code, output) = run("iglu:com.acme/event", false, OutputFormat::Json);
        assert_eq!(code, 1);
        let value: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["kind"], "KeyParseError");
        assert_eq!(value["targets"][0], "iglu:com.acme/event");
    }
}
