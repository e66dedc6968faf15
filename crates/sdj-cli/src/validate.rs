//! # Validate Subcommand
//!
//! Validates self-describing documents against schemas served from a static
//! repository directory (`<repo>/schemas/<vendor>/<name>/<format>/<version>`).
//!
//! Each input file holds one document (JSON, or YAML when the extension is
//! `.yaml`/`.yml`). With `--lines`, each non-blank line of a file is a
//! separate JSON document.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use sdj_core::{ProcessingMessage, SchemaCriterion};
use sdj_schema::{DirectoryResolver, Validator};

use crate::OutputFormat;

/// Arguments for the `sdj validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Files holding self-describing documents.
    #[arg(value_name = "FILE", required = true)]
    pub paths: Vec<PathBuf>,

    /// Root of the static schema repository.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo: PathBuf,

    /// Report the `data` payload instead of the whole envelope.
    #[arg(long)]
    pub data_only: bool,

    /// Require every document's schema to match this criterion,
    /// e.g. `iglu:com.acme/event/jsonschema/1-*-*`.
    #[arg(long, value_name = "CRITERION", value_parser = SchemaCriterion::parse)]
    pub criterion: Option<SchemaCriterion>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Treat each input line as a separate JSON document.
    #[arg(long)]
    pub lines: bool,
}

/// Outcome of validating one document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ProcessingMessage>,
}

impl DocumentReport {
    fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{line}", self.source),
            None => self.source.clone(),
        }
    }
}

/// Execute the validate subcommand, writing the report to stdout.
///
/// Returns exit code: 0 when every document is valid, 1 when any is not.
/// Operational failures (unreadable or unparseable input, missing
/// repository) are returned as errors.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    validate_to(args, &mut out)
}

/// Execute the validate subcommand, writing the report to `out`.
pub fn validate_to<W: Write>(args: &ValidateArgs, out: &mut W) -> Result<u8> {
    if !args.repo.is_dir() {
        bail!("schema repository not found at {}", args.repo.display());
    }
    let resolver = DirectoryResolver::new(&args.repo);
    let validator = Validator::new();

    tracing::info!(
        repo = %args.repo.display(),
        files = args.paths.len(),
        criterion = ?args.criterion.as_ref().map(ToString::to_string),
        "validating documents"
    );

    let mut total = 0usize;
    let mut failed = 0usize;
    for path in &args.paths {
        for (line, document) in load_documents(path, args.lines)? {
            let report = validate_document(&validator, &resolver, args, path, line, &document);
            total += 1;
            if !report.valid {
                failed += 1;
            }
            write_report(out, args.format, &report)?;
        }
    }

    if args.format == OutputFormat::Text {
        writeln!(out, "{}/{} document(s) valid", total - failed, total)?;
    }
    tracing::debug!(total, failed, "validation finished");

    Ok(if failed > 0 { 1 } else { 0 })
}

fn validate_document(
    validator: &Validator,
    resolver: &DirectoryResolver,
    args: &ValidateArgs,
    path: &Path,
    line: Option<usize>,
    document: &Value,
) -> DocumentReport {
    let result = match &args.criterion {
        Some(criterion) => {
            validator.verify_schema_and_validate(resolver, document, criterion, args.data_only)
        }
        None => validator.validate_and_identify_schema(resolver, document, args.data_only),
    };
    let source = path.display().to_string();
    match result {
        Ok((key, validated)) => DocumentReport {
            source,
            line,
            valid: true,
            schema: Some(key.to_string()),
            document: Some(validated),
            errors: Vec::new(),
        },
        Err(errors) => DocumentReport {
            source,
            line,
            valid: false,
            schema: document
                .get("schema")
                .and_then(Value::as_str)
                .map(str::to_string),
            document: None,
            errors: errors.into_vec(),
        },
    }
}

/// Load the documents in `path`, paired with their 1-based line number in
/// line mode.
fn load_documents(path: &Path, lines: bool) -> Result<Vec<(Option<usize>, Value)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if lines {
        return content
            .lines()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| -> Result<(Option<usize>, Value)> {
                let value = serde_json::from_str(text).with_context(|| {
                    format!("failed to parse JSON at {}:{}", path.display(), i + 1)
                })?;
                Ok((Some(i + 1), value))
            })
            .collect();
    }

    let value: Value = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?
    };
    Ok(vec![(None, value)])
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn write_report<W: Write>(out: &mut W, format: OutputFormat, report: &DocumentReport) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report).context("failed to serialize report")?;
            writeln!(out)?;
        }
        OutputFormat::Text if report.valid => {
            let schema = report.schema.as_deref().unwrap_or_default();
            writeln!(out, "OK    {}  {schema}", report.location())?;
        }
        OutputFormat::Text => {
            writeln!(out, "FAIL  {}", report.location())?;
            for error in &report.errors {
                writeln!(out, "  - {error}")?;
            }
        }
    }
    Ok(())
}
