use anyhow::{bail, Context, Result};
use extractor_core::document;
use extractor_core::models::parse_schema;
use extractor_core::Schema;
use std::path::Path;

/// Accepts inline JSON or `@path/to/schema.json`.
pub fn read_schema_arg(arg: &str) -> Result<Schema> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read schema file {path}"))?,
        None => arg.to_string(),
    };
    Ok(parse_schema(&raw)?)
}

/// Text of the document given by exactly one of `--pdf` / `--text`.
pub fn read_document(pdf: Option<&Path>, text: Option<&Path>) -> Result<String> {
    match (pdf, text) {
        (Some(p), None) => document::first_page_text(
            &std::fs::read(p).with_context(|| format!("read {}", p.display()))?,
        )
        .with_context(|| format!("extract text from {}", p.display())),
        (None, Some(t)) => {
            document::load_text(t).with_context(|| format!("read {}", t.display()))
        }
        _ => bail!("pass exactly one of --pdf or --text"),
    }
}
