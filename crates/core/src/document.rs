//! Document text loading. Only the first page of a PDF is read.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse PDF: {0}")]
    Pdf(String),
    #[error("PDF is empty or corrupted")]
    NoPages,
    #[error("PDF support not compiled in (enable the `pdf` feature)")]
    PdfUnsupported,
}

/// Reads `path` as PDF when it has a `.pdf` extension, otherwise as plain text.
pub fn load_text(path: &Path) -> Result<String, DocumentError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    let bytes = std::fs::read(path)?;
    if is_pdf {
        first_page_text(&bytes)
    } else {
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(feature = "pdf")]
pub fn first_page_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))?;
    let first = doc
        .get_pages()
        .keys()
        .next()
        .copied()
        .ok_or(DocumentError::NoPages)?;
    doc.extract_text(&[first])
        .map_err(|e| DocumentError::Pdf(e.to_string()))
}

#[cfg(not(feature = "pdf"))]
pub fn first_page_text(_bytes: &[u8]) -> Result<String, DocumentError> {
    Err(DocumentError::PdfUnsupported)
}
