//! Text extraction: [`RawDocument`] bytes → [`ExtractedText`].
//!
//! PDFs are parsed with `pdf-extract` on the blocking thread pool, since
//! parsing is CPU-bound and the parser can panic on hostile input; a panic
//! surfaces as a `JoinError` and is reported as a parse failure instead of
//! taking the worker down. Text is decoded as strict UTF-8 and passed through
//! unchanged.

use crate::error::ReviewError;
use crate::pipeline::input::{ContentKind, RawDocument};
use std::fmt;
use tracing::{debug, info};

/// Paper text guaranteed to contain at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Wrap `text`, rejecting whitespace-only content with
    /// [`ReviewError::EmptyContent`].
    pub fn new(text: impl Into<String>, origin: &str) -> Result<Self, ReviewError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ReviewError::EmptyContent {
                origin: origin.to_string(),
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of Unicode scalar values.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the paper text from raw bytes according to the content hint.
pub async fn extract(doc: &RawDocument) -> Result<ExtractedText, ReviewError> {
    let text = match doc.kind {
        ContentKind::Text => decode_text(&doc.bytes, &doc.origin)?,
        ContentKind::Pdf => extract_pdf(doc.bytes.clone(), &doc.origin).await?,
    };

    let text = ExtractedText::new(text, &doc.origin)?;
    info!(
        "Extracted {} chars from {} ({})",
        text.char_count(),
        doc.origin,
        doc.kind
    );
    Ok(text)
}

fn decode_text(bytes: &[u8], origin: &str) -> Result<String, ReviewError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ReviewError::Decode {
        origin: origin.to_string(),
        detail: e.utf8_error().to_string(),
    })
}

async fn extract_pdf(bytes: Vec<u8>, origin: &str) -> Result<String, ReviewError> {
    let parse_err = |detail: String| ReviewError::Parse {
        origin: origin.to_string(),
        detail,
    };

    let pages = tokio::task::spawn_blocking(move || pdf_pages_blocking(&bytes))
        .await
        .map_err(|e| parse_err(format!("PDF parser aborted: {e}")))?
        .map_err(parse_err)?;

    debug!("PDF {} has {} pages", origin, pages.len());
    Ok(join_pages(&pages))
}

/// Blocking implementation of per-page text extraction.
fn pdf_pages_blocking(bytes: &[u8]) -> Result<Vec<String>, String> {
    if !bytes.starts_with(b"%PDF") {
        let head: Vec<u8> = bytes.iter().take(8).copied().collect();
        return Err(format!(
            "missing %PDF header (first bytes: {:?})",
            String::from_utf8_lossy(&head)
        ));
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| e.to_string())?;
    if pages.is_empty() {
        return Err("document has no pages".to_string());
    }
    Ok(pages)
}

/// Concatenate page texts in page order, one `\n` between pages.
fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}
