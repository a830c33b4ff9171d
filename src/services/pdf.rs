//! Plain-text extraction from uploaded PDFs.

use lopdf::Document;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("could not parse PDF: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("PDF has no pages")]
    NoPages,

    #[error("PDF extraction task failed: {0}")]
    Task(String),
}

/// Text content of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub text: String,
    pub num_pages: usize,
}

/// Extracts the text of every page. CPU bound, call from a blocking context.
pub fn extract_text(bytes: &[u8]) -> Result<PdfText, PdfError> {
    let document = Document::load_mem(bytes)?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(PdfError::NoPages);
    }

    let text = document.extract_text(&page_numbers)?;
    debug!(pages = page_numbers.len(), chars = text.chars().count(), "Extracted PDF text");

    Ok(PdfText {
        text,
        num_pages: page_numbers.len(),
    })
}

/// Runs [`extract_text`] on the blocking pool.
pub async fn extract_text_blocking(bytes: Vec<u8>) -> Result<PdfText, PdfError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes))
        .await
        .map_err(|e| PdfError::Task(e.to_string()))?
}
