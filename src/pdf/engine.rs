//! PDF engine abstraction
//!
//! The renderer treats the PDF library as an opaque capability: parse bytes
//! into a document, query pages, rasterize a page and extract its positioned
//! text. Documents live on the render worker thread, so only the engine
//! itself has to be `Send`.

use super::types::{Bitmap, PageSize, TextRun, Viewport};

/// Errors from the PDF engine
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Engine(#[from] mupdf::error::Error),

    #[error("not a PDF document")]
    NotPdf,

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("document has no pages")]
    Empty,

    #[error("{detail}")]
    Generic { detail: String },
}

impl PdfError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Returns true if the bytes start with the PDF header magic.
///
/// Leading whitespace or a BOM before `%PDF-` is tolerated, like most readers do.
#[must_use]
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// Factory for documents
pub trait PdfEngine: Send {
    /// Parse a document from raw bytes
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, PdfError>;
}

/// A parsed document. Pages are 1-based.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    fn page_size(&self, page: usize) -> Result<PageSize, PdfError>;

    /// Rasterize the page into a bitmap matching `viewport`
    fn rasterize(&self, page: usize, viewport: &Viewport) -> Result<Bitmap, PdfError>;

    /// Positioned text lines in page points
    fn text_runs(&self, page: usize) -> Result<Vec<TextRun>, PdfError>;

    /// Document title from metadata, if any
    fn title(&self) -> Option<String> {
        None
    }
}

/// Validate a 1-based page number against a document
pub fn check_page(doc: &dyn PdfDocument, page: usize) -> Result<(), PdfError> {
    let page_count = doc.page_count();
    if page == 0 || page > page_count {
        return Err(PdfError::PageOutOfRange { page, page_count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pdf_magic() {
        assert!(looks_like_pdf(b"%PDF-1.7\n%..."));
        assert!(looks_like_pdf(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!looks_like_pdf(b"PK\x03\x04 zip archive"));
        assert!(!looks_like_pdf(b""));
    }
}
