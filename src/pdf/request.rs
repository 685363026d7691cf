//! Render request and response types

use std::sync::Arc;

use super::engine::PdfError;
use super::renderer::RenderedPage;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Which page to render and how
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTarget {
    /// Page number (1-based)
    pub page: usize,
    pub scale: f32,
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Parse a new document; it replaces the current one only on success
    Load { generation: u64, bytes: Vec<u8> },

    /// Render a page of the current document
    Page {
        id: RequestId,
        generation: u64,
        target: RenderTarget,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Document metadata reported after a successful parse
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    Loaded {
        generation: u64,
        info: DocumentInfo,
    },

    LoadFailed {
        generation: u64,
        error: PdfError,
    },

    Page {
        id: RequestId,
        generation: u64,
        page: Arc<RenderedPage>,
    },

    Error {
        id: RequestId,
        generation: u64,
        error: PdfError,
    },
}
