//! PDF rendering infrastructure

mod cache;
mod engine;
#[cfg(feature = "pdf")]
mod mupdf_engine;
mod renderer;
mod request;
mod selection;
mod service;
mod state;
mod text_layer;
mod types;
mod worker;
mod zoom;

pub use cache::{CacheKey, PageCache};
pub use engine::{PdfDocument, PdfEngine, PdfError, check_page, looks_like_pdf};
#[cfg(feature = "pdf")]
pub use mupdf_engine::MupdfEngine;
pub use renderer::{Canvas, CanvasError, PageRenderer, RenderedPage};
pub use request::{DocumentInfo, RenderRequest, RenderResponse, RenderTarget, RequestId};
pub use selection::{CELL_HEIGHT_DOTS, SelectionPoint, TextSelection};
pub use service::{RenderService, ServiceEvent};
pub use state::{Command, Effect, ViewState};
pub use text_layer::{SelectionBounds, TextLayer, TextSpan};
pub use types::*;
pub use zoom::*;

/// Rendered pages kept per document
pub const DEFAULT_CACHE_SIZE: usize = 8;

/// The engine compiled into this build, if any
#[must_use]
pub fn default_engine() -> Option<Box<dyn PdfEngine>> {
    #[cfg(feature = "pdf")]
    {
        Some(Box::new(MupdfEngine))
    }
    #[cfg(not(feature = "pdf"))]
    {
        None
    }
}
