//! Page rendering: bitmap first, then the text layer for the same viewport

use super::engine::{PdfDocument, PdfError, check_page};
use super::text_layer::TextLayer;
use super::types::{Bitmap, Viewport};

/// A fully rendered page: bitmap plus its aligned text layer
#[derive(Clone, Debug)]
pub struct RenderedPage {
    pub page: usize,
    pub viewport: Viewport,
    pub bitmap: Bitmap,
    pub text_layer: TextLayer,
}

/// Rasterizes pages and builds their text layers
pub struct PageRenderer;

impl PageRenderer {
    /// Render `page` (1-based) at `scale`.
    ///
    /// The bitmap is drawn before text extraction starts; a text layer is
    /// never produced for a page whose bitmap failed.
    pub fn render(
        doc: &dyn PdfDocument,
        page: usize,
        scale: f32,
    ) -> Result<RenderedPage, PdfError> {
        check_page(doc, page)?;
        let viewport = Viewport::for_page(doc.page_size(page)?, scale);

        let bitmap = doc.rasterize(page, &viewport)?;
        if !bitmap.matches(&viewport) {
            return Err(PdfError::generic(format!(
                "rasterized {}x{} for a {}x{} viewport",
                bitmap.width_px, bitmap.height_px, viewport.width_px, viewport.height_px
            )));
        }

        let runs = doc.text_runs(page)?;
        let text_layer = TextLayer::build(page, &runs, &viewport);

        Ok(RenderedPage {
            page,
            viewport,
            bitmap,
            text_layer,
        })
    }
}

/// Errors attaching content to the canvas
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CanvasError {
    #[error("no bitmap drawn")]
    NoBitmap,
    #[error("text layer for page {layer_page} does not match bitmap of page {page}")]
    PageMismatch { page: usize, layer_page: usize },
    #[error("text layer {layer_w}x{layer_h} does not match bitmap {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        layer_w: u32,
        layer_h: u32,
    },
}

/// The single drawing surface of the viewer: one bitmap and at most one
/// text layer on top of it.
#[derive(Debug, Default)]
pub struct Canvas {
    page: Option<usize>,
    viewport: Option<Viewport>,
    bitmap: Option<Bitmap>,
    text_layer: Option<TextLayer>,
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to the viewport and draw the bitmap. Any previous text layer
    /// is removed since it no longer lines up.
    pub fn draw(&mut self, page: usize, viewport: Viewport, bitmap: Bitmap) {
        self.text_layer = None;
        self.page = Some(page);
        self.viewport = Some(viewport);
        self.bitmap = Some(bitmap);
    }

    /// Attach the text layer, replacing any existing one
    pub fn attach_text_layer(&mut self, layer: TextLayer) -> Result<(), CanvasError> {
        let (Some(page), Some(bitmap)) = (self.page, self.bitmap.as_ref()) else {
            return Err(CanvasError::NoBitmap);
        };
        if layer.page != page {
            return Err(CanvasError::PageMismatch {
                page,
                layer_page: layer.page,
            });
        }
        if layer.width_px != bitmap.width_px || layer.height_px != bitmap.height_px {
            return Err(CanvasError::SizeMismatch {
                width: bitmap.width_px,
                height: bitmap.height_px,
                layer_w: layer.width_px,
                layer_h: layer.height_px,
            });
        }
        self.text_layer = Some(layer);
        Ok(())
    }

    /// Present a complete rendered page in order: bitmap, then text layer
    pub fn present(&mut self, rendered: RenderedPage) -> Result<(), CanvasError> {
        self.draw(rendered.page, rendered.viewport, rendered.bitmap);
        self.attach_text_layer(rendered.text_layer)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn page(&self) -> Option<usize> {
        self.page
    }

    #[must_use]
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    #[must_use]
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    #[must_use]
    pub fn text_layer(&self) -> Option<&TextLayer> {
        self.text_layer.as_ref()
    }

    /// Number of attached text layers (0 or 1)
    #[must_use]
    pub fn text_layer_count(&self) -> usize {
        usize::from(self.text_layer.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PageSize;

    fn viewport() -> Viewport {
        Viewport::for_page(PageSize::new(612.0, 792.0), 1.0)
    }

    fn layer_for(page: usize, vp: &Viewport) -> TextLayer {
        TextLayer::build(page, &[], vp)
    }

    #[test]
    fn draw_drops_existing_text_layer() {
        let vp = viewport();
        let mut canvas = Canvas::new();
        canvas.draw(1, vp, Bitmap::blank(vp.width_px, vp.height_px));
        canvas.attach_text_layer(layer_for(1, &vp)).unwrap();
        assert_eq!(canvas.text_layer_count(), 1);

        canvas.draw(2, vp, Bitmap::blank(vp.width_px, vp.height_px));
        assert_eq!(canvas.text_layer_count(), 0);
        assert_eq!(canvas.page(), Some(2));
    }

    #[test]
    fn attaching_twice_replaces_layer() {
        let vp = viewport();
        let mut canvas = Canvas::new();
        canvas.draw(1, vp, Bitmap::blank(vp.width_px, vp.height_px));
        canvas.attach_text_layer(layer_for(1, &vp)).unwrap();
        canvas.attach_text_layer(layer_for(1, &vp)).unwrap();
        assert_eq!(canvas.text_layer_count(), 1);
    }

    #[test]
    fn layer_without_bitmap_is_rejected() {
        let vp = viewport();
        let mut canvas = Canvas::new();
        assert_eq!(
            canvas.attach_text_layer(layer_for(1, &vp)),
            Err(CanvasError::NoBitmap)
        );
    }

    #[test]
    fn mismatched_layer_is_rejected() {
        let vp = viewport();
        let other = Viewport::for_page(PageSize::new(612.0, 792.0), 2.0);
        let mut canvas = Canvas::new();
        canvas.draw(1, vp, Bitmap::blank(vp.width_px, vp.height_px));

        assert!(matches!(
            canvas.attach_text_layer(layer_for(1, &other)),
            Err(CanvasError::SizeMismatch { .. })
        ));
        assert!(matches!(
            canvas.attach_text_layer(layer_for(4, &vp)),
            Err(CanvasError::PageMismatch { page: 1, layer_page: 4 })
        ));
        assert_eq!(canvas.text_layer_count(), 0);
    }
}
