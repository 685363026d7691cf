//! MuPDF-backed engine

use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, Pixmap, TextPageFlags};

use super::engine::{PdfDocument, PdfEngine, PdfError, check_page};
use super::types::{Bitmap, CharInfo, PageSize, TextRun, Viewport};

/// Engine backed by MuPDF
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfEngine;

impl PdfEngine for MupdfEngine {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, PdfError> {
        let doc = Document::from_bytes(bytes, "application/pdf")?;
        let page_count = doc.page_count()?;
        if page_count <= 0 {
            return Err(PdfError::Empty);
        }
        Ok(Box::new(MupdfDocument {
            doc,
            page_count: page_count as usize,
        }))
    }
}

struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn load(&self, page: usize) -> Result<mupdf::Page, PdfError> {
        check_page(self, page)?;
        Ok(self.doc.load_page((page - 1) as i32)?)
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize) -> Result<PageSize, PdfError> {
        let bounds = self.load(page)?.bounds()?;
        Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn rasterize(&self, page: usize, viewport: &Viewport) -> Result<Bitmap, PdfError> {
        let page = self.load(page)?;
        let bounds = page.bounds()?;
        let page_width = bounds.x1 - bounds.x0;
        let page_height = bounds.y1 - bounds.y0;

        // Independent x/y factors so the pixmap lands exactly on the viewport size
        let sx = viewport.width_px as f32 / page_width.max(1.0);
        let sy = viewport.height_px as f32 / page_height.max(1.0);

        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&Matrix::new_scale(sx, sy), &rgb, false, false)?;
        let bitmap = pixmap_to_bitmap(&pixmap)?;

        if bitmap.matches(viewport) {
            Ok(bitmap)
        } else {
            Ok(fit_to_viewport(&bitmap, viewport))
        }
    }

    fn text_runs(&self, page: usize) -> Result<Vec<TextRun>, PdfError> {
        let page = self.load(page)?;
        let text_page = page.to_text_page(TextPageFlags::empty())?;
        let mut runs = Vec::new();

        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let bbox = line.bounds();
                let chars: Vec<CharInfo> = line
                    .chars()
                    .filter_map(|ch| {
                        ch.char().map(|c| CharInfo {
                            x: ch.origin().x,
                            c,
                        })
                    })
                    .collect();
                if chars.is_empty() {
                    continue;
                }
                runs.push(TextRun {
                    x0: bbox.x0,
                    y0: bbox.y0,
                    x1: bbox.x1,
                    y1: bbox.y1,
                    chars,
                });
            }
        }

        Ok(runs)
    }

    fn title(&self) -> Option<String> {
        self.doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty())
    }
}

fn pixmap_to_bitmap(pixmap: &Pixmap) -> Result<Bitmap, PdfError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(PdfError::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(PdfError::generic("Pixmap buffer size mismatch"));
    }

    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            pixels.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                pixels.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(Bitmap {
        pixels,
        width_px: pixmap.width(),
        height_px: pixmap.height(),
    })
}

/// Crop or pad with white so rounding in the rasterizer never leaves the
/// bitmap a dot off from the viewport.
fn fit_to_viewport(bitmap: &Bitmap, viewport: &Viewport) -> Bitmap {
    let mut out = Bitmap::blank(viewport.width_px, viewport.height_px);
    let copy_w = bitmap.width_px.min(viewport.width_px) as usize;
    let copy_h = bitmap.height_px.min(viewport.height_px) as usize;
    let src_stride = bitmap.width_px as usize * 3;
    let dst_stride = viewport.width_px as usize * 3;

    for y in 0..copy_h {
        let src = bitmap.pixels.get(y * src_stride..y * src_stride + copy_w * 3);
        let dst = out.pixels.get_mut(y * dst_stride..y * dst_stride + copy_w * 3);
        if let (Some(src), Some(dst)) = (src, dst) {
            dst.copy_from_slice(src);
        }
    }
    out
}
