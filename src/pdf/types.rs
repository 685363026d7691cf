//! Core types for PDF rendering

/// Terminal dots per PDF point at scale 1.0.
///
/// One terminal column is one dot wide and one row is two dots tall
/// (half-block rendering), so a US-letter page at scale 1.0 is roughly
/// 76 columns by 50 rows.
pub const DOTS_PER_POINT: f32 = 0.125;

/// Page dimensions in PDF points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// The drawing surface geometry for one page at one scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in dots
    pub width_px: u32,
    /// Height in dots
    pub height_px: u32,
    /// User zoom scale this viewport was computed for
    pub scale: f32,
}

impl Viewport {
    /// Compute the viewport of a page at the given zoom scale
    #[must_use]
    pub fn for_page(size: PageSize, scale: f32) -> Self {
        let mag = Self::magnification(scale);
        Self {
            width_px: ((size.width * mag).round() as u32).max(1),
            height_px: ((size.height * mag).round() as u32).max(1),
            scale,
        }
    }

    /// Dots per PDF point at the given scale
    #[must_use]
    pub fn magnification(scale: f32) -> f32 {
        scale * DOTS_PER_POINT
    }

    /// Dots per PDF point for this viewport
    #[must_use]
    pub fn mag(&self) -> f32 {
        Self::magnification(self.scale)
    }

    /// Width in terminal cells
    #[must_use]
    pub fn width_cells(&self) -> u16 {
        u16::try_from(self.width_px).unwrap_or(u16::MAX)
    }

    /// Height in terminal cells (two dots per row)
    #[must_use]
    pub fn height_cells(&self) -> u16 {
        u16::try_from(self.height_px.div_ceil(2)).unwrap_or(u16::MAX)
    }
}

/// Raw rasterized page.
///
/// Contains RGB pixel data (3 bytes per pixel) whose dimensions
/// always match the viewport it was rendered for.
#[derive(Clone)]
pub struct Bitmap {
    pub pixels: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl Bitmap {
    /// Bytes needed for an RGB bitmap of this size, `None` on overflow
    #[must_use]
    pub fn byte_len(width_px: u32, height_px: u32) -> Option<usize> {
        (width_px as usize)
            .checked_mul(height_px as usize)?
            .checked_mul(3)
    }

    /// A blank (white) bitmap. Sizes that overflow get no pixel storage.
    #[must_use]
    pub fn blank(width_px: u32, height_px: u32) -> Self {
        let len = Self::byte_len(width_px, height_px).unwrap_or_else(|| {
            log::warn!("Bitmap {width_px}x{height_px} is too large to allocate");
            0
        });
        Self {
            pixels: vec![0xFF; len],
            width_px,
            height_px,
        }
    }

    /// Byte offset of the dot at (x, y), if inside the bitmap
    #[must_use]
    pub fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width_px || y >= self.height_px {
            return None;
        }
        (y as usize)
            .checked_mul(self.width_px as usize)?
            .checked_add(x as usize)?
            .checked_mul(3)
    }

    /// RGB value at the given dot, if inside the bitmap
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        let idx = self.offset(x, y)?;
        let px = self.pixels.get(idx..idx + 3)?;
        Some((px[0], px[1], px[2]))
    }

    #[must_use]
    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.width_px == viewport.width_px && self.height_px == viewport.height_px
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish_non_exhaustive()
    }
}

/// Character position information for text extraction
#[derive(Clone, Debug, PartialEq)]
pub struct CharInfo {
    /// X coordinate of the glyph origin
    pub x: f32,
    /// The character
    pub c: char,
}

/// A positioned line of text as reported by the PDF engine, in page points
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub chars: Vec<CharInfo>,
}

impl TextRun {
    /// The run's text
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().map(|ch| ch.c).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_bitmaps_do_not_wrap() {
        assert_eq!(Bitmap::byte_len(4, 2), Some(24));
        assert_eq!(Bitmap::byte_len(u32::MAX, u32::MAX), None);
        // 0x10000 * 0x10000 * 3 wraps a u32 but fits a 64-bit usize
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            Bitmap::byte_len(0x1_0000, 0x1_0000),
            Some(0x1_0000usize * 0x1_0000 * 3)
        );
    }

    #[test]
    fn pixel_lookup_is_bounded() {
        let bitmap = Bitmap::blank(3, 2);
        assert_eq!(bitmap.pixel(2, 1), Some((0xFF, 0xFF, 0xFF)));
        assert_eq!(bitmap.pixel(3, 0), None);
        assert_eq!(bitmap.offset(1, 1), Some(12));
    }
}
