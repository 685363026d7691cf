//! Half-block drawing of the canvas into a terminal buffer.
//!
//! Each cell shows two vertically stacked dots using `▀`: the foreground
//! color is the upper dot, the background the lower one.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
};

use super::controller::DocumentController;
use crate::pdf::{Bitmap, TextLayer, TextSelection};
use crate::theme::Base16Palette;

const UPPER_HALF: &str = "▀";
const HIGHLIGHT_ALPHA: f32 = 0.45;

/// Draw the current page, or a placeholder when there is none
pub fn render_page(
    f: &mut Frame,
    area: Rect,
    ctrl: &mut DocumentController,
    palette: &Base16Palette,
) {
    let (Some(bitmap), Some(viewport)) = (ctrl.canvas().bitmap(), ctrl.canvas().viewport()) else {
        ctrl.set_page_rect(None);
        render_placeholder(f, area, ctrl, palette);
        return;
    };

    let pan = ctrl.pan();
    let visible_w = viewport.width_cells().saturating_sub(pan.col).min(area.width);
    let visible_h = viewport.height_cells().saturating_sub(pan.row).min(area.height);
    let offset_x = (area.width - visible_w) / 2;
    let page_rect = Rect::new(area.x + offset_x, area.y, visible_w, visible_h);

    let look = Look {
        dark: ctrl.is_dark_mode(),
        highlight: palette.base_0d,
        selection: ctrl.selection(),
        layer: ctrl.canvas().text_layer(),
    };

    let buf = f.buffer_mut();
    for dy in 0..visible_h {
        for dx in 0..visible_w {
            let x = u32::from(pan.col + dx);
            let top = u32::from(pan.row + dy) * 2;
            let upper = look.dot_color(bitmap, x, top);
            let lower = look.dot_color(bitmap, x, top + 1);
            buf[(page_rect.x + dx, page_rect.y + dy)]
                .set_symbol(UPPER_HALF)
                .set_fg(upper)
                .set_bg(lower);
        }
    }

    ctrl.set_page_rect(Some(page_rect));
}

fn render_placeholder(f: &mut Frame, area: Rect, ctrl: &DocumentController, palette: &Base16Palette) {
    let message = if !ctrl.has_engine() {
        "PDF support is not available in this build"
    } else if ctrl.is_busy() {
        "Loading…"
    } else {
        "No document open. Run pdfmentor <FILE> to read a PDF."
    };
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
    f.render_widget(
        Paragraph::new(Line::from(message))
            .style(Style::default().fg(palette.base_03))
            .alignment(Alignment::Center),
        line_area.intersection(area),
    );
}

struct Look<'a> {
    dark: bool,
    highlight: Color,
    selection: &'a TextSelection,
    layer: Option<&'a TextLayer>,
}

impl Look<'_> {
    fn dot_color(&self, bitmap: &Bitmap, x: u32, y: u32) -> Color {
        let (mut r, mut g, mut b) = bitmap.pixel(x, y).unwrap_or((0xFF, 0xFF, 0xFF));
        if self.dark {
            (r, g, b) = (0xFF - r, 0xFF - g, 0xFF - b);
        }
        let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
        let selected = self.selection.covers(fx, fy)
            && self.layer.is_some_and(|layer| layer.hit(fx, fy));
        if selected {
            if let Color::Rgb(hr, hg, hb) = self.highlight {
                (r, g, b) = (blend(r, hr), blend(g, hg), blend(b, hb));
            }
        }
        Color::Rgb(r, g, b)
    }
}

fn blend(base: u8, over: u8) -> u8 {
    (f32::from(base) * (1.0 - HIGHLIGHT_ALPHA) + f32::from(over) * HIGHLIGHT_ALPHA).round() as u8
}
