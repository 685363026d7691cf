//! Selectable text overlay aligned to a rendered page bitmap

use super::types::{CharInfo, TextRun, Viewport};

/// One positioned line of text in viewport dots
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpan {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub chars: Vec<CharInfo>,
}

impl TextSpan {
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().map(|ch| ch.c).collect()
    }
}

/// Text overlay for one page, sized exactly to the viewport it was built for
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer {
    /// Page number (1-based)
    pub page: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub spans: Vec<TextSpan>,
}

/// Selection rectangle in viewport dots.
///
/// `start` is where the selection began reading-order wise, `end` where it
/// stopped; lines strictly between them are taken whole. Each end covers
/// `band` dots downward from its `y`, the height of one terminal cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionBounds {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub band: f32,
}

/// Vertical overlap of a span with `top..top + band`
fn overlap(span: &TextSpan, top: f32, band: f32) -> f32 {
    if band <= 0.0 {
        return if span.y0 <= top && top <= span.y1 { 1.0 } else { 0.0 };
    }
    span.y1.min(top + band) - span.y0.max(top)
}

impl TextLayer {
    /// Build the overlay for `page` from engine text runs (page points)
    #[must_use]
    pub fn build(page: usize, runs: &[TextRun], viewport: &Viewport) -> Self {
        let mag = viewport.mag();
        let spans = runs
            .iter()
            .filter(|run| !run.chars.is_empty())
            .map(|run| TextSpan {
                x0: run.x0 * mag,
                y0: run.y0 * mag,
                x1: run.x1 * mag,
                y1: run.y1 * mag,
                chars: run
                    .chars
                    .iter()
                    .map(|ch| CharInfo {
                        x: ch.x * mag,
                        c: ch.c,
                    })
                    .collect(),
            })
            .collect();

        Self {
            page,
            width_px: viewport.width_px,
            height_px: viewport.height_px,
            spans,
        }
    }

    #[must_use]
    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.width_px == viewport.width_px && self.height_px == viewport.height_px
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Text covered by a selection, lines ordered top to bottom.
    ///
    /// An end band touching two lines picks the one it overlaps most.
    #[must_use]
    pub fn text_in(&self, bounds: &SelectionBounds) -> String {
        let band = bounds.band.max(0.0);
        let (top, start_x, bottom, end_x) = if bounds.start_y <= bounds.end_y {
            (bounds.start_y, bounds.start_x, bounds.end_y, bounds.end_x)
        } else {
            (bounds.end_y, bounds.end_x, bounds.start_y, bounds.start_x)
        };

        let mut spans: Vec<&TextSpan> = self.spans.iter().collect();
        spans.sort_by(|a, b| a.y0.partial_cmp(&b.y0).unwrap_or(std::cmp::Ordering::Equal));

        let best = |row: f32| {
            spans
                .iter()
                .enumerate()
                .map(|(i, span)| (i, overlap(span, row, band)))
                .filter(|(_, o)| *o > 0.0)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _)| i)
        };
        let first_hit = best(top);
        let last_hit = best(bottom);

        // Ends in empty space take whole lines on the inside
        let first = first_hit.or_else(|| spans.iter().position(|s| s.y0 >= top));
        let last = last_hit.or_else(|| spans.iter().rposition(|s| s.y1 <= bottom + band));
        let (Some(first), Some(last)) = (first, last) else {
            return String::new();
        };
        if first > last {
            return String::new();
        }

        (first..=last)
            .filter_map(|i| {
                let is_first = first_hit == Some(i);
                let is_last = last_hit == Some(i);
                let line: String = spans[i]
                    .chars
                    .iter()
                    .filter(|ch| match (is_first, is_last) {
                        (true, true) => ch.x >= start_x.min(end_x) && ch.x <= start_x.max(end_x),
                        (true, false) => ch.x >= start_x,
                        (false, true) => ch.x <= end_x,
                        (false, false) => true,
                    })
                    .map(|ch| ch.c)
                    .collect();
                (!line.trim().is_empty()).then_some(line)
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Whether the dot lies on a glyph box of any span
    #[must_use]
    pub fn hit(&self, x: f32, y: f32) -> bool {
        self.spans
            .iter()
            .any(|s| x >= s.x0 && x <= s.x1 && y >= s.y0 && y <= s.y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PageSize;

    fn run(y: f32, text: &str) -> TextRun {
        TextRun {
            x0: 10.0,
            y0: y,
            x1: 10.0 + text.len() as f32 * 8.0,
            y1: y + 10.0,
            chars: text
                .chars()
                .enumerate()
                .map(|(i, c)| CharInfo {
                    x: 10.0 + i as f32 * 8.0,
                    c,
                })
                .collect(),
        }
    }

    fn layer() -> TextLayer {
        // scale 8.0 -> magnification 1.0, so page points equal dots
        let viewport = Viewport::for_page(PageSize::new(400.0, 400.0), 8.0);
        TextLayer::build(3, &[run(100.0, "first line"), run(20.0, "title"), run(50.0, "middle")], &viewport)
    }

    #[test]
    fn layer_is_sized_to_viewport() {
        let viewport = Viewport::for_page(PageSize::new(612.0, 792.0), 1.5);
        let layer = TextLayer::build(1, &[run(10.0, "x")], &viewport);
        assert!(layer.matches(&viewport));
        assert_eq!(layer.width_px, viewport.width_px);
        assert_eq!(layer.height_px, viewport.height_px);
    }

    #[test]
    fn spans_are_scaled_into_viewport_space() {
        let viewport = Viewport::for_page(PageSize::new(612.0, 792.0), 2.0);
        let layer = TextLayer::build(1, &[run(40.0, "ab")], &viewport);
        let span = &layer.spans[0];
        assert!((span.y0 - 40.0 * 0.25).abs() < f32::EPSILON);
        assert!((span.chars[1].x - 18.0 * 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn full_lines_between_first_and_last_are_included_in_order() {
        let text = layer().text_in(&SelectionBounds {
            start_x: 0.0,
            start_y: 25.0,
            end_x: 400.0,
            end_y: 105.0,
            band: 2.0,
        });
        assert_eq!(text, "title\nmiddle\nfirst line");
    }

    #[test]
    fn single_line_selection_is_clipped_by_x() {
        // "first line": 'l' of "line" starts at x = 10 + 6*8 = 58
        let text = layer().text_in(&SelectionBounds {
            start_x: 58.0,
            start_y: 105.0,
            end_x: 400.0,
            end_y: 105.0,
            band: 2.0,
        });
        assert_eq!(text, "line");
    }

    #[test]
    fn backwards_drag_selects_same_text() {
        let forward = layer().text_in(&SelectionBounds {
            start_x: 10.0,
            start_y: 55.0,
            end_x: 30.0,
            end_y: 105.0,
            band: 2.0,
        });
        let backward = layer().text_in(&SelectionBounds {
            start_x: 30.0,
            start_y: 105.0,
            end_x: 10.0,
            end_y: 55.0,
            band: 2.0,
        });
        assert_eq!(forward, backward);
        assert_eq!(forward, "middle\nfir");
    }

    #[test]
    fn empty_area_selects_nothing() {
        let text = layer().text_in(&SelectionBounds {
            start_x: 0.0,
            start_y: 300.0,
            end_x: 400.0,
            end_y: 350.0,
            band: 2.0,
        });
        assert!(text.is_empty());
    }

    #[test]
    fn thin_line_between_cell_centres_selects_alone() {
        // Lines 1.8 dots tall on a 2.1 dot pitch; neither cell centre
        // y = 5 nor y = 7 falls on the upper one
        let viewport = Viewport::for_page(PageSize::new(400.0, 400.0), 8.0);
        let thin = |y0: f32, text: &str| TextRun {
            y1: y0 + 1.8,
            ..run(y0, text)
        };
        let layer = TextLayer::build(1, &[thin(5.1, "upper"), thin(7.2, "lower")], &viewport);

        for row_top in [4.0, 6.0] {
            let text = layer.text_in(&SelectionBounds {
                start_x: 0.0,
                start_y: row_top,
                end_x: 400.0,
                end_y: row_top,
                band: 2.0,
            });
            assert_eq!(text, "upper", "cell starting at dot {row_top}");
        }

        let text = layer.text_in(&SelectionBounds {
            start_x: 0.0,
            start_y: 8.0,
            end_x: 400.0,
            end_y: 8.0,
            band: 2.0,
        });
        assert_eq!(text, "lower");
    }
}
