//! Text selection state for the page view

use super::text_layer::SelectionBounds;

/// Dots covered vertically by one terminal cell (two half-blocks)
pub const CELL_HEIGHT_DOTS: f32 = 2.0;

/// A point in the selection, in viewport dots. `y` is the top of the
/// cell the pointer is on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionPoint {
    pub x: f32,
    pub y: f32,
}

/// Text selection state
#[derive(Clone, Debug, Default)]
pub struct TextSelection {
    /// Start point of selection
    pub start: Option<SelectionPoint>,
    /// End point of selection
    pub end: Option<SelectionPoint>,
    /// Whether a drag is in progress
    pub is_selecting: bool,
}

impl TextSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(&mut self, point: SelectionPoint) {
        self.start = Some(point);
        self.end = Some(point);
        self.is_selecting = true;
    }

    /// Update the end point during a drag
    pub fn update_end(&mut self, point: SelectionPoint) {
        if self.is_selecting {
            self.end = Some(point);
        }
    }

    pub fn finish(&mut self) {
        self.is_selecting = false;
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.is_selecting = false;
    }

    /// A zero-length click is not a selection
    #[must_use]
    pub fn has_selection(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s != e)
    }

    #[must_use]
    pub fn bounds(&self) -> Option<SelectionBounds> {
        if !self.has_selection() {
            return None;
        }
        let (start, end) = (self.start?, self.end?);
        Some(SelectionBounds {
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            band: CELL_HEIGHT_DOTS,
        })
    }

    /// Whether the dot is inside the selected band, for highlighting
    #[must_use]
    pub fn covers(&self, x: f32, y: f32) -> bool {
        let Some(b) = self.bounds() else {
            return false;
        };
        let (top, last_top, start_x, end_x) = if b.start_y <= b.end_y {
            (b.start_y, b.end_y, b.start_x, b.end_x)
        } else {
            (b.end_y, b.start_y, b.end_x, b.start_x)
        };
        if y < top || y >= last_top + b.band {
            return false;
        }
        if last_top - top < b.band {
            x >= start_x.min(end_x) && x <= start_x.max(end_x)
        } else if y < top + b.band {
            x >= start_x
        } else if y >= last_top {
            x <= end_x
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_without_drag_is_not_a_selection() {
        let mut sel = TextSelection::new();
        sel.start_at(SelectionPoint { x: 4.0, y: 4.0 });
        sel.finish();
        assert!(!sel.has_selection());
        assert!(sel.bounds().is_none());
    }

    #[test]
    fn drag_produces_bounds() {
        let mut sel = TextSelection::new();
        sel.start_at(SelectionPoint { x: 4.0, y: 4.0 });
        sel.update_end(SelectionPoint { x: 20.0, y: 10.0 });
        sel.finish();
        sel.update_end(SelectionPoint { x: 90.0, y: 90.0 });

        let bounds = sel.bounds().unwrap();
        assert_eq!(bounds.end_x, 20.0);
        assert!(sel.covers(30.0, 6.0));
        assert!(!sel.covers(2.0, 4.0));
    }
}
