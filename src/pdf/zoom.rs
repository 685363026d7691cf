//! Zoom limits and pan state for the page view

/// Scroll/pan direction
#[derive(Clone, Copy, Debug)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Zoom configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLimits {
    /// Scale a freshly loaded document starts at
    pub initial: f32,
    /// Floor no zoom-out can go below
    pub min: f32,
    /// Ceiling no zoom-in can go above
    pub max: f32,
    /// Additive step for zoom in/out
    pub step: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            initial: 1.5,
            min: 0.4,
            max: 6.0,
            step: 0.2,
        }
    }
}

impl ZoomLimits {
    /// Clamp a scale into `min..=max`, handling NaN/Inf
    #[must_use]
    pub fn clamp(&self, scale: f32) -> f32 {
        let max = self.max.max(self.min);
        if scale.is_finite() {
            scale.clamp(self.min, max)
        } else {
            self.initial.clamp(self.min, max)
        }
    }
}

/// Pan offsets when the page is larger than the view area, in cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pan {
    pub col: u16,
    pub row: u16,
}

impl Pan {
    pub const STEP_X: u16 = 4;
    pub const STEP_Y: u16 = 2;

    pub fn apply(&mut self, direction: ScrollDirection) {
        match direction {
            ScrollDirection::Up => self.row = self.row.saturating_sub(Self::STEP_Y),
            ScrollDirection::Down => self.row = self.row.saturating_add(Self::STEP_Y),
            ScrollDirection::Left => self.col = self.col.saturating_sub(Self::STEP_X),
            ScrollDirection::Right => self.col = self.col.saturating_add(Self::STEP_X),
        }
    }

    /// Keep the offsets within a content of `content` cells shown in `view` cells
    pub fn clamp_to(&mut self, content: (u16, u16), view: (u16, u16)) {
        self.col = self.col.min(content.0.saturating_sub(view.0));
        self.row = self.row.min(content.1.saturating_sub(view.1));
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_floor_ceiling_and_non_finite() {
        let limits = ZoomLimits::default();
        assert_eq!(limits.clamp(0.1), 0.4);
        assert_eq!(limits.clamp(2.0), 2.0);
        assert_eq!(limits.clamp(435.0), 6.0);
        assert_eq!(limits.clamp(f32::INFINITY), 1.5);
        assert_eq!(limits.clamp(f32::NAN), 1.5);
    }

    #[test]
    fn pan_is_clamped_to_content() {
        let mut pan = Pan::default();
        for _ in 0..50 {
            pan.apply(ScrollDirection::Down);
            pan.apply(ScrollDirection::Right);
        }
        pan.clamp_to((100, 60), (80, 40));
        assert_eq!(pan, Pan { col: 20, row: 20 });

        pan.clamp_to((50, 30), (80, 40));
        assert_eq!(pan, Pan::default());
    }
}
