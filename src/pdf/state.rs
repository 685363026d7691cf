//! View state machine for the document viewer

use super::request::RenderTarget;
use super::zoom::ZoomLimits;

/// Current view state
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState {
    Empty,
    Loaded {
        page_count: usize,
        /// Current page (1-based, within `1..=page_count`)
        current_page: usize,
        scale: f32,
    },
}

/// Commands that modify the view state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// A document with this many pages finished parsing
    DocumentLoaded { page_count: usize },
    /// Go to a specific page (1-based)
    GoToPage(usize),
    PrevPage,
    NextPage,
    /// Change the scale by a signed delta
    Zoom(f32),
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    /// Render this page at this scale
    Render(RenderTarget),
    /// Scroll the page view back to its origin
    ResetPan,
}

impl ViewState {
    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command, limits: &ZoomLimits) -> Vec<Effect> {
        if let Command::DocumentLoaded { page_count } = cmd {
            let scale = match self {
                Self::Loaded { scale, .. } => *scale,
                Self::Empty => limits.clamp(limits.initial),
            };
            *self = Self::Loaded {
                page_count,
                current_page: 1,
                scale,
            };
            return vec![
                Effect::ResetPan,
                Effect::Render(RenderTarget { page: 1, scale }),
            ];
        }

        let Self::Loaded {
            page_count,
            current_page,
            scale,
        } = self
        else {
            return vec![];
        };

        match cmd {
            Command::DocumentLoaded { .. } => vec![],

            Command::GoToPage(page) => go_to(*page_count, current_page, *scale, page),

            Command::PrevPage => match current_page.checked_sub(1) {
                Some(page) => go_to(*page_count, current_page, *scale, page),
                None => vec![],
            },

            Command::NextPage => {
                let next = *current_page + 1;
                go_to(*page_count, current_page, *scale, next)
            }

            Command::Zoom(delta) => {
                let clamped = limits.clamp(*scale + delta);
                if (*scale - clamped).abs() > f32::EPSILON {
                    *scale = clamped;
                    vec![Effect::Render(RenderTarget {
                        page: *current_page,
                        scale: clamped,
                    })]
                } else {
                    vec![]
                }
            }
        }
    }

    #[must_use]
    pub fn current_page(&self) -> Option<usize> {
        match self {
            Self::Loaded { current_page, .. } => Some(*current_page),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        match self {
            Self::Loaded { page_count, .. } => Some(*page_count),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub fn scale(&self) -> Option<f32> {
        match self {
            Self::Loaded { scale, .. } => Some(*scale),
            Self::Empty => None,
        }
    }
}

fn go_to(page_count: usize, current_page: &mut usize, scale: f32, page: usize) -> Vec<Effect> {
    if page == 0 || page > page_count || page == *current_page {
        return vec![];
    }
    *current_page = page;
    vec![
        Effect::ResetPan,
        Effect::Render(RenderTarget { page, scale }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(page_count: usize) -> ViewState {
        let mut state = ViewState::Empty;
        let _ = state.apply(Command::DocumentLoaded { page_count }, &ZoomLimits::default());
        state
    }

    #[test]
    fn load_starts_on_first_page() {
        let mut state = ViewState::Empty;
        let effects = state.apply(Command::DocumentLoaded { page_count: 7 }, &ZoomLimits::default());
        assert_eq!(state.current_page(), Some(1));
        assert_eq!(state.page_count(), Some(7));
        assert_eq!(
            effects.last(),
            Some(&Effect::Render(RenderTarget { page: 1, scale: 1.5 }))
        );
    }

    #[test]
    fn go_to_page_within_bounds() {
        let mut state = loaded(10);
        let limits = ZoomLimits::default();
        for p in 2..=10 {
            let effects = state.apply(Command::GoToPage(p), &limits);
            assert_eq!(state.current_page(), Some(p));
            assert!(effects.contains(&Effect::Render(RenderTarget { page: p, scale: 1.5 })));
        }
    }

    #[test]
    fn go_to_out_of_bounds_is_noop() {
        let mut state = loaded(3);
        let limits = ZoomLimits::default();
        let before = state.clone();

        assert!(state.apply(Command::GoToPage(0), &limits).is_empty());
        assert!(state.apply(Command::GoToPage(4), &limits).is_empty());
        assert!(state.apply(Command::PrevPage, &limits).is_empty());
        assert_eq!(state, before);

        let _ = state.apply(Command::GoToPage(3), &limits);
        assert!(state.apply(Command::NextPage, &limits).is_empty());
        assert_eq!(state.current_page(), Some(3));
    }

    #[test]
    fn commands_on_empty_state_do_nothing() {
        let mut state = ViewState::Empty;
        let limits = ZoomLimits::default();
        assert!(state.apply(Command::NextPage, &limits).is_empty());
        assert!(state.apply(Command::Zoom(1.0), &limits).is_empty());
        assert_eq!(state, ViewState::Empty);
    }

    #[test]
    fn zoom_never_drops_below_floor() {
        let mut state = loaded(1);
        let limits = ZoomLimits::default();
        for _ in 0..100 {
            let _ = state.apply(Command::Zoom(-limits.step), &limits);
        }
        assert_eq!(state.scale(), Some(limits.min));
        assert!(state.apply(Command::Zoom(-limits.step), &limits).is_empty());
    }

    #[test]
    fn zoom_in_stops_at_ceiling() {
        let mut state = loaded(1);
        let limits = ZoomLimits::default();
        for _ in 0..2500 {
            let _ = state.apply(Command::Zoom(limits.step), &limits);
        }
        assert_eq!(state.scale(), Some(limits.max));
        assert!(state.apply(Command::Zoom(limits.step), &limits).is_empty());
    }

    #[test]
    fn reload_keeps_scale_and_resets_page() {
        let mut state = loaded(5);
        let limits = ZoomLimits::default();
        let _ = state.apply(Command::GoToPage(4), &limits);
        let _ = state.apply(Command::Zoom(0.5), &limits);

        let _ = state.apply(Command::DocumentLoaded { page_count: 2 }, &limits);
        assert_eq!(
            state,
            ViewState::Loaded {
                page_count: 2,
                current_page: 1,
                scale: 2.0
            }
        );
    }
}
