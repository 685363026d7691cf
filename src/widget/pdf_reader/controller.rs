//! Document viewer controller: view state, canvas and render service

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use ratatui::layout::Rect;

use crate::pdf::{
    CELL_HEIGHT_DOTS, Canvas, Command, DocumentInfo, Effect, Pan, RenderService, RenderTarget,
    ScrollDirection, SelectionPoint, ServiceEvent, TextSelection, ViewState, ZoomLimits,
    looks_like_pdf,
};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Not a PDF file")]
    UnsupportedFile,
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF support is not available in this build")]
    NoEngine,
}

/// Something the app may want to tell the user about
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Loaded {
        page_count: usize,
        title: Option<String>,
    },
    LoadFailed(String),
    PageShown {
        page: usize,
    },
    RenderFailed {
        page: usize,
        message: String,
    },
}

/// Owns everything the viewer shows. Nothing else mutates the view state
/// or the canvas.
pub struct DocumentController {
    state: ViewState,
    limits: ZoomLimits,
    dark_mode: bool,
    canvas: Canvas,
    service: Option<RenderService>,
    pan: Pan,
    selection: TextSelection,
    title: Option<String>,
    /// Screen area the page was last drawn into
    page_rect: Option<Rect>,
}

impl DocumentController {
    pub fn new(service: Option<RenderService>, limits: ZoomLimits) -> Self {
        if service.is_none() {
            warn!("No PDF engine available; viewer is disabled");
        }
        Self {
            state: ViewState::Empty,
            limits,
            dark_mode: false,
            canvas: Canvas::new(),
            service,
            pan: Pan::default(),
            selection: TextSelection::new(),
            title: None,
            page_rect: None,
        }
    }

    /// Start parsing a document. Bytes without a PDF header are rejected
    /// here and leave everything as it was.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<(), ViewerError> {
        if !looks_like_pdf(&bytes) {
            warn!("Rejected {} bytes without a PDF header", bytes.len());
            return Err(ViewerError::UnsupportedFile);
        }
        let service = self.service.as_mut().ok_or(ViewerError::NoEngine)?;
        info!("Loading document ({} bytes)", bytes.len());
        service.load(bytes);
        Ok(())
    }

    pub fn load_path(&mut self, path: &Path) -> Result<(), ViewerError> {
        let bytes = std::fs::read(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(bytes)
    }

    pub fn go_to(&mut self, page: usize) {
        self.dispatch(Command::GoToPage(page));
    }

    pub fn prev(&mut self) {
        self.dispatch(Command::PrevPage);
    }

    pub fn next(&mut self) {
        self.dispatch(Command::NextPage);
    }

    /// Change the scale by `delta`, never going below the floor
    pub fn zoom(&mut self, delta: f32) {
        self.dispatch(Command::Zoom(delta));
    }

    pub fn zoom_in(&mut self) {
        self.zoom(self.limits.step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(-self.limits.step);
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    fn dispatch(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd, &self.limits);
        if effects.is_empty() {
            debug!("{cmd:?} had no effect");
        }
        for effect in effects {
            match effect {
                Effect::Render(target) => {
                    self.selection.clear();
                    if let Some(service) = self.service.as_mut() {
                        service.request(target);
                    }
                }
                Effect::ResetPan => self.pan.reset(),
            }
        }
    }

    /// Apply finished worker results without blocking
    pub fn poll(&mut self) -> Vec<ViewerEvent> {
        let events = match self.service.as_mut() {
            Some(service) => service.poll(),
            None => return Vec::new(),
        };
        self.apply_service_events(events)
    }

    /// Wait up to `timeout` for a worker result, then apply all available
    pub fn poll_timeout(&mut self, timeout: Duration) -> Vec<ViewerEvent> {
        let events = match self.service.as_mut() {
            Some(service) => service.poll_timeout(timeout),
            None => return Vec::new(),
        };
        self.apply_service_events(events)
    }

    fn apply_service_events(&mut self, events: Vec<ServiceEvent>) -> Vec<ViewerEvent> {
        let mut out = Vec::new();
        for event in events {
            match event {
                ServiceEvent::Loaded(DocumentInfo { page_count, title }) => {
                    info!("Document ready: {page_count} pages");
                    self.title = title.clone();
                    self.canvas.clear();
                    self.dispatch(Command::DocumentLoaded { page_count });
                    out.push(ViewerEvent::Loaded { page_count, title });
                }
                ServiceEvent::LoadFailed(e) => {
                    error!("Failed to open document: {e}");
                    out.push(ViewerEvent::LoadFailed(e.to_string()));
                }
                ServiceEvent::Rendered(rendered) => {
                    let expected = self.current_target();
                    if expected.is_none_or(|t| t.page != rendered.page) {
                        debug!("Ignoring render of page {} no longer shown", rendered.page);
                        continue;
                    }
                    let page = rendered.page;
                    match self.canvas.present(rendered.as_ref().clone()) {
                        Ok(()) => out.push(ViewerEvent::PageShown { page }),
                        Err(e) => {
                            error!("Canvas rejected page {page}: {e}");
                            out.push(ViewerEvent::RenderFailed {
                                page,
                                message: e.to_string(),
                            });
                        }
                    }
                }
                ServiceEvent::RenderFailed { target, error: e } => {
                    error!("Failed to render page {}: {e}", target.page);
                    out.push(ViewerEvent::RenderFailed {
                        page: target.page,
                        message: e.to_string(),
                    });
                }
            }
        }
        out
    }

    fn current_target(&self) -> Option<RenderTarget> {
        match self.state {
            ViewState::Loaded {
                current_page,
                scale,
                ..
            } => Some(RenderTarget {
                page: current_page,
                scale,
            }),
            ViewState::Empty => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.service.as_ref().is_some_and(RenderService::is_busy)
    }

    pub fn has_engine(&self) -> bool {
        self.service.is_some()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_page(&self) -> Option<usize> {
        self.state.current_page()
    }

    pub fn page_count(&self) -> Option<usize> {
        self.state.page_count()
    }

    pub fn scale(&self) -> Option<f32> {
        self.state.scale()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn limits(&self) -> &ZoomLimits {
        &self.limits
    }

    pub fn pan(&self) -> Pan {
        self.pan
    }

    pub fn scroll(&mut self, direction: ScrollDirection) {
        self.pan.apply(direction);
        if let (Some(viewport), Some(rect)) = (self.canvas.viewport(), self.page_rect) {
            self.pan.clamp_to(
                (viewport.width_cells(), viewport.height_cells()),
                (rect.width, rect.height),
            );
        }
    }

    pub(crate) fn set_page_rect(&mut self, rect: Option<Rect>) {
        self.page_rect = rect;
    }

    pub fn page_rect(&self) -> Option<Rect> {
        self.page_rect
    }

    /// Map a terminal cell to a point on the page, in viewport dots
    pub fn cell_to_point(&self, column: u16, row: u16) -> Option<SelectionPoint> {
        let rect = self.page_rect?;
        if column < rect.x
            || row < rect.y
            || column >= rect.x + rect.width
            || row >= rect.y + rect.height
        {
            return None;
        }
        let x = f32::from(column - rect.x + self.pan.col) + 0.5;
        let y = f32::from(row - rect.y + self.pan.row) * CELL_HEIGHT_DOTS;
        Some(SelectionPoint { x, y })
    }

    pub fn selection(&self) -> &TextSelection {
        &self.selection
    }

    pub fn begin_selection(&mut self, point: SelectionPoint) {
        self.selection.start_at(point);
    }

    pub fn extend_selection(&mut self, point: SelectionPoint) {
        self.selection.update_end(point);
    }

    pub fn finish_selection(&mut self) {
        self.selection.finish();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Text under the live selection, if it covers any
    pub fn selected_text(&self) -> Option<String> {
        let bounds = self.selection.bounds()?;
        let text = self.canvas.text_layer()?.text_in(&bounds);
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeEngine, minimal_pdf_bytes, settle};

    fn controller(pages: usize) -> DocumentController {
        let service = RenderService::new(Box::new(FakeEngine::with_pages(pages)));
        let mut ctrl = DocumentController::new(Some(service), ZoomLimits::default());
        ctrl.load(minimal_pdf_bytes()).unwrap();
        settle(&mut ctrl);
        ctrl
    }

    #[test]
    fn load_shows_first_page_with_one_text_layer() {
        let ctrl = controller(3);
        assert_eq!(ctrl.current_page(), Some(1));
        assert_eq!(ctrl.page_count(), Some(3));
        assert_eq!(ctrl.canvas().page(), Some(1));
        assert_eq!(ctrl.canvas().text_layer_count(), 1);
    }

    #[test]
    fn every_page_gets_an_aligned_text_layer() {
        let mut ctrl = controller(4);
        for page in 1..=4 {
            ctrl.go_to(page);
            settle(&mut ctrl);
            assert_eq!(ctrl.current_page(), Some(page));
            assert_eq!(ctrl.canvas().page(), Some(page));
            assert_eq!(ctrl.canvas().text_layer_count(), 1);
            let viewport = ctrl.canvas().viewport().unwrap();
            assert!(ctrl.canvas().text_layer().unwrap().matches(viewport));
        }
    }

    #[test]
    fn out_of_range_navigation_is_ignored() {
        let mut ctrl = controller(2);
        ctrl.go_to(0);
        ctrl.go_to(3);
        ctrl.prev();
        assert!(!ctrl.is_busy());
        assert_eq!(ctrl.current_page(), Some(1));

        ctrl.next();
        settle(&mut ctrl);
        ctrl.next();
        assert!(!ctrl.is_busy());
        assert_eq!(ctrl.current_page(), Some(2));
    }

    #[test]
    fn zoom_stops_at_floor() {
        let mut ctrl = controller(1);
        for _ in 0..20 {
            ctrl.zoom_out();
        }
        settle(&mut ctrl);
        assert_eq!(ctrl.scale(), Some(ctrl.limits().min));
        ctrl.zoom(-5.0);
        assert!(!ctrl.is_busy());
        assert_eq!(ctrl.canvas().viewport().unwrap().scale, ctrl.limits().min);
    }

    #[test]
    fn non_pdf_bytes_leave_state_alone() {
        let mut ctrl = controller(2);
        ctrl.go_to(2);
        settle(&mut ctrl);

        let err = ctrl.load(b"hello world".to_vec()).unwrap_err();
        assert!(matches!(err, ViewerError::UnsupportedFile));
        assert_eq!(ctrl.current_page(), Some(2));
        assert_eq!(ctrl.canvas().page(), Some(2));
    }

    #[test]
    fn failed_parse_keeps_previous_document() {
        let mut ctrl = controller(2);
        let mut broken = minimal_pdf_bytes();
        broken.extend_from_slice(FakeEngine::CORRUPT_MARKER);
        ctrl.load(broken).unwrap();
        let events = settle(&mut ctrl);

        assert!(events.iter().any(|e| matches!(e, ViewerEvent::LoadFailed(_))));
        assert_eq!(ctrl.page_count(), Some(2));
        assert_eq!(ctrl.canvas().text_layer_count(), 1);
    }

    #[test]
    fn rapid_navigation_settles_on_last_request() {
        let mut ctrl = controller(10);
        for _ in 0..9 {
            ctrl.next();
        }
        settle(&mut ctrl);
        assert_eq!(ctrl.current_page(), Some(10));
        assert_eq!(ctrl.canvas().page(), Some(10));
    }

    #[test]
    fn dark_mode_is_presentation_only() {
        let mut ctrl = controller(1);
        let before = ctrl.state().clone();
        ctrl.toggle_dark_mode();
        assert!(ctrl.is_dark_mode());
        assert_eq!(ctrl.state(), &before);
        assert!(!ctrl.is_busy());
    }

    #[test]
    fn selection_reads_text_layer() {
        let mut ctrl = controller(1);
        let layer = ctrl.canvas().text_layer().unwrap().clone();
        let span = &layer.spans[0];
        let mid_y = (span.y0 + span.y1) / 2.0;

        ctrl.begin_selection(SelectionPoint { x: 0.0, y: mid_y });
        ctrl.extend_selection(SelectionPoint {
            x: layer.width_px as f32,
            y: mid_y,
        });
        ctrl.finish_selection();
        assert_eq!(ctrl.selected_text().as_deref(), Some(span.text().as_str()));

        ctrl.clear_selection();
        assert_eq!(ctrl.selected_text(), None);
    }

    #[test]
    fn cell_maps_to_the_top_of_its_dot_band() {
        let mut ctrl = controller(1);
        ctrl.set_page_rect(Some(Rect::new(1, 1, 78, 22)));
        let point = ctrl.cell_to_point(3, 8).unwrap();
        assert_eq!(point, SelectionPoint { x: 2.5, y: 14.0 });
        assert!(ctrl.cell_to_point(0, 8).is_none());

        // Row 8 holds the first text line on its own
        ctrl.begin_selection(point);
        ctrl.extend_selection(ctrl.cell_to_point(71, 8).unwrap());
        ctrl.finish_selection();
        assert_eq!(ctrl.selected_text().as_deref(), Some("Page 1 line 1"));
    }

    #[test]
    fn no_engine_disables_loading() {
        let mut ctrl = DocumentController::new(None, ZoomLimits::default());
        assert!(matches!(
            ctrl.load(minimal_pdf_bytes()),
            Err(ViewerError::NoEngine)
        ));
        assert!(ctrl.poll().is_empty());
    }
}
