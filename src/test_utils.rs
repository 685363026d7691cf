//! Fakes and helpers for unit and integration tests

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::backend::{Backend, BackendError};
use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
use crate::pdf::{Bitmap, CharInfo, PageSize, PdfDocument, PdfEngine, PdfError, TextRun, Viewport};
use crate::quiz::{QuestionKind, QuizQuestion};
use crate::widget::pdf_reader::{DocumentController, ViewerEvent};

/// Smallest byte string that passes the PDF header check
pub fn minimal_pdf_bytes() -> Vec<u8> {
    b"%PDF-1.7\n%fake document\n".to_vec()
}

/// Drive the controller until its render worker is idle
pub fn settle(ctrl: &mut DocumentController) -> Vec<ViewerEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    loop {
        events.extend(ctrl.poll_timeout(Duration::from_millis(20)));
        if !ctrl.is_busy() || Instant::now() > deadline {
            return events;
        }
    }
}

/// Letter-sized pages with a few lines of known text each
#[derive(Debug, Clone)]
pub struct FakeEngine {
    pages: Vec<Vec<String>>,
}

impl FakeEngine {
    /// Bytes containing this marker fail to parse
    pub const CORRUPT_MARKER: &'static [u8] = b"%%CORRUPT%%";
    pub const PAGE_SIZE: PageSize = PageSize::new(612.0, 792.0);
    pub const MARGIN: f32 = 72.0;
    pub const LINE_PITCH: f32 = 24.0;
    pub const LINE_HEIGHT: f32 = 12.0;
    pub const CHAR_ADVANCE: f32 = 6.0;

    pub fn with_pages(count: usize) -> Self {
        let pages = (1..=count)
            .map(|p| (1..=3).map(|l| format!("Page {p} line {l}")).collect())
            .collect();
        Self { pages }
    }

    pub fn with_text(pages: Vec<Vec<String>>) -> Self {
        Self { pages }
    }
}

impl PdfEngine for FakeEngine {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, PdfError> {
        if bytes
            .windows(Self::CORRUPT_MARKER.len())
            .any(|w| w == Self::CORRUPT_MARKER)
        {
            return Err(PdfError::generic("corrupt xref table"));
        }
        if self.pages.is_empty() {
            return Err(PdfError::Empty);
        }
        Ok(Box::new(FakeDocument {
            pages: self.pages.clone(),
        }))
    }
}

struct FakeDocument {
    pages: Vec<Vec<String>>,
}

impl FakeDocument {
    fn runs(&self, page: usize) -> Vec<TextRun> {
        self.pages[page - 1]
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let y0 = FakeEngine::MARGIN + i as f32 * FakeEngine::LINE_PITCH;
                let chars: Vec<CharInfo> = line
                    .chars()
                    .enumerate()
                    .map(|(j, c)| CharInfo {
                        x: FakeEngine::MARGIN + j as f32 * FakeEngine::CHAR_ADVANCE,
                        c,
                    })
                    .collect();
                TextRun {
                    x0: FakeEngine::MARGIN,
                    y0,
                    x1: FakeEngine::MARGIN + chars.len() as f32 * FakeEngine::CHAR_ADVANCE,
                    y1: y0 + FakeEngine::LINE_HEIGHT,
                    chars,
                }
            })
            .collect()
    }
}

impl PdfDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, _page: usize) -> Result<PageSize, PdfError> {
        Ok(FakeEngine::PAGE_SIZE)
    }

    fn rasterize(&self, page: usize, viewport: &Viewport) -> Result<Bitmap, PdfError> {
        crate::pdf::check_page(self, page)?;
        let mut bitmap = Bitmap::blank(viewport.width_px, viewport.height_px);
        let mag = viewport.mag();
        for run in self.runs(page) {
            let (x0, x1) = ((run.x0 * mag) as u32, (run.x1 * mag) as u32);
            let (y0, y1) = ((run.y0 * mag) as u32, (run.y1 * mag) as u32);
            for y in y0..y1.min(bitmap.height_px) {
                for x in x0..x1.min(bitmap.width_px) {
                    if let Some(px) = bitmap
                        .offset(x, y)
                        .and_then(|idx| bitmap.pixels.get_mut(idx..idx + 3))
                    {
                        px.copy_from_slice(&[0x20, 0x20, 0x20]);
                    }
                }
            }
        }
        Ok(bitmap)
    }

    fn text_runs(&self, page: usize) -> Result<Vec<TextRun>, PdfError> {
        crate::pdf::check_page(self, page)?;
        Ok(self.runs(page))
    }

    fn title(&self) -> Option<String> {
        Some("Fake Document".to_string())
    }
}

/// Prompt and context of one `ask` call
pub type AskCall = (String, Option<String>);

/// Backend with canned answers that records what it was asked
#[derive(Clone)]
pub struct ScriptedBackend {
    reply: Option<String>,
    quiz: Option<Vec<QuizQuestion>>,
    calls: Arc<Mutex<Vec<AskCall>>>,
}

impl ScriptedBackend {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            quiz: None,
            calls: Arc::default(),
        }
    }

    /// Every call fails as if the service were down
    pub fn failing() -> Self {
        Self {
            reply: None,
            quiz: None,
            calls: Arc::default(),
        }
    }

    pub fn with_quiz(mut self, questions: Vec<QuizQuestion>) -> Self {
        self.quiz = Some(questions);
        self
    }

    /// Shared log of `ask` calls, usable after the backend moved to a thread
    pub fn calls(&self) -> Arc<Mutex<Vec<AskCall>>> {
        Arc::clone(&self.calls)
    }
}

impl Backend for ScriptedBackend {
    fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((prompt.to_string(), context.map(str::to_string)));
        }
        self.reply
            .clone()
            .ok_or_else(|| BackendError::Network("connection refused".into()))
    }

    fn generate_quiz(
        &self,
        _text: &str,
        _count: usize,
        _kind: QuestionKind,
    ) -> Result<Vec<QuizQuestion>, BackendError> {
        self.quiz.clone().ok_or(BackendError::Status(500))
    }
}

/// Three keyed questions whose answers are the first, second and third option
pub fn keyed_questions() -> Vec<QuizQuestion> {
    ["A", "B", "C"]
        .iter()
        .enumerate()
        .map(|(i, key)| {
            QuizQuestion::multiple_choice(
                format!("Question {}", i + 1),
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                Some((*key).to_string()),
            )
        })
        .collect()
}

pub mod test_helpers {
    use super::*;
    use crossterm::event::MouseEventKind;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_enter(self) -> Self {
            self.press_key(KeyCode::Enter)
        }

        pub fn press_esc(self) -> Self {
            self.press_key(KeyCode::Esc)
        }

        pub fn press_tab(self) -> Self {
            self.press_key(KeyCode::Tab)
        }

        /// Type each character of `text`
        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        pub fn left_click(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::left_down(column, row));
            self.events.push(SimulatedEventSource::left_up(column, row));
            self
        }

        /// Press at `from`, drag to `to` and release
        pub fn drag(mut self, from: (u16, u16), to: (u16, u16)) -> Self {
            self.events.push(SimulatedEventSource::left_down(from.0, from.1));
            self.events.push(SimulatedEventSource::left_drag(to.0, to.1));
            self.events.push(SimulatedEventSource::left_up(to.0, to.1));
            self
        }

        pub fn right_click(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::right_click(column, row));
            self
        }

        pub fn scroll_down(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_event(
                MouseEventKind::ScrollDown,
                column,
                row,
            ));
            self
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn len(&self) -> usize {
            self.events.len()
        }

        pub fn is_empty(&self) -> bool {
            self.events.is_empty()
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).expect("test backend terminal")
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn scenario_builder_counts_events() {
        let scenario = TestScenarioBuilder::new()
            .press_char('n')
            .drag((10, 7), (30, 7))
            .right_click(12, 7)
            .press_enter()
            .quit();
        assert_eq!(scenario.len(), 7);
    }

    #[test]
    fn fake_engine_rejects_marked_bytes() {
        let mut bytes = minimal_pdf_bytes();
        bytes.extend_from_slice(FakeEngine::CORRUPT_MARKER);
        assert!(FakeEngine::with_pages(1).open(&bytes).is_err());
        assert!(FakeEngine::with_pages(0).open(&minimal_pdf_bytes()).is_err());
        assert_eq!(
            FakeEngine::with_pages(2)
                .open(&minimal_pdf_bytes())
                .unwrap()
                .page_count(),
            2
        );
    }
}
