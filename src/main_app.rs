use std::io::stdout;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::EndSynchronizedUpdate;
use log::{debug, error, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::backend::{Backend, BackendDispatcher, BackendResponse};
use crate::chat::ChatPanel;
use crate::event_source::EventSource;
use crate::handoff::{HandoffSlot, SelectionHandoff};
use crate::notification::NotificationManager;
use crate::pdf::{DEFAULT_CACHE_SIZE, PdfEngine, RenderService, ScrollDirection};
use crate::quiz::{QuizPage, QuizPhase};
use crate::settings::Settings;
use crate::theme::current_theme;
use crate::widget::chat_panel::render_chat_panel;
use crate::widget::help_popup::{HelpPopup, HelpPopupAction};
use crate::widget::hud_message;
use crate::widget::pdf_reader::{DocumentController, ViewerError, ViewerEvent, render_page};
use crate::widget::quiz_page::{QuizPageAction, QuizView};
use crate::widget::selection_menu::{SelectionMenu, SelectionMenuAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Which full-screen page is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Viewer,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPanel {
    Viewer,
    Chat,
}

pub struct App {
    settings: Settings,
    viewer: DocumentController,
    chat: ChatPanel,
    quiz: QuizPage,
    quiz_view: QuizView,
    menu: SelectionMenu,
    help_popup: Option<HelpPopup>,
    dispatcher: BackendDispatcher,
    handoff: HandoffSlot,
    pub notifications: NotificationManager,
    view: View,
    pub focused_panel: FocusedPanel,
    terminal_size: Rect,
    viewer_area: Option<Rect>,
    chat_area: Option<Rect>,
    dragging: bool,
}

impl App {
    /// Build the app around a PDF engine (if this build has one) and an
    /// assistant backend
    pub fn new(
        settings: Settings,
        engine: Option<Box<dyn PdfEngine>>,
        backend: Box<dyn Backend>,
        handoff: HandoffSlot,
    ) -> Self {
        let service = engine.map(|e| RenderService::with_cache_size(e, DEFAULT_CACHE_SIZE));
        let viewer = DocumentController::new(service, settings.zoom_limits());
        let quiz = QuizPage::new(settings.question_count());

        Self {
            viewer,
            chat: ChatPanel::new(),
            quiz,
            quiz_view: QuizView::new(),
            menu: SelectionMenu::new(),
            help_popup: None,
            dispatcher: BackendDispatcher::new(backend),
            handoff,
            notifications: NotificationManager::new(),
            view: View::Viewer,
            focused_panel: FocusedPanel::Viewer,
            terminal_size: Rect::default(),
            viewer_area: None,
            chat_area: None,
            dragging: false,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn viewer(&self) -> &DocumentController {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut DocumentController {
        &mut self.viewer
    }

    pub fn chat(&self) -> &ChatPanel {
        &self.chat
    }

    pub fn quiz(&self) -> &QuizPage {
        &self.quiz
    }

    pub fn menu(&self) -> &SelectionMenu {
        &self.menu
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn handoff(&self) -> &HandoffSlot {
        &self.handoff
    }

    pub fn is_help_open(&self) -> bool {
        self.help_popup.is_some()
    }

    /// Open a file from disk. Failures go to the HUD and leave the current
    /// document in place.
    pub fn open_file(&mut self, path: &Path) -> Result<(), ViewerError> {
        info!("Opening {}", path.display());
        let result = self.viewer.load_path(path);
        self.report_load(result)
    }

    pub fn open_bytes(&mut self, bytes: Vec<u8>) -> Result<(), ViewerError> {
        let result = self.viewer.load(bytes);
        self.report_load(result)
    }

    fn report_load(&mut self, result: Result<(), ViewerError>) -> Result<(), ViewerError> {
        if let Err(e) = &result {
            warn!("Could not open document: {e}");
            self.notifications.error(e.to_string());
        }
        result
    }

    /// Switch to the quiz page and consume whatever the hand-off holds
    pub fn open_quiz_from_handoff(&mut self) {
        let record = match self.handoff.take() {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to read quiz hand-off: {e}");
                None
            }
        };
        self.open_quiz(record);
    }

    fn open_quiz(&mut self, record: Option<SelectionHandoff>) {
        self.menu.dismiss();
        self.quiz.open(record);
        self.quiz_view.reset();
        self.view = View::Quiz;
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) => self.handle_key_event(*key),
            Event::Mouse(mouse) => {
                self.handle_mouse_event(*mouse);
                None
            }
            Event::Resize(cols, rows) => {
                debug!("Terminal resized to {cols}x{rows}");
                self.menu.dismiss();
                None
            }
            _ => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(AppAction::Quit);
        }

        if let Some(help) = self.help_popup.as_mut() {
            if let Some(HelpPopupAction::Close) = help.handle_key(key) {
                self.help_popup = None;
            }
            return None;
        }

        if self.menu.is_visible() {
            if let Some(action) = self.menu.handle_key(key) {
                self.handle_menu_action(action);
            }
            return None;
        }

        match self.view {
            View::Quiz => {
                if let Some(action) = self.quiz_view.handle_key(&mut self.quiz, key) {
                    self.handle_quiz_action(action);
                }
                None
            }
            View::Viewer if self.focused_panel == FocusedPanel::Chat => {
                self.handle_chat_key(key);
                None
            }
            View::Viewer => self.handle_viewer_key(key),
        }
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('?') => self.help_popup = Some(HelpPopup::new()),
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => self.viewer.next(),
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => self.viewer.prev(),
            KeyCode::Char('g') | KeyCode::Home => self.viewer.go_to(1),
            KeyCode::Char('G') | KeyCode::End => {
                if let Some(last) = self.viewer.page_count() {
                    self.viewer.go_to(last);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewer.zoom_in(),
            KeyCode::Char('-') => self.viewer.zoom_out(),
            KeyCode::Char('d') => self.viewer.toggle_dark_mode(),
            KeyCode::Char('j') | KeyCode::Down => self.viewer.scroll(ScrollDirection::Down),
            KeyCode::Char('k') | KeyCode::Up => self.viewer.scroll(ScrollDirection::Up),
            KeyCode::Char('h') => self.viewer.scroll(ScrollDirection::Left),
            KeyCode::Char('l') => self.viewer.scroll(ScrollDirection::Right),
            KeyCode::Char('c') => {
                self.chat.toggle();
                if self.chat.is_open() {
                    self.focused_panel = FocusedPanel::Chat;
                }
            }
            KeyCode::Tab if self.chat.is_open() => self.focused_panel = FocusedPanel::Chat,
            KeyCode::Esc => self.viewer.clear_selection(),
            _ => {}
        }
        None
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc | KeyCode::Tab => self.focused_panel = FocusedPanel::Viewer,
            KeyCode::Enter => {
                if let Some(ticket) = self.chat.submit_input() {
                    self.dispatcher.ask(ticket);
                }
            }
            KeyCode::Backspace => self.chat.pop_input(),
            KeyCode::Up if ctrl => self.chat.scroll_up(3),
            KeyCode::Down if ctrl => self.chat.scroll_down(3),
            KeyCode::Up => self.chat.scroll_up(1),
            KeyCode::Down => self.chat.scroll_down(1),
            KeyCode::PageUp => self.chat.scroll_up(10),
            KeyCode::PageDown => self.chat.scroll_down(10),
            KeyCode::Char(c) if !ctrl => self.chat.push_input(c),
            _ => {}
        }
    }

    fn handle_quiz_action(&mut self, action: QuizPageAction) {
        match action {
            QuizPageAction::Back => {
                self.view = View::Viewer;
            }
            QuizPageAction::Generate(request) => {
                info!(
                    "Requesting {} {} questions",
                    request.count,
                    request.kind.wire_name()
                );
                self.dispatcher.generate_quiz(request);
            }
            QuizPageAction::Submitted(message) => {
                info!("Quiz submitted: {message}");
            }
        }
    }

    pub fn handle_menu_action(&mut self, action: SelectionMenuAction) {
        match action {
            SelectionMenuAction::Close => self.viewer.clear_selection(),
            SelectionMenuAction::Explain(text) => {
                let prompt = self.settings.explain_prompt.clone();
                let ticket = self.chat.send_with_context(&text, &prompt);
                self.dispatcher.ask(ticket);
                self.viewer.clear_selection();
            }
            SelectionMenuAction::GenerateQuiz(text) => {
                self.viewer.clear_selection();
                match self.handoff.store(&text) {
                    Ok(()) => self.open_quiz_from_handoff(),
                    Err(e) => {
                        error!("Failed to store quiz hand-off: {e}");
                        self.open_quiz(Some(SelectionHandoff {
                            text,
                            created_at: Utc::now(),
                        }));
                    }
                }
            }
        }
    }

    fn in_viewer(&self, column: u16, row: u16) -> bool {
        self.viewer_area
            .is_some_and(|a| a.contains(ratatui::layout::Position::new(column, row)))
    }

    fn in_chat(&self, column: u16, row: u16) -> bool {
        self.chat_area
            .is_some_and(|a| a.contains(ratatui::layout::Position::new(column, row)))
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);

        if self.help_popup.is_some() || self.view != View::Viewer {
            return;
        }

        if self.menu.is_visible() {
            match mouse.kind {
                // Re-open at the new pointer with the same selection
                MouseEventKind::Down(MouseButton::Right)
                    if self.menu.is_outside_popup_area(column, row) =>
                {
                    self.menu.dismiss();
                }
                MouseEventKind::Down(_) => {
                    if let Some(action) = self.menu.handle_mouse_click(column, row) {
                        self.handle_menu_action(action);
                    }
                    return;
                }
                _ => {}
            }
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Right) if self.in_viewer(column, row) => {
                self.dragging = false;
                let text = self.viewer.selected_text();
                if self.menu.open_at(text, column, row, self.terminal_size) {
                    debug!("Selection menu opened at {column},{row}");
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if self.in_chat(column, row) {
                    self.focused_panel = FocusedPanel::Chat;
                    return;
                }
                if !self.in_viewer(column, row) {
                    return;
                }
                self.focused_panel = FocusedPanel::Viewer;
                match self.viewer.cell_to_point(column, row) {
                    Some(point) => {
                        self.viewer.begin_selection(point);
                        self.dragging = true;
                    }
                    None => self.viewer.clear_selection(),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                if let Some(point) = self.viewer.cell_to_point(column, row) {
                    self.viewer.extend_selection(point);
                }
            }
            MouseEventKind::Up(MouseButton::Left) if self.dragging => {
                if let Some(point) = self.viewer.cell_to_point(column, row) {
                    self.viewer.extend_selection(point);
                }
                self.viewer.finish_selection();
                self.dragging = false;
            }
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let down = matches!(mouse.kind, MouseEventKind::ScrollDown);
                if self.in_chat(column, row) {
                    if down {
                        self.chat.scroll_down(1);
                    } else {
                        self.chat.scroll_up(1);
                    }
                } else if self.in_viewer(column, row) {
                    let direction = if down {
                        ScrollDirection::Down
                    } else {
                        ScrollDirection::Up
                    };
                    self.viewer.scroll(direction);
                }
            }
            MouseEventKind::ScrollLeft if self.in_viewer(column, row) => {
                self.viewer.scroll(ScrollDirection::Left);
            }
            MouseEventKind::ScrollRight if self.in_viewer(column, row) => {
                self.viewer.scroll(ScrollDirection::Right);
            }
            _ => {}
        }
    }

    /// Apply finished background work. Returns true when something changed
    /// on screen.
    pub fn tick(&mut self) -> bool {
        let viewer_events = self.viewer.poll();
        let responses = self.dispatcher.poll();
        let changed = !viewer_events.is_empty() || !responses.is_empty();
        self.apply_viewer_events(viewer_events);
        self.apply_backend_responses(responses);
        self.notifications.update() || changed
    }

    fn apply_viewer_events(&mut self, events: Vec<ViewerEvent>) {
        for event in events {
            match event {
                ViewerEvent::Loaded { page_count, title } => {
                    let name = title.unwrap_or_else(|| "document".to_string());
                    self.notifications
                        .info(format!("Opened {name} ({page_count} pages)"));
                }
                ViewerEvent::LoadFailed(message) => {
                    self.notifications
                        .error(format!("Could not open PDF: {message}"));
                }
                ViewerEvent::RenderFailed { page, message } => {
                    self.notifications
                        .error(format!("Could not render page {page}: {message}"));
                }
                ViewerEvent::PageShown { page } => debug!("Page {page} on screen"),
            }
        }
    }

    fn apply_backend_responses(&mut self, responses: Vec<BackendResponse>) {
        for response in responses {
            match response {
                BackendResponse::Reply { id, result } => {
                    if !self.chat.resolve(id, result) {
                        debug!("Reply {id:?} has no placeholder");
                    }
                }
                BackendResponse::Quiz { session, result } => {
                    self.quiz.on_generated(session, result);
                    if *self.quiz.phase() == QuizPhase::Answering {
                        self.quiz_view.reset();
                    }
                }
            }
        }
    }

    /// Block until renders and backend requests in flight have finished,
    /// or `timeout` passes
    pub fn wait_for_background(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let viewer_events = self.viewer.poll_timeout(Duration::from_millis(10));
            let responses = self.dispatcher.poll_timeout(Duration::from_millis(10));
            self.apply_viewer_events(viewer_events);
            self.apply_backend_responses(responses);
            if !self.viewer.is_busy() && self.dispatcher.outstanding() == 0 {
                break;
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        self.terminal_size = f.area();

        let background_block = Block::default().style(Style::default().bg(palette.base_00));
        f.render_widget(background_block, f.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.view {
            View::Viewer => self.draw_viewer(f, chunks[0]),
            View::Quiz => {
                self.viewer_area = None;
                self.chat_area = None;
                self.quiz_view.render(f, chunks[0], &self.quiz, palette);
            }
        }

        match self.notifications.current() {
            Some(notification) => hud_message::render(f, chunks[1], notification, palette),
            None => self.draw_status_bar(f, chunks[1]),
        }

        self.menu.render(f);

        if let Some(help) = self.help_popup.as_mut() {
            let area = f.area();
            help.render(f, area);
        }
    }

    fn draw_viewer(&mut self, f: &mut Frame, area: Rect) {
        let palette = current_theme();
        let (viewer_rect, chat_rect) = if self.chat.is_open() {
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
                .split(area);
            (split[0], Some(split[1]))
        } else {
            (area, None)
        };

        let viewer_focused = self.focused_panel == FocusedPanel::Viewer;
        let (_, border, bg) = palette.get_panel_colors(viewer_focused);
        let title = match self.viewer.title() {
            Some(title) => format!(" {title} "),
            None => " pdfmentor ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(bg));
        let inner = block.inner(viewer_rect);
        f.render_widget(block, viewer_rect);
        render_page(f, inner, &mut self.viewer, palette);
        self.viewer_area = Some(inner);

        self.chat_area = chat_rect;
        if let Some(rect) = chat_rect {
            let focused = self.focused_panel == FocusedPanel::Chat;
            render_chat_panel(f, rect, &mut self.chat, focused, palette);
        }
    }

    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let palette = current_theme();
        let mut parts = Vec::new();
        match self.view {
            View::Viewer => {
                if let (Some(page), Some(count)) =
                    (self.viewer.current_page(), self.viewer.page_count())
                {
                    parts.push(format!("page {page}/{count}"));
                }
                if let Some(scale) = self.viewer.scale() {
                    parts.push(format!("{:.0}%", scale * 100.0));
                }
                if self.viewer.is_dark_mode() {
                    parts.push("dark".to_string());
                }
                if self.chat.pending_replies() > 0 {
                    parts.push("assistant is typing".to_string());
                }
                parts.push("?: help".to_string());
            }
            View::Quiz => parts.push("Esc: back to the page".to_string()),
        }
        let line = Line::from(Span::styled(
            format!(" {}", parts.join(" · ")),
            Style::default().fg(palette.base_04).bg(palette.base_01),
        ));
        f.render_widget(
            Paragraph::new(line).style(Style::default().bg(palette.base_01)),
            area,
        );
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(&event) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        if should_quit {
            return Ok(());
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if last_tick.elapsed() >= tick_rate {
            needs_redraw |= app.tick();
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            let _ = execute!(stdout(), EndSynchronizedUpdate);
        }

        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}
