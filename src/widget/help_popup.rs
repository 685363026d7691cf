use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::theme::current_theme;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Reading",
        &[
            ("n / → / PgDn", "next page"),
            ("p / ← / PgUp", "previous page"),
            ("g / G", "first / last page"),
            ("+ / -", "zoom in / out"),
            ("d", "toggle dark mode"),
            ("h j k l / wheel", "pan the page"),
        ],
    ),
    (
        "Selection",
        &[
            ("left drag", "select text"),
            ("right click", "Explain / Generate quiz"),
            ("Esc", "clear selection"),
        ],
    ),
    (
        "Assistant",
        &[
            ("c", "show / hide chat"),
            ("Tab", "focus chat input"),
            ("Enter", "send message"),
            ("Ctrl+↑ / Ctrl+↓", "scroll transcript"),
        ],
    ),
    (
        "Quiz",
        &[
            ("←/→  Tab", "question count / type"),
            ("Enter", "start or choose option"),
            ("1-4", "choose option"),
            ("Ctrl+S", "submit answers"),
            ("r", "new quiz"),
            ("Esc", "back to the page"),
        ],
    ),
    ("General", &[("?", "this help"), ("q / Ctrl+C", "quit")]),
];

const KEY_COLUMN: usize = 18;

pub enum HelpPopupAction {
    Close,
}

#[derive(Default)]
pub struct HelpPopup {
    scroll_offset: usize,
    last_popup_area: Option<Rect>,
}

fn help_lines() -> Vec<Line<'static>> {
    let palette = current_theme();
    let mut lines = Vec::new();
    for (title, bindings) in SECTIONS {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            format!("  {title}"),
            Style::default()
                .fg(palette.base_0d)
                .add_modifier(Modifier::BOLD),
        )));
        for (keys, action) in *bindings {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("    {keys:<KEY_COLUMN$}"),
                    Style::default().fg(palette.base_0a),
                ),
                Span::styled(*action, Style::default().fg(palette.base_05)),
            ]));
        }
    }
    lines
}

impl HelpPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let palette = current_theme();
        let lines = help_lines();
        let width = lines.iter().map(Line::width).max().unwrap_or(40) + 4;

        let popup_area = content_sized_rect(width as u16, 90, area);
        self.last_popup_area = Some(popup_area);
        f.render_widget(Clear, popup_area);

        let visible: Vec<Line> = lines.into_iter().skip(self.scroll_offset).collect();
        let paragraph = Paragraph::new(visible).block(
            Block::default()
                .title(" Help - Press ? or ESC to close ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0c))
                .style(Style::default().bg(palette.base_00)),
        );
        f.render_widget(paragraph, popup_area);
    }

    pub fn scroll_down(&mut self) {
        let max_lines = help_lines().len();
        if self.scroll_offset < max_lines.saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<HelpPopupAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_up();
                None
            }
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                Some(HelpPopupAction::Close)
            }
            _ => None,
        }
    }
}

fn content_sized_rect(width: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let width = width.min(r.width);
    let margin = r.width.saturating_sub(width) / 2;

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(width),
            Constraint::Length(margin),
        ])
        .split(popup_layout[1])[1]
}
