use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::quiz::{
    Answer, NO_TEXT_MESSAGE, QuestionKind, QuizOutcome, QuizPage, QuizPhase, QuizRequest, Verdict,
};
use crate::theme::Base16Palette;

const SOURCE_PREVIEW_CHARS: usize = 600;

#[derive(Debug, Clone, PartialEq)]
pub enum QuizPageAction {
    /// Leave the quiz page
    Back,
    /// Multiple-choice generation has to go to the backend
    Generate(QuizRequest),
    Submitted(String),
}

/// Cursor state of the quiz form
#[derive(Debug, Default)]
pub struct QuizView {
    focused: usize,
    option_cursor: usize,
}

impl QuizView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn focus(&mut self, page: &QuizPage, index: usize) {
        self.focused = index.min(page.questions().len().saturating_sub(1));
        self.option_cursor = match page.answers().get(self.focused) {
            Some(Answer::Choice(i)) => *i,
            _ => 0,
        };
    }

    pub fn handle_key(&mut self, page: &mut QuizPage, key: KeyEvent) -> Option<QuizPageAction> {
        if key.code == KeyCode::Esc {
            return Some(QuizPageAction::Back);
        }
        match page.phase().clone() {
            QuizPhase::Setup => self.handle_setup_key(page, key),
            QuizPhase::Answering => self.handle_answer_key(page, key),
            QuizPhase::Submitted(_) | QuizPhase::Failed(_) => {
                if key.code == KeyCode::Char('r') {
                    page.restart();
                    self.reset();
                }
                None
            }
            QuizPhase::NoText | QuizPhase::Loading(_) => None,
        }
    }

    fn handle_setup_key(&mut self, page: &mut QuizPage, key: KeyEvent) -> Option<QuizPageAction> {
        match key.code {
            KeyCode::Left | KeyCode::Char('-') | KeyCode::Char('h') => {
                page.set_count(page.count().saturating_sub(1));
                None
            }
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('l') => {
                page.set_count(page.count() + 1);
                None
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => {
                page.set_kind(page.kind().next());
                None
            }
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
                page.set_kind(page.kind().prev());
                None
            }
            KeyCode::Enter => {
                self.reset();
                page.start().map(QuizPageAction::Generate)
            }
            _ => None,
        }
    }

    fn handle_answer_key(&mut self, page: &mut QuizPage, key: KeyEvent) -> Option<QuizPageAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return page
                .submit()
                .map(|outcome| QuizPageAction::Submitted(outcome.message()));
        }

        let kind = page.questions().get(self.focused)?.kind;
        match key.code {
            KeyCode::Down | KeyCode::Tab => {
                self.focus(page, self.focused + 1);
                None
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.focus(page, self.focused.saturating_sub(1));
                None
            }
            _ if kind == QuestionKind::MultipleChoice => {
                self.handle_choice_key(page, key.code);
                None
            }
            KeyCode::Backspace => {
                page.backspace(self.focused);
                None
            }
            KeyCode::Enter if kind == QuestionKind::ShortAnswer => {
                page.type_char(self.focused, '\n');
                None
            }
            KeyCode::Char(c) => {
                page.type_char(self.focused, c);
                None
            }
            _ => None,
        }
    }

    fn handle_choice_key(&mut self, page: &mut QuizPage, code: KeyCode) {
        let option_count = page
            .questions()
            .get(self.focused)
            .map_or(0, |q| q.options.len());
        if option_count == 0 {
            return;
        }
        match code {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('j') => {
                self.option_cursor = (self.option_cursor + 1) % option_count;
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.option_cursor = (self.option_cursor + option_count - 1) % option_count;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                page.choose(self.focused, self.option_cursor);
            }
            KeyCode::Char(c) => {
                if let Some(digit) = c.to_digit(10).filter(|d| *d >= 1) {
                    let index = digit as usize - 1;
                    if page.choose(self.focused, index) {
                        self.option_cursor = index;
                    }
                }
            }
            _ => {}
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, page: &QuizPage, palette: &Base16Palette) {
        let block = Block::default()
            .title(" Quiz ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_0c))
            .style(Style::default().bg(palette.base_00));

        let (lines, focus_line) = self.lines(page, palette);
        let inner_height = area.height.saturating_sub(2);
        let scroll = focus_line.saturating_sub(inner_height / 3);

        f.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            area,
        );
    }

    fn lines(&self, page: &QuizPage, palette: &Base16Palette) -> (Vec<Line<'static>>, u16) {
        let muted = Style::default().fg(palette.base_03);
        let normal = Style::default().fg(palette.base_05);
        let heading = Style::default()
            .fg(palette.base_0d)
            .add_modifier(Modifier::BOLD);
        let error = Style::default()
            .fg(palette.base_08)
            .add_modifier(Modifier::BOLD);

        let mut lines = Vec::new();
        let mut focus_line = 0u16;

        match page.phase() {
            QuizPhase::NoText => {
                lines.push(Line::from(Span::styled(NO_TEXT_MESSAGE, error)));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled("Esc: back", muted)));
                return (lines, 0);
            }
            QuizPhase::Setup | QuizPhase::Loading(_) | QuizPhase::Failed(_) => {
                lines.push(Line::from(Span::styled("Selected text", heading)));
                let source = page.source_text().unwrap_or_default();
                let preview: String = source.chars().take(SOURCE_PREVIEW_CHARS).collect();
                for line in preview.lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), normal)));
                }
                if source.chars().count() > SOURCE_PREVIEW_CHARS {
                    lines.push(Line::from(Span::styled("…", muted)));
                }
                lines.push(Line::default());
            }
            QuizPhase::Answering | QuizPhase::Submitted(_) => {}
        }

        match page.phase() {
            QuizPhase::Setup => {
                lines.push(Line::from(vec![
                    Span::styled("Questions: ", heading),
                    Span::styled(format!("◀ {} ▶", page.count()), normal),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Type:      ", heading),
                    Span::styled(page.kind().label().to_string(), normal),
                ]));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "←/→ count  Tab type  Enter start  Esc back",
                    muted,
                )));
            }
            QuizPhase::Loading(_) => {
                lines.push(Line::from(Span::styled("Generating questions…", muted)));
            }
            QuizPhase::Failed(message) => {
                lines.push(Line::from(Span::styled(message.clone(), error)));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled("r: try again  Esc: back", muted)));
            }
            QuizPhase::Answering | QuizPhase::Submitted(_) => {
                let outcome = match page.phase() {
                    QuizPhase::Submitted(outcome) => Some(outcome),
                    _ => None,
                };
                for (i, question) in page.questions().iter().enumerate() {
                    let focused = outcome.is_none() && i == self.focused;
                    if focused {
                        focus_line = lines.len() as u16;
                    }
                    let marker = if focused { "▸ " } else { "  " };
                    lines.push(Line::from(vec![
                        Span::styled(marker, Style::default().fg(palette.base_0a)),
                        Span::styled(format!("{}. {}", i + 1, question.prompt), heading),
                    ]));
                    let answer = page.answers().get(i).cloned().unwrap_or_default();
                    self.answer_lines(
                        &mut lines,
                        i,
                        question.kind,
                        &question.options,
                        &answer,
                        focused,
                        outcome,
                        palette,
                    );
                    lines.push(Line::default());
                }
                match outcome {
                    Some(outcome) => {
                        let style = Style::default()
                            .fg(palette.base_0b)
                            .add_modifier(Modifier::BOLD);
                        lines.push(Line::from(Span::styled(outcome.message(), style)));
                        lines.push(Line::from(Span::styled("r: new quiz  Esc: back", muted)));
                        focus_line = lines.len() as u16;
                    }
                    None => lines.push(Line::from(Span::styled(
                        "↑/↓ question  ←/→ option  Enter choose  Ctrl+S submit",
                        muted,
                    ))),
                }
            }
            QuizPhase::NoText => {}
        }

        (lines, focus_line)
    }

    #[allow(clippy::too_many_arguments)]
    fn answer_lines(
        &self,
        lines: &mut Vec<Line<'static>>,
        index: usize,
        kind: QuestionKind,
        options: &[String],
        answer: &Answer,
        focused: bool,
        outcome: Option<&QuizOutcome>,
        palette: &Base16Palette,
    ) {
        let disabled = outcome.is_some();
        let base = if disabled {
            Style::default().fg(palette.base_03)
        } else {
            Style::default().fg(palette.base_05)
        };

        match kind {
            QuestionKind::MultipleChoice => {
                let verdict = outcome.and_then(|o| o.verdict(index));
                for (j, option) in options.iter().enumerate() {
                    let chosen = *answer == Answer::Choice(j);
                    let radio = if chosen { "(•)" } else { "( )" };
                    let (mark, style) = match verdict {
                        Some(Verdict::Correct) if chosen => {
                            (" ✓", Style::default().fg(palette.base_0b))
                        }
                        Some(Verdict::Incorrect { .. }) if chosen => {
                            (" ✗", Style::default().fg(palette.base_08))
                        }
                        Some(Verdict::Incorrect { correct: Some(c) }) if *c == j => {
                            (" ✓", Style::default().fg(palette.base_0b))
                        }
                        _ => ("", base),
                    };
                    let style = if focused && j == self.option_cursor {
                        style.bg(palette.base_02)
                    } else {
                        style
                    };
                    lines.push(Line::from(Span::styled(
                        format!("    {radio} {option}{mark}"),
                        style,
                    )));
                }
            }
            QuestionKind::OneWord | QuestionKind::ShortAnswer => {
                let text = match answer {
                    Answer::Text(t) => t.as_str(),
                    _ => "",
                };
                let cursor = if focused { "▏" } else { "" };
                let style = if focused { base.bg(palette.base_01) } else { base };
                let mut body: Vec<&str> = text.split('\n').collect();
                if kind == QuestionKind::ShortAnswer {
                    while body.len() < 3 {
                        body.push("");
                    }
                }
                let last = body.len() - 1;
                for (k, line) in body.iter().enumerate() {
                    let tail = if k == last { cursor } else { "" };
                    lines.push(Line::from(Span::styled(format!("    │ {line}{tail}"), style)));
                }
            }
        }
    }
}
