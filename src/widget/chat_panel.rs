use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::chat::{ChatMessage, ChatPanel, Role};
use crate::theme::Base16Palette;

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Bot => "Assistant",
        Role::Context => "Selection",
    }
}

/// Wrap every message to `width` columns with a blank line between them
pub fn transcript_lines(
    messages: &[ChatMessage],
    width: u16,
    palette: &Base16Palette,
) -> Vec<Line<'static>> {
    let width = usize::from(width.max(8));
    let mut lines = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        let (label_style, body_style) = match message.role {
            Role::User => (
                Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD),
                Style::default().fg(palette.base_06),
            ),
            Role::Bot => (
                Style::default().fg(palette.base_0b).add_modifier(Modifier::BOLD),
                Style::default().fg(palette.base_05),
            ),
            Role::Context => (
                Style::default().fg(palette.base_0e).add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(palette.base_04)
                    .add_modifier(Modifier::ITALIC),
            ),
        };
        let body_style = if message.placeholder {
            body_style.fg(palette.base_03).add_modifier(Modifier::ITALIC)
        } else {
            body_style
        };

        lines.push(Line::from(Span::styled(role_label(message.role), label_style)));
        for wrapped in textwrap::wrap(&message.text, width) {
            lines.push(Line::from(Span::styled(wrapped.into_owned(), body_style)));
        }
    }
    lines
}

pub fn render_chat_panel(
    f: &mut Frame,
    area: Rect,
    chat: &mut ChatPanel,
    focused: bool,
    palette: &Base16Palette,
) {
    f.render_widget(Clear, area);
    let (_, border, bg) = palette.get_panel_colors(focused);

    let block = Block::default()
        .title(" Assistant ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let lines = transcript_lines(chat.messages(), chunks[0].width, palette);
    let visible = usize::from(chunks[0].height);
    chat.clamp_scroll(lines.len(), visible);
    let top = lines
        .len()
        .saturating_sub(visible)
        .saturating_sub(chat.scroll_back());
    let shown: Vec<Line> = lines.into_iter().skip(top).take(visible).collect();
    f.render_widget(Paragraph::new(shown), chunks[0]);

    // Keep the tail of the input visible when it is wider than the panel
    let input = chat.input();
    let room = usize::from(chunks[1].width.saturating_sub(2));
    let mut tail = input;
    while tail.width() > room {
        let mut chars = tail.chars();
        chars.next();
        tail = chars.as_str();
    }
    let prompt_style = if focused {
        Style::default().fg(palette.base_0a)
    } else {
        Style::default().fg(palette.base_03)
    };
    let input_line = Line::from(vec![
        Span::styled("> ", prompt_style),
        Span::styled(tail.to_string(), Style::default().fg(palette.base_06)),
    ]);
    f.render_widget(Paragraph::new(input_line), chunks[1]);

    if focused {
        let cursor_x = chunks[1].x + 2 + tail.width() as u16;
        f.set_cursor_position((cursor_x.min(chunks[1].right().saturating_sub(1)), chunks[1].y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::current_theme;

    #[test]
    fn messages_wrap_under_their_label() {
        let mut chat = ChatPanel::new();
        chat.send_with_context("a rather long passage of selected text", "Explain this:");
        let lines = transcript_lines(chat.messages(), 12, current_theme());

        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "Selection");
        assert!(text.iter().all(|l| l.width() <= 12));
        assert!(text.contains(&"You".to_string()));
        assert_eq!(text.last().map(String::as_str), Some("Thinking…"));
    }
}
