use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::notification::{Notification, NotificationLevel};
use crate::theme::Base16Palette;

pub fn styled_line(notification: &Notification, palette: &Base16Palette) -> Line<'static> {
    let style = match notification.level {
        NotificationLevel::Info => Style::default()
            .fg(palette.base_06)
            .bg(palette.base_02)
            .add_modifier(Modifier::BOLD),
        NotificationLevel::Warning => Style::default()
            .fg(palette.base_00)
            .bg(palette.base_0a)
            .add_modifier(Modifier::BOLD),
        NotificationLevel::Error => Style::default()
            .fg(palette.base_07)
            .bg(palette.base_08)
            .add_modifier(Modifier::BOLD),
    };

    Line::from(vec![Span::styled(
        format!(" {} ", notification.message),
        style,
    )])
    .centered()
}

/// Draw the HUD on the given one-line area
pub fn render(f: &mut Frame, area: Rect, notification: &Notification, palette: &Base16Palette) {
    f.render_widget(Paragraph::new(styled_line(notification, palette)), area);
}
