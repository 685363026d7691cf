use crate::theme::current_theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

const ITEMS: [&str; 2] = ["Explain", "Generate quiz"];
const MENU_WIDTH: u16 = 19;
const MENU_HEIGHT: u16 = ITEMS.len() as u16 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMenuAction {
    Close,
    Explain(String),
    GenerateQuiz(String),
}

/// Context menu shown on right-click over selected page text
#[derive(Default)]
pub struct SelectionMenu {
    text: Option<String>,
    state: ListState,
    popup_area: Option<Rect>,
}

impl SelectionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.popup_area.is_some()
    }

    pub fn popup_area(&self) -> Option<Rect> {
        self.popup_area
    }

    pub fn stored_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Show the menu at the pointer for `selection`. Without selected text
    /// any open menu is hidden and nothing is shown.
    pub fn open_at(&mut self, selection: Option<String>, column: u16, row: u16, frame: Rect) -> bool {
        match selection.filter(|t| !t.trim().is_empty()) {
            Some(text) => {
                self.text = Some(text);
                self.state.select(Some(0));
                self.popup_area = Some(menu_rect(column, row, frame));
                true
            }
            None => {
                self.dismiss();
                false
            }
        }
    }

    /// Hide the menu and forget the stored selection
    pub fn dismiss(&mut self) {
        self.text = None;
        self.popup_area = None;
        self.state.select(None);
    }

    pub fn render(&mut self, f: &mut Frame) {
        let Some(area) = self.popup_area else {
            return;
        };
        let area = area.intersection(f.area());
        let palette = current_theme();

        f.render_widget(Clear, area);

        let items: Vec<ListItem> = ITEMS
            .iter()
            .map(|item| {
                ListItem::new(Line::from(Span::styled(
                    *item,
                    Style::default().fg(palette.base_05),
                )))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .highlight_style(
                Style::default()
                    .bg(palette.base_02)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("» ");

        f.render_stateful_widget(list, area, &mut self.state);
    }

    fn move_down(&mut self) {
        let i = match self.state.selected() {
            Some(i) if i + 1 < ITEMS.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    fn move_up(&mut self) {
        let i = match self.state.selected() {
            Some(0) | None => ITEMS.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn activate(&mut self, index: usize) -> Option<SelectionMenuAction> {
        let text = self.text.take()?;
        self.dismiss();
        match index {
            0 => Some(SelectionMenuAction::Explain(text)),
            1 => Some(SelectionMenuAction::GenerateQuiz(text)),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SelectionMenuAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_up();
                None
            }
            KeyCode::Enter => {
                let index = self.state.selected().unwrap_or(0);
                self.activate(index)
            }
            KeyCode::Esc => {
                self.dismiss();
                Some(SelectionMenuAction::Close)
            }
            _ => None,
        }
    }

    /// A click on an item activates it; anywhere else closes the menu
    pub fn handle_mouse_click(&mut self, x: u16, y: u16) -> Option<SelectionMenuAction> {
        let area = self.popup_area?;
        if self.is_outside_popup_area(x, y) {
            self.dismiss();
            return Some(SelectionMenuAction::Close);
        }
        if y > area.y && y < area.y + area.height - 1 {
            let index = (y - area.y - 1) as usize;
            if index < ITEMS.len() {
                return self.activate(index);
            }
        }
        None
    }

    pub fn is_outside_popup_area(&self, x: u16, y: u16) -> bool {
        match self.popup_area {
            Some(popup_area) => {
                x < popup_area.x
                    || x >= popup_area.x + popup_area.width
                    || y < popup_area.y
                    || y >= popup_area.y + popup_area.height
            }
            None => true,
        }
    }
}

/// Menu box with its top-left corner at the pointer, shifted back inside
/// the frame when it would overflow
pub fn menu_rect(column: u16, row: u16, frame: Rect) -> Rect {
    let width = MENU_WIDTH.min(frame.width);
    let height = MENU_HEIGHT.min(frame.height);
    let max_x = frame.x + frame.width - width;
    let max_y = frame.y + frame.height - height;
    Rect::new(
        column.clamp(frame.x, max_x),
        row.clamp(frame.y, max_y),
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    const FRAME: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 24,
    };

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn no_selection_never_shows() {
        let mut menu = SelectionMenu::new();
        assert!(!menu.open_at(None, 5, 5, FRAME));
        assert!(!menu.open_at(Some("  \n".into()), 5, 5, FRAME));
        assert!(!menu.is_visible());
    }

    #[test]
    fn empty_selection_hides_open_menu() {
        let mut menu = SelectionMenu::new();
        menu.open_at(Some("cell wall".into()), 5, 5, FRAME);
        assert!(menu.is_visible());
        menu.open_at(None, 6, 6, FRAME);
        assert!(!menu.is_visible());
        assert_eq!(menu.stored_text(), None);
    }

    #[test]
    fn menu_opens_at_pointer_and_stays_in_frame() {
        let mut menu = SelectionMenu::new();
        menu.open_at(Some("text".into()), 10, 3, FRAME);
        assert_eq!(menu.popup_area().map(|a| (a.x, a.y)), Some((10, 3)));

        let corner = menu_rect(79, 23, FRAME);
        assert_eq!(corner.right(), 80);
        assert_eq!(corner.bottom(), 24);
    }

    #[test]
    fn keyboard_activation() {
        let mut menu = SelectionMenu::new();
        menu.open_at(Some("osmosis".into()), 1, 1, FRAME);
        menu.handle_key(key(KeyCode::Char('j')));
        assert_eq!(
            menu.handle_key(key(KeyCode::Enter)),
            Some(SelectionMenuAction::GenerateQuiz("osmosis".into()))
        );
        assert!(!menu.is_visible());

        menu.open_at(Some("osmosis".into()), 1, 1, FRAME);
        assert_eq!(menu.handle_key(key(KeyCode::Esc)), Some(SelectionMenuAction::Close));
        assert_eq!(menu.stored_text(), None);
    }

    #[test]
    fn clicks_activate_or_dismiss() {
        let mut menu = SelectionMenu::new();
        menu.open_at(Some("enzyme".into()), 10, 5, FRAME);
        assert_eq!(
            menu.handle_mouse_click(12, 6),
            Some(SelectionMenuAction::Explain("enzyme".into()))
        );

        menu.open_at(Some("enzyme".into()), 10, 5, FRAME);
        assert_eq!(menu.handle_mouse_click(0, 0), Some(SelectionMenuAction::Close));
        assert!(!menu.is_visible());
        assert_eq!(menu.stored_text(), None);
    }
}
