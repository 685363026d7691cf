use anyhow::Result;
pub use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real terminal event source using crossterm
pub struct TerminalEventSource;

impl EventSource for TerminalEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Simulated event source for testing
pub struct SimulatedEventSource {
    events: Vec<Event>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: crossterm::event::KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    pub fn ctrl_char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn mouse_event(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    pub fn left_down(column: u16, row: u16) -> Event {
        Self::mouse_event(MouseEventKind::Down(MouseButton::Left), column, row)
    }

    pub fn left_drag(column: u16, row: u16) -> Event {
        Self::mouse_event(MouseEventKind::Drag(MouseButton::Left), column, row)
    }

    pub fn left_up(column: u16, row: u16) -> Event {
        Self::mouse_event(MouseEventKind::Up(MouseButton::Left), column, row)
    }

    pub fn right_click(column: u16, row: u16) -> Event {
        Self::mouse_event(MouseEventKind::Down(MouseButton::Right), column, row)
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<Event> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Ok(event)
        } else {
            // Exhausted: ask the app to quit
            Ok(SimulatedEventSource::char_key('q'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_source_replays_in_order() {
        let mut source = SimulatedEventSource::new(vec![
            SimulatedEventSource::char_key('n'),
            SimulatedEventSource::right_click(4, 2),
        ]);

        assert!(source.poll(Duration::from_millis(0)).unwrap());
        match source.read().unwrap() {
            Event::Key(key) => assert_eq!(key.code, KeyCode::Char('n')),
            other => panic!("unexpected {other:?}"),
        }
        match source.read().unwrap() {
            Event::Mouse(m) => {
                assert_eq!(m.kind, MouseEventKind::Down(MouseButton::Right));
                assert_eq!((m.column, m.row), (4, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!source.poll(Duration::from_millis(0)).unwrap());
    }
}
