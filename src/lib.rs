pub mod backend;
pub mod chat;
pub mod event_source;
pub mod handoff;
pub mod main_app;
pub mod notification;
pub mod panic_handler;
pub mod pdf;
pub mod quiz;
pub mod settings;
pub mod theme;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use main_app::{App, AppAction, FocusedPanel, View, run_app_with_event_source};
