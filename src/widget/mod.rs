pub mod chat_panel;
pub mod help_popup;
pub mod hud_message;
pub mod pdf_reader;
pub mod quiz_page;
pub mod selection_menu;
