//! PDF reader widget components

pub mod controller;
pub mod rendering;

pub use controller::{DocumentController, ViewerError, ViewerEvent};
pub use rendering::render_page;
