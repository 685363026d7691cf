//! Assistant service access: chat replies and quiz generation

mod client;
mod dispatcher;
mod offline;

pub use client::HttpBackend;
pub use dispatcher::{BackendDispatcher, BackendRequest, BackendResponse};
pub use offline::OfflineBackend;

use crate::quiz::{QuestionKind, QuizQuestion};

/// Multiple-choice questions never carry more options than this
pub const MAX_OPTIONS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("backend worker is gone")]
    Disconnected,
}

/// Something that can answer prompts and write quizzes.
///
/// Calls block; the dispatcher runs them off the UI thread.
pub trait Backend: Send {
    fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, BackendError>;

    fn generate_quiz(
        &self,
        text: &str,
        count: usize,
        kind: QuestionKind,
    ) -> Result<Vec<QuizQuestion>, BackendError>;
}
