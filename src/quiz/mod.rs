//! Quiz generation, answering and scoring

pub mod generator;
mod model;
mod page;
mod scoring;

pub use model::{Answer, QuestionKind, QuizQuestion};
pub use page::{
    EMPTY_QUIZ_MESSAGE, GENERATION_FAILED_MESSAGE, NO_TEXT_MESSAGE, QuizPage, QuizPhase,
    QuizRequest, QuizSessionId,
};
pub use scoring::{QuizOutcome, Verdict, grade};

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 10;
