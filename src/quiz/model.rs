use serde::{Deserialize, Serialize};

/// Kind of question and therefore of answer control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Radio group over `options`
    #[default]
    MultipleChoice,
    /// Single-line text input
    OneWord,
    /// Multi-line text input
    ShortAnswer,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [
        QuestionKind::MultipleChoice,
        QuestionKind::OneWord,
        QuestionKind::ShortAnswer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "Multiple choice",
            QuestionKind::OneWord => "One word",
            QuestionKind::ShortAnswer => "Short answer",
        }
    }

    /// Value of the `type` field sent to the quiz service
    pub fn wire_name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "MCQ",
            QuestionKind::OneWord => "one_word",
            QuestionKind::ShortAnswer => "short_answer",
        }
    }

    pub fn next(self) -> Self {
        match self {
            QuestionKind::MultipleChoice => QuestionKind::OneWord,
            QuestionKind::OneWord => QuestionKind::ShortAnswer,
            QuestionKind::ShortAnswer => QuestionKind::MultipleChoice,
        }
    }

    pub fn prev(self) -> Self {
        self.next().next()
    }

    /// Only multiple choice comes from the quiz service; the open-ended
    /// kinds are generated locally from templates.
    pub fn uses_backend(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub prompt: String,
    pub kind: QuestionKind,
    /// Present only for multiple choice
    pub options: Vec<String>,
    /// Present only when the question came with an answer key
    pub correct_answer: Option<String>,
}

impl QuizQuestion {
    pub fn multiple_choice(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: Option<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::MultipleChoice,
            options,
            correct_answer,
        }
    }

    pub fn open(prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
            options: Vec::new(),
            correct_answer: None,
        }
    }

    pub fn is_scorable(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice && self.correct_answer.is_some()
    }
}

/// The user's answer to one question
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Answer {
    #[default]
    Unanswered,
    /// Index into `options`
    Choice(usize),
    Text(String),
}
