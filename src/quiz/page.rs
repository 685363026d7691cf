use log::{info, warn};

use crate::backend::BackendError;
use crate::handoff::SelectionHandoff;

use super::generator;
use super::model::{Answer, QuestionKind, QuizQuestion};
use super::scoring::{QuizOutcome, grade};
use super::{MAX_QUESTIONS, MIN_QUESTIONS};

pub const NO_TEXT_MESSAGE: &str = "No text found for quiz generation.";
pub const GENERATION_FAILED_MESSAGE: &str = "Couldn't generate a quiz right now. Please try again.";
pub const EMPTY_QUIZ_MESSAGE: &str = "No questions could be generated from this text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuizSessionId(pub u64);

/// Work the app must hand to the backend dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRequest {
    pub session: QuizSessionId,
    pub text: String,
    pub count: usize,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    NoText,
    Setup,
    Loading(QuizSessionId),
    Answering,
    Submitted(QuizOutcome),
    Failed(String),
}

/// Quiz page state: setup form, generation, answer form and result
#[derive(Debug)]
pub struct QuizPage {
    source: Option<String>,
    count: usize,
    kind: QuestionKind,
    phase: QuizPhase,
    questions: Vec<QuizQuestion>,
    answers: Vec<Answer>,
    next_session: u64,
}

impl QuizPage {
    pub fn new(default_count: usize) -> Self {
        Self {
            source: None,
            count: default_count.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
            kind: QuestionKind::default(),
            phase: QuizPhase::NoText,
            questions: Vec::new(),
            answers: Vec::new(),
            next_session: 0,
        }
    }

    /// Start over from a hand-off record. Blank or missing text leaves the
    /// page in the `NoText` state.
    pub fn open(&mut self, handoff: Option<SelectionHandoff>) {
        self.questions.clear();
        self.answers.clear();
        match handoff.map(|h| h.text).filter(|t| !t.trim().is_empty()) {
            Some(text) => {
                info!("Quiz opened with {} chars of text", text.len());
                self.source = Some(text);
                self.phase = QuizPhase::Setup;
            }
            None => {
                self.source = None;
                self.phase = QuizPhase::NoText;
            }
        }
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn source_text(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn set_count(&mut self, count: usize) {
        if self.phase == QuizPhase::Setup {
            self.count = count.clamp(MIN_QUESTIONS, MAX_QUESTIONS);
        }
    }

    pub fn set_kind(&mut self, kind: QuestionKind) {
        if self.phase == QuizPhase::Setup {
            self.kind = kind;
        }
    }

    /// Leave setup. Multiple choice returns a request for the backend,
    /// open-ended kinds are generated on the spot.
    pub fn start(&mut self) -> Option<QuizRequest> {
        if self.phase != QuizPhase::Setup {
            return None;
        }
        let text = self.source.clone()?;

        if self.kind.uses_backend() {
            self.next_session += 1;
            let session = QuizSessionId(self.next_session);
            self.phase = QuizPhase::Loading(session);
            Some(QuizRequest {
                session,
                text,
                count: self.count,
                kind: self.kind,
            })
        } else {
            let questions = generator::generate(&text, self.kind, self.count);
            self.accept_questions(questions);
            None
        }
    }

    /// Apply a generation result. Results for any session other than the
    /// one being waited on are ignored.
    pub fn on_generated(
        &mut self,
        session: QuizSessionId,
        result: Result<Vec<QuizQuestion>, BackendError>,
    ) {
        if self.phase != QuizPhase::Loading(session) {
            info!("Ignoring quiz result for stale session {}", session.0);
            return;
        }
        match result {
            Ok(questions) => self.accept_questions(questions),
            Err(e) => {
                warn!("Quiz generation failed: {e}");
                self.phase = QuizPhase::Failed(GENERATION_FAILED_MESSAGE.to_string());
            }
        }
    }

    fn accept_questions(&mut self, questions: Vec<QuizQuestion>) {
        if questions.is_empty() {
            self.phase = QuizPhase::Failed(EMPTY_QUIZ_MESSAGE.to_string());
            return;
        }
        self.answers = vec![Answer::Unanswered; questions.len()];
        self.questions = questions;
        self.phase = QuizPhase::Answering;
    }

    /// Inputs accept edits only while answering
    pub fn inputs_enabled(&self) -> bool {
        self.phase == QuizPhase::Answering
    }

    pub fn choose(&mut self, question: usize, option: usize) -> bool {
        if !self.inputs_enabled() {
            return false;
        }
        let Some(q) = self.questions.get(question) else {
            return false;
        };
        if q.kind != QuestionKind::MultipleChoice || option >= q.options.len() {
            return false;
        }
        self.answers[question] = Answer::Choice(option);
        true
    }

    pub fn type_char(&mut self, question: usize, c: char) -> bool {
        if !self.inputs_enabled() {
            return false;
        }
        let Some(q) = self.questions.get(question) else {
            return false;
        };
        match q.kind {
            QuestionKind::MultipleChoice => return false,
            QuestionKind::OneWord if c == '\n' => return false,
            _ => {}
        }
        match &mut self.answers[question] {
            Answer::Text(s) => s.push(c),
            other => *other = Answer::Text(c.to_string()),
        }
        true
    }

    pub fn backspace(&mut self, question: usize) -> bool {
        if !self.inputs_enabled() {
            return false;
        }
        match self.answers.get_mut(question) {
            Some(Answer::Text(s)) => s.pop().is_some(),
            _ => false,
        }
    }

    /// Grade the answers and lock the form
    pub fn submit(&mut self) -> Option<&QuizOutcome> {
        if !self.inputs_enabled() {
            return None;
        }
        let outcome = grade(&self.questions, &self.answers);
        info!("Quiz submitted: {}", outcome.message());
        self.phase = QuizPhase::Submitted(outcome);
        match &self.phase {
            QuizPhase::Submitted(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Back to the setup form with the same source text
    pub fn restart(&mut self) {
        if self.source.is_some() {
            self.questions.clear();
            self.answers.clear();
            self.phase = QuizPhase::Setup;
        }
    }
}
