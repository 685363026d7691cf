use super::{Backend, BackendError};
use crate::quiz::{QuestionKind, QuizQuestion};

const CONTEXT_PREVIEW_CHARS: usize = 50;

/// Canned replies used when no assistant service is available
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineBackend;

impl OfflineBackend {
    /// The fixed sample quiz; it has no answer keys so it is never scored
    pub fn sample_quiz() -> Vec<QuizQuestion> {
        let mcq = |prompt: &str, options: [&str; 4]| {
            QuizQuestion::multiple_choice(
                prompt,
                options.iter().map(|o| o.to_string()).collect(),
                None,
            )
        };
        vec![
            mcq(
                "What is the main topic discussed in the text?",
                ["Technology", "Science", "History", "Other"],
            ),
            mcq(
                "What best describes the tone of the text?",
                ["Informative", "Persuasive", "Narrative", "Analytical"],
            ),
            mcq(
                "What could be the main purpose of this text?",
                ["To inform", "To entertain", "To criticize", "To explain"],
            ),
        ]
    }
}

impl Backend for OfflineBackend {
    fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, BackendError> {
        Ok(match context {
            Some(context) => {
                let preview: String = context.chars().take(CONTEXT_PREVIEW_CHARS).collect();
                format!("Dummy response for \"{prompt}\" regarding the text: \"{preview}...\"")
            }
            None => format!("Dummy response for: \"{prompt}\""),
        })
    }

    fn generate_quiz(
        &self,
        _text: &str,
        _count: usize,
        _kind: QuestionKind,
    ) -> Result<Vec<QuizQuestion>, BackendError> {
        Ok(Self::sample_quiz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_quote_the_prompt() {
        let backend = OfflineBackend;
        assert_eq!(
            backend.ask("hello", None).unwrap(),
            "Dummy response for: \"hello\""
        );

        let long = "x".repeat(80);
        let reply = backend.ask("Explain this:", Some(&long)).unwrap();
        assert!(reply.contains(&format!("\"{}...\"", "x".repeat(50))));
        assert!(!reply.contains(&"x".repeat(51)));
    }

    #[test]
    fn sample_quiz_is_unscored() {
        let quiz = OfflineBackend
            .generate_quiz("anything", 5, QuestionKind::MultipleChoice)
            .unwrap();
        assert_eq!(quiz.len(), 3);
        assert!(quiz.iter().all(|q| !q.is_scorable() && q.options.len() == 4));
    }
}
