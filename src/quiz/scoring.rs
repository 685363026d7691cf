use super::model::{Answer, QuizQuestion};

/// Per-question verdict after submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    /// Chosen option was wrong; `correct` is the index of the right one, if
    /// it is among the options
    Incorrect { correct: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOutcome {
    Scored {
        score: usize,
        total: usize,
        verdicts: Vec<Verdict>,
    },
    Acknowledged,
}

impl QuizOutcome {
    pub fn message(&self) -> String {
        match self {
            QuizOutcome::Scored { score, total, .. } => format!("{score} out of {total} correct"),
            QuizOutcome::Acknowledged => "Quiz submitted! Great job reviewing.".to_string(),
        }
    }

    pub fn verdict(&self, idx: usize) -> Option<&Verdict> {
        match self {
            QuizOutcome::Scored { verdicts, .. } => verdicts.get(idx),
            QuizOutcome::Acknowledged => None,
        }
    }
}

/// Grade a submission.
///
/// Scored only when every question is multiple choice with an answer key;
/// anything else has no ground truth and is acknowledged instead.
pub fn grade(questions: &[QuizQuestion], answers: &[Answer]) -> QuizOutcome {
    if questions.is_empty() || !questions.iter().all(QuizQuestion::is_scorable) {
        return QuizOutcome::Acknowledged;
    }

    let verdicts: Vec<Verdict> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let correct_idx = q
                .correct_answer
                .as_deref()
                .and_then(|key| q.options.iter().position(|o| same_answer(o, key)));
            match answers.get(i) {
                Some(Answer::Choice(chosen)) => {
                    let chosen_text = q.options.get(*chosen).map(String::as_str);
                    let matched = match (chosen_text, q.correct_answer.as_deref()) {
                        (Some(c), Some(key)) => same_answer(c, key),
                        _ => false,
                    };
                    if matched {
                        Verdict::Correct
                    } else {
                        Verdict::Incorrect {
                            correct: correct_idx,
                        }
                    }
                }
                _ => Verdict::Incorrect {
                    correct: correct_idx,
                },
            }
        })
        .collect();

    let score = verdicts.iter().filter(|v| **v == Verdict::Correct).count();
    QuizOutcome::Scored {
        score,
        total: questions.len(),
        verdicts,
    }
}

fn same_answer(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuestionKind;

    fn mcq(prompt: &str, correct: &str) -> QuizQuestion {
        QuizQuestion::multiple_choice(
            prompt,
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            Some(correct.into()),
        )
    }

    #[test]
    fn two_of_three_correct() {
        let questions = vec![mcq("q1", "A"), mcq("q2", "B"), mcq("q3", "C")];
        let answers = vec![Answer::Choice(0), Answer::Choice(1), Answer::Choice(3)];

        let outcome = grade(&questions, &answers);
        assert_eq!(outcome.message(), "2 out of 3 correct");
        assert_eq!(
            outcome.verdict(2),
            Some(&Verdict::Incorrect { correct: Some(2) })
        );
    }

    #[test]
    fn unanswered_counts_as_wrong() {
        let questions = vec![mcq("q1", "A"), mcq("q2", "B")];
        let outcome = grade(&questions, &[Answer::Choice(0)]);
        assert_eq!(outcome.message(), "1 out of 2 correct");
    }

    #[test]
    fn key_comparison_ignores_surrounding_whitespace() {
        let questions = vec![mcq("q1", " B ")];
        let outcome = grade(&questions, &[Answer::Choice(1)]);
        assert_eq!(outcome.message(), "1 out of 1 correct");
    }

    #[test]
    fn open_ended_is_acknowledged() {
        let questions = vec![QuizQuestion::open("Explain", QuestionKind::ShortAnswer)];
        let outcome = grade(&questions, &[Answer::Text("because".into())]);
        assert_eq!(outcome, QuizOutcome::Acknowledged);
        assert_eq!(outcome.message(), "Quiz submitted! Great job reviewing.");
    }

    #[test]
    fn keyless_multiple_choice_is_acknowledged() {
        let questions = vec![QuizQuestion::multiple_choice(
            "Tone?",
            vec!["Informative".into(), "Narrative".into()],
            None,
        )];
        assert_eq!(grade(&questions, &[Answer::Choice(0)]), QuizOutcome::Acknowledged);
    }
}
