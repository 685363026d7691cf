//! Local question templates for the open-ended kinds.
//!
//! Output depends only on the source text, kind and count, so the same
//! selection always yields the same quiz.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::model::{QuestionKind, QuizQuestion};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]{3,}").expect("static regex"));
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]?").expect("static regex"));

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "because", "been", "before", "being", "between", "both",
    "could", "does", "doing", "during", "each", "from", "further", "have", "having", "here",
    "into", "itself", "just", "more", "most", "only", "other", "over", "same", "should", "some",
    "such", "than", "that", "their", "them", "then", "there", "these", "they", "this", "those",
    "through", "under", "until", "very", "were", "what", "when", "where", "which", "while",
    "will", "with", "would", "your",
];

const ONE_WORD_TEMPLATES: &[&str] = &[
    "Fill in the blank with one word: \"{blank}\"",
    "Which single term does the passage use here: \"{blank}\"",
];

const SHORT_ANSWER_TEMPLATES: &[&str] = &[
    "In your own words, explain what the passage says about \"{term}\".",
    "Why is \"{term}\" important in the context of the passage?",
    "Summarize how \"{term}\" relates to the main idea of the text.",
];

const FALLBACK_SHORT: &str = "Summarize the main idea of the selected text in two or three sentences.";
const FALLBACK_ONE_WORD: &str = "Give one word that best describes the topic of the selected text.";

/// Ranked keywords: most frequent first, ties broken by first appearance
pub fn keywords(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (order, m) in WORD_RE.find_iter(text).enumerate() {
        let word = m.as_str().trim_matches(|c| c == '\'' || c == '-').to_lowercase();
        if word.len() < 4 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        let entry = counts.entry(word).or_insert((0, order));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    ranked.into_iter().map(|(word, _)| word).collect()
}

/// Build `count` questions of an open-ended `kind` from `text`
pub fn generate(text: &str, kind: QuestionKind, count: usize) -> Vec<QuizQuestion> {
    let terms = keywords(text);
    let mut questions = Vec::with_capacity(count);

    match kind {
        QuestionKind::OneWord => {
            let sentences: Vec<&str> = SENTENCE_RE
                .find_iter(text)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .collect();
            for (i, term) in terms.iter().enumerate() {
                if questions.len() == count {
                    break;
                }
                let Some(sentence) = sentences.iter().find(|s| contains_word(s, term)) else {
                    continue;
                };
                let blank = blank_out(sentence, term);
                let template = ONE_WORD_TEMPLATES[i % ONE_WORD_TEMPLATES.len()];
                questions.push(QuizQuestion::open(
                    template.replace("{blank}", &blank),
                    QuestionKind::OneWord,
                ));
            }
            while questions.len() < count {
                questions.push(QuizQuestion::open(FALLBACK_ONE_WORD, QuestionKind::OneWord));
            }
        }
        QuestionKind::ShortAnswer | QuestionKind::MultipleChoice => {
            for (i, term) in terms.iter().take(count).enumerate() {
                let template = SHORT_ANSWER_TEMPLATES[i % SHORT_ANSWER_TEMPLATES.len()];
                questions.push(QuizQuestion::open(
                    template.replace("{term}", term),
                    QuestionKind::ShortAnswer,
                ));
            }
            while questions.len() < count {
                questions.push(QuizQuestion::open(FALLBACK_SHORT, QuestionKind::ShortAnswer));
            }
        }
    }

    questions
}

fn word_regex(term: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).ok()
}

fn contains_word(sentence: &str, term: &str) -> bool {
    word_regex(term).is_some_and(|re| re.is_match(sentence))
}

fn blank_out(sentence: &str, term: &str) -> String {
    match word_regex(term) {
        Some(re) => re.replace_all(sentence, "_____").into_owned(),
        None => sentence.to_string(),
    }
}
