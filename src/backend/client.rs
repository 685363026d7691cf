use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{Backend, BackendError, MAX_OPTIONS};
use crate::quiz::{QuestionKind, QuizQuestion};

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    prompt: &'a str,
    context: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct QuizRequestBody<'a> {
    text: &'a str,
    count: usize,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct QuizResponseBody {
    #[serde(default)]
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    question_text: String,
    options: Vec<String>,
    correct_answer: String,
}

impl From<WireQuestion> for QuizQuestion {
    fn from(q: WireQuestion) -> Self {
        let mut options = q.options;
        options.truncate(MAX_OPTIONS);
        QuizQuestion::multiple_choice(q.question_text, options, Some(q.correct_answer))
    }
}

/// JSON-over-HTTP client for the assistant service
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<String, BackendError> {
        let url = format!("{}{path}", self.base_url);
        let payload =
            serde_json::to_string(body).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        debug!("POST {url} ({} bytes)", payload.len());

        let resp = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&payload)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    warn!("{url} returned {code}");
                    BackendError::Status(code)
                }
                ureq::Error::Transport(t) => BackendError::Network(t.to_string()),
            })?;

        resp.into_string()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

impl Backend for HttpBackend {
    fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, BackendError> {
        let body = self.post("/ask", &AskRequest { prompt, context })?;
        parse_ask(&body)
    }

    fn generate_quiz(
        &self,
        text: &str,
        count: usize,
        kind: QuestionKind,
    ) -> Result<Vec<QuizQuestion>, BackendError> {
        let body = self.post(
            "/generate_quiz",
            &QuizRequestBody {
                text,
                count,
                kind: kind.wire_name(),
            },
        )?;
        parse_quiz(&body)
    }
}

fn parse_ask(body: &str) -> Result<String, BackendError> {
    serde_json::from_str::<AskResponse>(body)
        .map(|r| r.response)
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

fn parse_quiz(body: &str) -> Result<Vec<QuizQuestion>, BackendError> {
    let parsed = serde_json::from_str::<QuizResponseBody>(body)
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
    Ok(parsed.questions.into_iter().map(QuizQuestion::from).collect())
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    use super::*;

    /// One-shot local server answering every request with `status_line`
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn ask_body_carries_optional_context() {
        let json = serde_json::to_string(&AskRequest {
            prompt: "Explain this:",
            context: Some("mitosis"),
        })
        .unwrap();
        assert_eq!(json, r#"{"prompt":"Explain this:","context":"mitosis"}"#);

        let json = serde_json::to_string(&AskRequest {
            prompt: "hi",
            context: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"prompt":"hi","context":null}"#);
    }

    #[test]
    fn quiz_body_uses_type_field() {
        let json = serde_json::to_string(&QuizRequestBody {
            text: "t",
            count: 3,
            kind: QuestionKind::MultipleChoice.wire_name(),
        })
        .unwrap();
        assert_eq!(json, r#"{"text":"t","count":3,"type":"MCQ"}"#);
    }

    #[test]
    fn quiz_response_is_capped_to_four_options() {
        let body = r#"{"questions":[{"question_text":"Q?","options":["a","b","c","d","e"],"correct_answer":"b"}]}"#;
        let questions = parse_quiz(body).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[0].correct_answer.as_deref(), Some("b"));
    }

    #[test]
    fn malformed_bodies_are_errors() {
        assert!(matches!(parse_ask("not json"), Err(BackendError::InvalidResponse(_))));
        assert!(matches!(
            parse_quiz(r#"{"questions":[{"question_text":"Q"}]}"#),
            Err(BackendError::InvalidResponse(_))
        ));
        assert_eq!(parse_quiz(r#"{"error":"boom"}"#).unwrap().len(), 0);
    }

    #[test]
    fn unreachable_service_is_a_network_error() {
        // Port 9 (discard) on localhost is closed on test machines
        let backend = HttpBackend::new("http://127.0.0.1:9/", Duration::from_millis(500));
        assert_eq!(backend.base_url(), "http://127.0.0.1:9");
        assert!(matches!(
            backend.ask("hello", None),
            Err(BackendError::Network(_))
        ));
    }

    #[test]
    fn server_error_status_is_reported() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error", r#"{"error":"boom"}"#);
        let backend = HttpBackend::new(&url, Duration::from_secs(5));
        assert!(matches!(
            backend.ask("hello", Some("mitosis")),
            Err(BackendError::Status(500))
        ));
    }

    #[test]
    fn quiz_request_round_trips_over_http() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"questions":[{"question_text":"Q?","options":["a","b"],"correct_answer":"a"}]}"#,
        );
        let backend = HttpBackend::new(&url, Duration::from_secs(5));
        let questions = backend
            .generate_quiz("cells", 1, QuestionKind::MultipleChoice)
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt, "Q?");
    }
}
