//! Runs backend calls on a worker thread so the UI loop never blocks

use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, error};

use super::{Backend, BackendError};
use crate::chat::{MessageId, ReplyTicket};
use crate::quiz::{QuizQuestion, QuizRequest, QuizSessionId};

#[derive(Debug)]
pub enum BackendRequest {
    Ask(ReplyTicket),
    Quiz(QuizRequest),
    Shutdown,
}

#[derive(Debug)]
pub enum BackendResponse {
    Reply {
        id: MessageId,
        result: Result<String, BackendError>,
    },
    Quiz {
        session: QuizSessionId,
        result: Result<Vec<QuizQuestion>, BackendError>,
    },
}

/// Owns the backend worker. Requests run one at a time in submission order.
pub struct BackendDispatcher {
    request_tx: Sender<BackendRequest>,
    response_rx: Receiver<BackendResponse>,
    outstanding: usize,
    /// Failures produced locally when the worker could not be reached
    undelivered: Vec<BackendResponse>,
}

impl BackendDispatcher {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::Builder::new()
            .name("backend".into())
            .spawn(move || backend_worker(backend, request_rx, response_tx))
            .map_err(|e| error!("Failed to spawn backend worker: {e}"))
            .ok();

        Self {
            request_tx,
            response_rx,
            outstanding: 0,
            undelivered: Vec::new(),
        }
    }

    /// Queue a chat reply. If the worker is gone the failure comes back
    /// through `poll` like any other.
    pub fn ask(&mut self, ticket: ReplyTicket) {
        self.submit(BackendRequest::Ask(ticket));
    }

    pub fn generate_quiz(&mut self, request: QuizRequest) {
        self.submit(BackendRequest::Quiz(request));
    }

    fn submit(&mut self, request: BackendRequest) {
        self.outstanding += 1;
        if let Err(flume::SendError(request)) = self.request_tx.send(request) {
            error!("Backend worker is not running");
            self.outstanding -= 1;
            if let Some(response) = disconnected(request) {
                self.undelivered.push(response);
            }
        }
    }

    /// Number of submitted requests with no response yet
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Drain finished requests without blocking
    pub fn poll(&mut self) -> Vec<BackendResponse> {
        let mut responses = std::mem::take(&mut self.undelivered);
        while let Ok(response) = self.response_rx.try_recv() {
            self.outstanding = self.outstanding.saturating_sub(1);
            responses.push(response);
        }
        responses
    }

    /// Block up to `timeout` for one response, then drain the rest
    pub fn poll_timeout(&mut self, timeout: Duration) -> Vec<BackendResponse> {
        let mut responses = Vec::new();
        if self.undelivered.is_empty() {
            if let Ok(response) = self.response_rx.recv_timeout(timeout) {
                self.outstanding = self.outstanding.saturating_sub(1);
                responses.push(response);
            }
        }
        responses.extend(self.poll());
        responses
    }
}

impl Drop for BackendDispatcher {
    fn drop(&mut self) {
        let _ = self.request_tx.send(BackendRequest::Shutdown);
    }
}

fn disconnected(request: BackendRequest) -> Option<BackendResponse> {
    match request {
        BackendRequest::Ask(ticket) => Some(BackendResponse::Reply {
            id: ticket.id,
            result: Err(BackendError::Disconnected),
        }),
        BackendRequest::Quiz(req) => Some(BackendResponse::Quiz {
            session: req.session,
            result: Err(BackendError::Disconnected),
        }),
        BackendRequest::Shutdown => None,
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
fn backend_worker(
    backend: Box<dyn Backend>,
    requests: Receiver<BackendRequest>,
    responses: Sender<BackendResponse>,
) {
    for request in requests {
        let response = match request {
            BackendRequest::Ask(ticket) => {
                debug!("Asking assistant for reply {}", ticket.id.0);
                BackendResponse::Reply {
                    id: ticket.id,
                    result: backend.ask(&ticket.prompt, ticket.context.as_deref()),
                }
            }
            BackendRequest::Quiz(req) => {
                debug!("Generating {} {:?} questions", req.count, req.kind);
                BackendResponse::Quiz {
                    session: req.session,
                    result: backend.generate_quiz(&req.text, req.count, req.kind),
                }
            }
            BackendRequest::Shutdown => break,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}
