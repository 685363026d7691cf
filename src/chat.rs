//! Chat transcript and input state.
//!
//! The transcript is append-only. The single permitted edit is resolving a
//! reply placeholder, by id, into the final bot text or the error text.

use log::{debug, warn};

use crate::backend::BackendError;

pub const PLACEHOLDER_TEXT: &str = "Thinking…";
pub const REPLY_ERROR_TEXT: &str = "Sorry, I couldn't reach the assistant. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    /// Selected document text quoted into the conversation
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    pub role: Role,
    pub placeholder: bool,
}

/// A reply the backend owes the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTicket {
    pub id: MessageId,
    pub prompt: String,
    pub context: Option<String>,
}

#[derive(Debug, Default)]
pub struct ChatPanel {
    messages: Vec<ChatMessage>,
    input: String,
    open: bool,
    next_id: u64,
    /// Lines scrolled up from the bottom of the transcript
    scroll_back: usize,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub fn pending_replies(&self) -> usize {
        self.messages.iter().filter(|m| m.placeholder).count()
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Keep the scroll offset inside a transcript of `total` wrapped lines
    pub fn clamp_scroll(&mut self, total: usize, visible: usize) {
        self.scroll_back = self.scroll_back.min(total.saturating_sub(visible));
    }

    fn append(&mut self, text: String, role: Role, placeholder: bool) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(ChatMessage {
            id,
            text,
            role,
            placeholder,
        });
        self.scroll_back = 0;
        id
    }

    /// Send whatever is in the input line
    pub fn submit_input(&mut self) -> Option<ReplyTicket> {
        let text = std::mem::take(&mut self.input);
        self.send(&text)
    }

    /// Post a user message. Blank text is ignored.
    pub fn send(&mut self, user_text: &str) -> Option<ReplyTicket> {
        let text = user_text.trim();
        if text.is_empty() {
            return None;
        }
        self.append(text.to_string(), Role::User, false);
        self.input.clear();
        Some(self.request_reply(text, None))
    }

    /// Quote selected text into the conversation and ask about it
    pub fn send_with_context(&mut self, context: &str, prompt: &str) -> ReplyTicket {
        self.open = true;
        self.append(format!("Context: \"{context}\""), Role::Context, false);
        self.append(prompt.to_string(), Role::User, false);
        self.request_reply(prompt, Some(context))
    }

    /// Append a placeholder and return the ticket that will resolve it
    pub fn request_reply(&mut self, prompt: &str, context: Option<&str>) -> ReplyTicket {
        let id = self.append(PLACEHOLDER_TEXT.to_string(), Role::Bot, true);
        debug!("Reply {} requested", id.0);
        ReplyTicket {
            id,
            prompt: prompt.to_string(),
            context: context.map(str::to_string),
        }
    }

    /// Replace the placeholder for `id`. Returns false for unknown or
    /// already resolved ids.
    pub fn resolve(&mut self, id: MessageId, result: Result<String, BackendError>) -> bool {
        let Some(message) = self
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.placeholder)
        else {
            debug!("No pending reply {}", id.0);
            return false;
        };
        message.text = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Assistant reply {} failed: {e}", id.0);
                REPLY_ERROR_TEXT.to_string()
            }
        };
        message.placeholder = false;
        true
    }
}
