//! Short-lived status messages for the HUD line

use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(5);
/// Older messages are dropped beyond this many
const MAX_QUEUED: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub expires_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Queue of HUD messages. The newest one is shown; repeating a message
/// that is still queued refreshes it instead of stacking a copy.
#[derive(Debug)]
pub struct NotificationManager {
    queue: Vec<Notification>,
    ttl: Duration,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            queue: Vec::new(),
            ttl,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let message = message.into();
        self.queue
            .retain(|n| !(n.message == message && n.level == level));
        self.queue.push(Notification {
            message,
            level,
            expires_at: Instant::now() + self.ttl,
        });
        if self.queue.len() > MAX_QUEUED {
            self.queue.remove(0);
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }

    /// Drop expired messages. True when the HUD needs a redraw.
    pub fn update(&mut self) -> bool {
        let now = Instant::now();
        let before = self.queue.len();
        self.queue.retain(|n| !n.is_expired(now));
        self.queue.len() != before
    }

    pub fn current(&self) -> Option<&Notification> {
        self.queue.last()
    }

    pub fn count(&self) -> usize {
        self.queue.len()
    }
}
