//! Queue of transient user notices.

use std::collections::VecDeque;

use envmap_map_models::{Notice, NoticeLevel};

/// Notices kept when the frontend does not drain the queue.
const DEFAULT_CAPACITY: usize = 64;

/// Bounded FIFO of notices; the oldest are dropped first.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
    capacity: usize,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NoticeQueue {
    /// Creates a queue holding at most `capacity` notices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notices: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Adds a notice.
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        if self.notices.len() == self.capacity {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice::new(level, message));
    }

    /// Removes and returns all pending notices, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Number of pending notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Whether no notice is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
