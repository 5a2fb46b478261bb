//! Turning repeated listing polls into a stream of new comments.

use helperbot_core::platform::Comment;
use helperbot_core::seen::SeenWindow;
use std::collections::VecDeque;
use tracing::debug;

/// Poll state: comments already seen and those waiting to be yielded.
/// The first poll only primes the window, so nothing posted before
/// start-up is ever yielded.
#[derive(Debug)]
pub struct CommentStream {
    primed: bool,
    seen: SeenWindow,
    pending: VecDeque<Comment>,
}

impl CommentStream {
    pub fn new(window: usize) -> Self {
        Self {
            primed: false,
            seen: SeenWindow::new(window),
            pending: VecDeque::new(),
        }
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Take in one listing (newest first, as Reddit returns it). Returns
    /// how many comments were queued.
    pub fn ingest(&mut self, newest_first: Vec<Comment>) -> usize {
        let fresh: Vec<Comment> = newest_first
            .into_iter()
            .rev()
            .filter(|c| self.seen.insert(&c.id))
            .collect();
        if !self.primed {
            self.primed = true;
            debug!(skipped = fresh.len(), "Comment stream primed");
            return 0;
        }
        let queued = fresh.len();
        self.pending.extend(fresh);
        queued
    }

    pub fn pop(&mut self) -> Option<Comment> {
        self.pending.pop_front()
    }
}
