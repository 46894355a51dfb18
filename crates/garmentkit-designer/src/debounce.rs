//! Quiet-period gate for history commits.
//!
//! Every edit takes a ticket. A ticket is honored only if no newer edit and
//! no explicit flush happened while it waited, so a drag gesture collapses
//! into one commit.

use std::cell::Cell;
use std::time::Duration;

/// Ticket issued for one edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTicket(u64);

/// Coalesces bursts of edits into one history commit.
#[derive(Debug)]
pub struct EditDebouncer {
    generation: Cell<u64>,
    delay: Duration,
}

impl EditDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            generation: Cell::new(0),
            delay,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Quiet period before a commit.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiet period.
    pub fn ticket(&self) -> EditTicket {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        EditTicket(next)
    }

    /// Invalidate any pending ticket.
    pub fn cancel(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    /// Whether no edit has been scheduled since `ticket` was issued.
    pub fn is_current(&self, ticket: EditTicket) -> bool {
        self.generation.get() == ticket.0
    }

    /// Wait out the quiet period. Returns whether the ticket is still current.
    pub async fn settle(&self, ticket: EditTicket) -> bool {
        tokio::time::sleep(self.delay).await;
        self.is_current(ticket)
    }
}
