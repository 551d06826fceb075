//! Coordinator mailbox monitoring.
//!
//! The monitor is shared between the handle, which counts a message when it
//! is queued, and the actor, which counts it again once it has been fully
//! handled. Depth is therefore the number of messages waiting or in flight.
//!
//! | Level | Depth |
//! |-------|-------|
//! | Normal | <= 100 |
//! | Warning | 101-500 |
//! | Critical | > 500 |

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

pub const MAILBOX_NORMAL: usize = 100;
pub const MAILBOX_WARNING: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MailboxLevel {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Default)]
pub struct MailboxMonitor {
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message accepted into the mailbox.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_depth.fetch_max(new_depth, Ordering::Relaxed);

        match level_for_depth(new_depth) {
            MailboxLevel::Critical => {
                warn!(
                    target: "room.actor.mailbox",
                    depth = new_depth,
                    threshold = MAILBOX_WARNING,
                    "Coordinator mailbox depth critical"
                );
            }
            MailboxLevel::Warning if new_depth == MAILBOX_NORMAL + 1 => {
                debug!(
                    target: "room.actor.mailbox",
                    depth = new_depth,
                    "Coordinator mailbox depth elevated"
                );
            }
            _ => {}
        }
    }

    /// Record a message fully handled by the actor.
    pub fn record_dequeue(&self) {
        self.decrement();
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo an enqueue whose send failed because the actor is gone.
    pub fn record_rejected(&self) {
        self.decrement();
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    fn decrement(&self) {
        // Saturating: never wrap below zero.
        let _ = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1));
    }
}

fn level_for_depth(depth: usize) -> MailboxLevel {
    if depth > MAILBOX_WARNING {
        MailboxLevel::Critical
    } else if depth > MAILBOX_NORMAL {
        MailboxLevel::Warning
    } else {
        MailboxLevel::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_dequeue_tracks_depth_and_peak() {
        let monitor = MailboxMonitor::new();

        monitor.record_enqueue();
        monitor.record_enqueue();
        monitor.record_enqueue();
        assert_eq!(monitor.current_depth(), 3);
        assert_eq!(monitor.peak_depth(), 3);

        monitor.record_dequeue();
        assert_eq!(monitor.current_depth(), 2);
        assert_eq!(monitor.peak_depth(), 3);
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_rejected_does_not_count_as_processed() {
        let monitor = MailboxMonitor::new();
        monitor.record_enqueue();
        monitor.record_rejected();

        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.messages_processed(), 0);
    }

    #[test]
    fn test_depth_never_underflows() {
        let monitor = MailboxMonitor::new();
        monitor.record_dequeue();
        monitor.record_rejected();
        assert_eq!(monitor.current_depth(), 0);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for_depth(0), MailboxLevel::Normal);
        assert_eq!(level_for_depth(MAILBOX_NORMAL), MailboxLevel::Normal);
        assert_eq!(level_for_depth(MAILBOX_NORMAL + 1), MailboxLevel::Warning);
        assert_eq!(level_for_depth(MAILBOX_WARNING), MailboxLevel::Warning);
        assert_eq!(level_for_depth(MAILBOX_WARNING + 1), MailboxLevel::Critical);
    }
}
