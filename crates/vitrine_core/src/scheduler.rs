//! Deferred task scheduler
//!
//! The page never owns a real timer. Every delayed behavior (a popup's
//! staggered show, its auto-hide, a modal's removal) is a task queued here with
//! an absolute deadline, and the host pumps the queue:
//!
//! ```ignore
//! // After any entry point, arm one host timer for the earliest deadline
//! if let Some(deadline) = page.next_deadline() {
//!     host_timer.arm(deadline.saturating_sub(clock.now_ms()));
//! }
//!
//! // When the host timer fires
//! page.advance();
//! ```
//!
//! Tasks are keyed by slotmap [`TimerId`]s so a pending task can be canceled
//! before it fires. Deadlines tie-break on insertion order.

use std::collections::BTreeSet;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a scheduled task
    pub struct TimerId;
}

struct Entry<T> {
    due_ms: u64,
    seq: u64,
    task: T,
}

/// Deadline-ordered queue of cancelable tasks
pub struct Scheduler<T> {
    entries: SlotMap<TimerId, Entry<T>>,
    /// (due, seq, id) so iteration order is deadline, then insertion
    queue: BTreeSet<(u64, u64, TimerId)>,
    /// Time cursor in milliseconds; only moves forward
    now_ms: u64,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler with its cursor at `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            entries: SlotMap::with_key(),
            queue: BTreeSet::new(),
            now_ms,
            next_seq: 0,
        }
    }

    /// Current time cursor
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Move the cursor forward to `now_ms` (never backwards)
    pub fn sync(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Schedule `task` to run `delay_ms` after the cursor
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerId {
        let due_ms = self.now_ms.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;

        let id = self.entries.insert(Entry { due_ms, seq, task });
        self.queue.insert((due_ms, seq, id));
        id
    }

    /// Cancel a pending task; returns false if it already fired or was canceled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.remove(id) {
            Some(entry) => {
                self.queue.remove(&(entry.due_ms, entry.seq, id));
                true
            }
            None => false,
        }
    }

    /// Check whether a task is still waiting to fire
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(id)
    }

    /// Deadline of a pending task
    pub fn due(&self, id: TimerId) -> Option<u64> {
        self.entries.get(id).map(|e| e.due_ms)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.first().map(|(due, _, _)| *due)
    }

    /// Pop the earliest task due at or before `until_ms`
    ///
    /// The cursor moves to the task's deadline so anything scheduled while the
    /// task is dispatched is measured from the moment it was due.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, T)> {
        let (due_ms, seq, id) = *self.queue.first()?;
        if due_ms > until_ms {
            return None;
        }
        self.queue.remove(&(due_ms, seq, id));
        let entry = self.entries.remove(id)?;
        self.sync(due_ms);
        Some((id, entry.task))
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty queue
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate pending tasks in deadline order
    pub fn pending(&self) -> impl Iterator<Item = (TimerId, u64, &T)> + '_ {
        self.queue
            .iter()
            .filter_map(|(due, _, id)| self.entries.get(*id).map(|e| (*id, *due, &e.task)))
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> std::fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now_ms", &self.now_ms)
            .field("pending", &self.entries.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
