//! Per-owner ledger of delayed work.
//!
//! Nothing in the game shell holds a raw timer. Delayed work is described as an
//! action value, parked here with a due time, and handed back to the owner by
//! [`TimeoutRegistry::pop_due`] when its time has come. Because the registry is
//! the only place an action can come back from, [`TimeoutRegistry::cancel_all`]
//! is a hard guarantee: once it returns, nothing scheduled earlier can fire,
//! even if its due time already passed and the owner has not polled yet.

use chrono::{DateTime, Duration, Utc};

/// Opaque handle to one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// An action whose due time has been reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<A> {
    /// When the action was due. Owners schedule follow-up work from here so a
    /// late poll does not stretch chained delays.
    pub at: DateTime<Utc>,
    pub action: A,
}

#[derive(Debug)]
struct Pending<A> {
    handle: TimerHandle,
    due: DateTime<Utc>,
    action: A,
}

#[derive(Debug)]
pub struct TimeoutRegistry<A> {
    pending: Vec<Pending<A>>,
    next_handle: u64,
}

impl<A> Default for TimeoutRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimeoutRegistry<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_handle: 0,
        }
    }

    /// Park `action` until `now + delay`. Negative delays fire on the next poll.
    pub fn schedule(&mut self, action: A, delay: Duration, now: DateTime<Utc>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let due = now + delay.max(Duration::zero());
        // Keep the ledger ordered by due time; equal due times stay FIFO.
        let at = self.pending.partition_point(|p| p.due <= due);
        self.pending.insert(at, Pending { handle, due, action });
        handle
    }

    /// Cancel a single action. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Drop every outstanding action and return how many were dropped.
    ///
    /// The registry stays usable; later `schedule` calls start a fresh ledger.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Remove and return the earliest action due at or before `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<Fired<A>> {
        if self.pending.first().is_some_and(|p| p.due <= now) {
            let p = self.pending.remove(0);
            Some(Fired {
                at: p.due,
                action: p.action,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.pending.first().map(|p| p.due)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
