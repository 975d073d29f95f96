#![forbid(unsafe_code)]

//! Trailing-edge debounce with injected time.
//!
//! [`Debouncer`] keeps at most one pending value. Every [`push`] replaces the
//! pending value and restarts the quiet period ("latest wins"); the value is
//! released by [`poll`] once `quiet` has elapsed since the last push.
//!
//! The debouncer never reads the clock. Callers pass `now` in, ask for the
//! next [`deadline`] and poll when it is reached, which keeps the behavior
//! deterministic under test and replay.
//!
//! [`push`]: Debouncer::push
//! [`poll`]: Debouncer::poll
//! [`deadline`]: Debouncer::deadline

use web_time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    due: Instant,
}

/// Single-slot trailing debounce.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<Pending<T>>,
    /// Diagnostic: values replaced before they were released.
    superseded: u64,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            superseded: 0,
        }
    }

    #[must_use]
    pub const fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Queue `value`, replacing any pending one, due `quiet` after `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        if self.pending.is_some() {
            self.superseded = self.superseded.saturating_add(1);
        }
        let due = now.checked_add(self.quiet).unwrap_or(now);
        tracing::trace!(quiet_ms = self.quiet.as_millis() as u64, "debounce restarted");
        self.pending = Some(Pending { value, due });
    }

    /// Release the pending value if its quiet period has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.due <= now => {
                tracing::trace!(superseded = self.superseded, "debounce fired");
                self.pending.take().map(|pending| pending.value)
            }
            _ => None,
        }
    }

    /// When the pending value becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without releasing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    #[must_use]
    pub const fn superseded(&self) -> u64 {
        self.superseded
    }
}
