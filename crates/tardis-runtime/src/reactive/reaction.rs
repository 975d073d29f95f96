#![forbid(unsafe_code)]

//! Keyed recompute steps.
//!
//! A [`Reaction`] wraps one recompute closure and watches any number of
//! [`Signal`]s. Whenever one of them changes the closure is scheduled under
//! the reaction's own key, so inside a batch it runs once per flush step no
//! matter how many inputs changed. Outside a batch it runs immediately.
//!
//! Each reaction carries a [`Rank`]. A flush drains lower ranks first, so a
//! [`Rank::Compose`] reaction reading the output of a [`Rank::Derive`]
//! reaction only runs after that output has settled.
//!
//! The closure reads its inputs when it runs, not when it was scheduled, so
//! it always samples the current value of every input (e.g. the hover flag
//! at the moment a debounced value lands).

use std::rc::Rc;

use super::batch::{self, Rank};
use super::observable::Subscription;
use super::signal::Signal;

/// A named recompute step wired to one or more input signals.
#[derive(Clone)]
pub struct Reaction {
    name: &'static str,
    rank: Rank,
    run: Rc<dyn Fn()>,
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}

impl Reaction {
    /// Create a reaction. It does not run until scheduled.
    #[must_use]
    pub fn new(name: &'static str, rank: Rank, run: impl Fn() + 'static) -> Self {
        Self {
            name,
            rank,
            run: Rc::new(run),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn key(&self) -> usize {
        Rc::as_ptr(&self.run) as *const () as usize
    }

    #[must_use]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Run now, or once in the current batch once lower ranks have settled.
    pub fn schedule(&self) {
        let run = Rc::clone(&self.run);
        tracing::trace!(reaction = self.name, rank = ?self.rank, "reaction scheduled");
        batch::defer_or_run_keyed(self.key(), self.rank, move || run());
    }

    /// Re-run whenever `signal` changes. Drop the guard to stop watching.
    pub fn watch<T: Clone + PartialEq + 'static>(&self, signal: &Signal<T>) -> Subscription {
        let me = self.clone();
        signal.subscribe_ranked(self.rank, move |_| me.schedule())
    }
}
