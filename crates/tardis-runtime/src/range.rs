#![forbid(unsafe_code)]

//! Range constraint engine: a rubber-band head/base selector.
//!
//! # Transition rule
//!
//! Evaluated on every emission of `mode`, `head_pick`, `base_pick` or
//! `reset`:
//!
//! - **Reset**: both handles become absent.
//! - **Base mode**: `base := base_pick` verbatim; `head := max(head,
//!   base_pick)`, so a base dragged past the head pulls the head along.
//! - **Head mode**: `head := head_pick` verbatim; `base := min(base,
//!   head_pick)`.
//!
//! An absent pick never pulls its sibling. Whether an absent sibling is
//! seeded from a present pick is decided by [`SiblingSeed`].
//!
//! # Invariants
//!
//! 1. Whenever both handles are present, `base <= head`.
//! 2. [`advance`] is total and pure; the reactive [`RangeEngine`] is only a
//!    fold of it over time.

use std::cell::Cell;
use std::rc::Rc;

use tardis_core::{OptionExt, Timestamp};
use tracing::debug;

use crate::input::{Mode, RawInputs};
use crate::reactive::{Observable, Rank, Reaction, Signal, Subscription};

/// Current head/base selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstrainedRange {
    pub head: Option<Timestamp>,
    pub base: Option<Timestamp>,
}

impl ConstrainedRange {
    /// Nothing selected.
    pub const EMPTY: Self = Self {
        head: None,
        base: None,
    };

    #[must_use]
    pub const fn new(head: Option<Timestamp>, base: Option<Timestamp>) -> Self {
        Self { head, base }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none() && self.base.is_none()
    }

    /// `base <= head` whenever both are present.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.head
            .zip(self.base)
            .is_none_or(|(head, base)| base <= head)
    }

    /// `(base, head)` when both handles are present.
    #[must_use]
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        self.base.zip(self.head)
    }
}

/// How an absent sibling reacts to a pick on the driven handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "snake_case"))]
pub enum SiblingSeed {
    /// The sibling stays absent until it is picked itself.
    #[default]
    LeaveAbsent,
    /// The sibling snaps to the picked value.
    SnapToPick,
}

/// One step of the constraint fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeInput {
    Reset,
    Picks {
        mode: Mode,
        head_pick: Option<Timestamp>,
        base_pick: Option<Timestamp>,
    },
}

impl RangeInput {
    /// Latest values of the pick streams.
    #[must_use]
    pub fn sample(inputs: &RawInputs) -> Self {
        Self::Picks {
            mode: inputs.mode.get(),
            head_pick: inputs.head_pick.get(),
            base_pick: inputs.base_pick.get(),
        }
    }
}

/// Pure transition: `(previous, input) -> next`.
#[must_use]
pub fn advance(previous: ConstrainedRange, input: RangeInput, seed: SiblingSeed) -> ConstrainedRange {
    match input {
        RangeInput::Reset => ConstrainedRange::EMPTY,
        RangeInput::Picks {
            mode: Mode::Base,
            base_pick,
            ..
        } => ConstrainedRange {
            head: pull_along(previous.head, base_pick, Timestamp::max, seed),
            base: base_pick,
        },
        RangeInput::Picks {
            mode: Mode::Head,
            head_pick,
            ..
        } => ConstrainedRange {
            head: head_pick,
            base: pull_along(previous.base, head_pick, Timestamp::min, seed),
        },
    }
}

fn pull_along(
    sibling: Option<Timestamp>,
    pick: Option<Timestamp>,
    clamp: fn(Timestamp, Timestamp) -> Timestamp,
    seed: SiblingSeed,
) -> Option<Timestamp> {
    let pulled = sibling.merge_with(pick, clamp);
    match seed {
        SiblingSeed::LeaveAbsent => pulled,
        SiblingSeed::SnapToPick => pulled.or(pick),
    }
}

/// Reactive fold of [`advance`] over the normalizer's streams.
#[derive(Debug)]
pub struct RangeEngine {
    range: Observable<ConstrainedRange>,
    _watches: Vec<Subscription>,
}

impl RangeEngine {
    /// Wire the engine to `inputs`.
    #[must_use]
    pub fn new(inputs: &RawInputs, seed: SiblingSeed) -> Self {
        let range = Observable::new(ConstrainedRange::EMPTY);
        let seen_reset = Rc::new(Cell::new(inputs.reset.get()));

        let reaction = {
            let range = range.clone();
            let inputs = inputs.clone();
            Reaction::new("range.constrain", Rank::Derive, move || {
                let previous = range.get();
                let mut next = previous;
                let generation = inputs.reset.get();
                if generation != seen_reset.get() {
                    seen_reset.set(generation);
                    next = advance(next, RangeInput::Reset, seed);
                }
                next = advance(next, RangeInput::sample(&inputs), seed);
                if next != previous {
                    debug!(from = ?previous, to = ?next, "range constrained");
                }
                range.set(next);
            })
        };

        let watches = vec![
            reaction.watch(&inputs.reset),
            reaction.watch(&inputs.mode),
            reaction.watch(&inputs.head_pick),
            reaction.watch(&inputs.base_pick),
        ];

        Self {
            range,
            _watches: watches,
        }
    }

    #[must_use]
    pub fn range(&self) -> Signal<ConstrainedRange> {
        self.range.signal()
    }

    #[must_use]
    pub fn current(&self) -> ConstrainedRange {
        self.range.get()
    }
}
