#![forbid(unsafe_code)]

//! Pointer focus and tooltip suppression.
//!
//! Three channels describe where the user is looking:
//!
//! - `raw_focus`: the pointer offset, updated on every move and cleared on
//!   leave.
//! - `tooltip_hover`: whether the pointer is over the tooltip itself.
//! - `tooltip_focus`: `raw_focus` after a trailing debounce, latched while
//!   the tooltip is hovered.
//!
//! # Rule
//!
//! The debounce releases into `last_stable`. One reaction watches
//! `last_stable` and `tooltip_hover` and evaluates [`resolve_tooltip`]:
//!
//! ```text
//! tooltip_focus' = if hover { tooltip_focus } else { last_stable }
//! ```
//!
//! The hover flag is read when the reaction runs, so a debounced value that
//! lands while the tooltip is hovered is held back, and the tooltip catches
//! up with the latest stable focus when the hover ends.
//!
//! # Invariants
//!
//! 1. While `tooltip_hover` is true, `tooltip_focus` does not change.
//! 2. At most one debounce deadline is pending; a new move replaces it.

use tardis_core::{Pixel, option};
use tracing::trace;
use web_time::{Duration, Instant};

use crate::debounce::Debouncer;
use crate::reactive::{Observable, Rank, Reaction, Signal, Subscription};

/// Focus channels as seen by the snapshot composer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocusState {
    pub raw_focus: Option<Pixel>,
    pub tooltip_focus: Option<Pixel>,
    pub tooltip_hover: bool,
}

/// Read-only views of the focus channels.
#[derive(Debug, Clone)]
pub struct FocusSignals {
    pub raw_focus: Signal<Option<Pixel>>,
    pub tooltip_focus: Signal<Option<Pixel>>,
    pub tooltip_hover: Signal<bool>,
}

impl FocusSignals {
    #[must_use]
    pub fn state(&self) -> FocusState {
        FocusState {
            raw_focus: self.raw_focus.get(),
            tooltip_focus: self.tooltip_focus.get(),
            tooltip_hover: self.tooltip_hover.get(),
        }
    }
}

/// The hover-lock rule.
#[must_use]
pub fn resolve_tooltip(
    current: Option<Pixel>,
    last_stable: Option<Pixel>,
    hover: bool,
) -> Option<Pixel> {
    if hover { current } else { last_stable }
}

/// Owner of the focus channels and the tooltip debounce.
#[derive(Debug)]
pub struct FocusSuppressor {
    raw_focus: Observable<Option<Pixel>>,
    tooltip_hover: Observable<bool>,
    tooltip_focus: Observable<Option<Pixel>>,
    last_stable: Observable<Option<Pixel>>,
    debounce: Debouncer<Option<Pixel>>,
    _watches: Vec<Subscription>,
}

impl FocusSuppressor {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        let raw_focus = Observable::new(None);
        let tooltip_hover = Observable::new(false);
        let tooltip_focus = Observable::new(None);
        let last_stable = Observable::new(None);

        let reaction = {
            let hover = tooltip_hover.signal();
            let stable = last_stable.signal();
            let tooltip = tooltip_focus.clone();
            Reaction::new("focus.tooltip", Rank::Derive, move || {
                let next = resolve_tooltip(tooltip.get(), stable.get(), hover.get());
                tooltip.set(next);
            })
        };
        let watches = vec![
            reaction.watch(&last_stable.signal()),
            reaction.watch(&tooltip_hover.signal()),
        ];

        Self {
            raw_focus,
            tooltip_hover,
            tooltip_focus,
            last_stable,
            debounce: Debouncer::new(quiet),
            _watches: watches,
        }
    }

    #[must_use]
    pub fn signals(&self) -> FocusSignals {
        FocusSignals {
            raw_focus: self.raw_focus.signal(),
            tooltip_focus: self.tooltip_focus.signal(),
            tooltip_hover: self.tooltip_hover.signal(),
        }
    }

    #[must_use]
    pub fn state(&self) -> FocusState {
        FocusState {
            raw_focus: self.raw_focus.get(),
            tooltip_focus: self.tooltip_focus.get(),
            tooltip_hover: self.tooltip_hover.get(),
        }
    }

    /// Pointer moved over the chart. A non-finite offset counts as absent.
    pub fn pointer_move(&mut self, offset: Pixel, now: Instant) {
        self.track(option(offset), now);
    }

    /// Pointer left the chart.
    pub fn pointer_leave(&mut self, now: Instant) {
        self.track(None, now);
    }

    fn track(&mut self, focus: Option<Pixel>, now: Instant) {
        self.raw_focus.set(focus);
        self.debounce.push(focus, now);
    }

    pub fn set_tooltip_hover(&self, hover: bool) {
        trace!(hover, "tooltip hover");
        self.tooltip_hover.set(hover);
    }

    /// Release the debounced focus if it is due at `now`.
    ///
    /// Returns `true` when a value was released.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debounce.poll(now) {
            Some(stable) => {
                trace!(?stable, hover = self.tooltip_hover.get(), "focus settled");
                self.last_stable.set(stable);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }
}
