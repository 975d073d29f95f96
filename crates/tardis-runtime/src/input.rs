#![forbid(unsafe_code)]

//! Input normalization: raw picks, toggles and resets into canonical streams.
//!
//! The normalizer owns four channels and exposes them read-only as
//! [`RawInputs`]:
//!
//! | stream      | initial  | fed by                           | on reset |
//! |-------------|----------|----------------------------------|----------|
//! | `reset`     | `0`      | reset button (generation + 1)    | +1       |
//! | `mode`      | `Head`   | "select base" checkbox           | `Head`   |
//! | `head_pick` | `None`   | click while in `Head` mode       | `None`   |
//! | `base_pick` | `None`   | click while in `Base` mode       | `None`   |
//!
//! A reset writes all four channels inside one batch, so downstream
//! reactions see a single, consistent cleared state.

use tardis_core::{Pixel, TimeScale, Timestamp, option};
use tracing::{debug, info, warn};

use crate::reactive::{BatchScope, Observable, Signal};

/// Which handle direct picks drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Picks move the head (checkbox unchecked).
    #[default]
    Head,
    /// Picks move the base (checkbox checked).
    Base,
}

impl Mode {
    #[must_use]
    pub const fn is_base(self) -> bool {
        matches!(self, Self::Base)
    }
}

impl From<bool> for Mode {
    fn from(base: bool) -> Self {
        if base { Self::Base } else { Self::Head }
    }
}

impl From<Mode> for bool {
    fn from(mode: Mode) -> Self {
        mode.is_base()
    }
}

/// Read-only views of the canonical input streams.
#[derive(Debug, Clone)]
pub struct RawInputs {
    /// Reset generation; every increment is one reset trigger.
    pub reset: Signal<u64>,
    pub mode: Signal<Mode>,
    pub head_pick: Signal<Option<Timestamp>>,
    pub base_pick: Signal<Option<Timestamp>>,
}

/// Owner of the canonical input channels.
#[derive(Debug)]
pub struct InputNormalizer {
    reset: Observable<u64>,
    mode: Observable<Mode>,
    head_pick: Observable<Option<Timestamp>>,
    base_pick: Observable<Option<Timestamp>>,
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl InputNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reset: Observable::new(0),
            mode: Observable::new(Mode::Head),
            head_pick: Observable::new(None),
            base_pick: Observable::new(None),
        }
    }

    /// Read-only stream views for downstream components.
    #[must_use]
    pub fn inputs(&self) -> RawInputs {
        RawInputs {
            reset: self.reset.signal(),
            mode: self.mode.signal(),
            head_pick: self.head_pick.signal(),
            base_pick: self.base_pick.signal(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    /// Clear both picks, return to head mode and fire the reset trigger.
    pub fn reset(&self) {
        let _batch = BatchScope::new();
        self.reset.update(|generation| *generation = generation.wrapping_add(1));
        self.head_pick.set(None);
        self.base_pick.set(None);
        self.mode.set(Mode::Head);
        info!(generation = self.reset.get(), "selection reset");
    }

    /// Apply the checkbox state.
    pub fn set_mode(&self, mode: Mode) {
        debug!(?mode, "mode toggled");
        self.mode.set(mode);
    }

    /// Route a picked timestamp to the handle selected by the current mode.
    pub fn pick(&self, at: Timestamp) {
        let mode = self.mode.get();
        debug!(?mode, %at, "pick");
        match mode {
            Mode::Head => self.head_pick.set(Some(at)),
            Mode::Base => self.base_pick.set(Some(at)),
        }
    }

    /// Translate a click offset through `scale` and pick it.
    ///
    /// Returns `false` when the offset is absent (non-finite) and the click
    /// was dropped.
    pub fn click(&self, offset: Pixel, scale: &dyn TimeScale) -> bool {
        match option(offset).map(|px| scale.invert(px)) {
            Some(at) => {
                self.pick(at);
                true
            }
            None => {
                warn!(offset, "click without a usable offset dropped");
                false
            }
        }
    }
}
