#![forbid(unsafe_code)]

//! Canonical raw input events.
//!
//! These are the discrete emissions delivered by the host's event source
//! (a DOM, a terminal, a test script). They are deliberately close to the
//! raw source: offsets are plain `f64` and may be non-finite when the source
//! could not report a position. The input normalizer in `tardis-runtime`
//! lifts them into canonical streams through [`crate::option`].
//!
//! # Design Notes
//!
//! - Pixel offsets are measured from the left edge of the chart area.
//! - `ModeToggle` carries the checkbox state, not a flip request, so a
//!   repeated toggle to the same state is harmless.
//! - Events carry no timestamp themselves; [`TimedEvent`] pairs one with
//!   the instant it was observed.

use web_time::Instant;

/// Canonical raw input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TardisEvent {
    /// Pointer moved over the chart.
    PointerMove {
        /// Horizontal offset in pixels.
        offset: f64,
    },

    /// Pointer left the chart area.
    PointerLeave,

    /// Click on the chart: picks a timestamp for the active handle.
    Click {
        /// Horizontal offset in pixels.
        offset: f64,
    },

    /// "Select base" checkbox changed.
    ///
    /// `true` = base selection mode, `false` = head selection mode.
    ModeToggle(bool),

    /// Reset button clicked.
    Reset,

    /// Pointer entered the tooltip element.
    TooltipEnter,

    /// Pointer left the tooltip element.
    TooltipLeave,
}

impl TardisEvent {
    /// Discriminant without payload, for logging and routing.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerLeave => EventKind::PointerLeave,
            Self::Click { .. } => EventKind::Click,
            Self::ModeToggle(_) => EventKind::ModeToggle,
            Self::Reset => EventKind::Reset,
            Self::TooltipEnter => EventKind::TooltipEnter,
            Self::TooltipLeave => EventKind::TooltipLeave,
        }
    }
}

/// Payload-free event discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerLeave,
    Click,
    ModeToggle,
    Reset,
    TooltipEnter,
    TooltipLeave,
}

impl EventKind {
    /// Stable lowercase name used in logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointerMove => "pointer_move",
            Self::PointerLeave => "pointer_leave",
            Self::Click => "click",
            Self::ModeToggle => "mode_toggle",
            Self::Reset => "reset",
            Self::TooltipEnter => "tooltip_enter",
            Self::TooltipLeave => "tooltip_leave",
        }
    }
}

/// An event paired with the instant it was observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// The raw event.
    pub event: TardisEvent,
    /// When the event source delivered it.
    pub at: Instant,
}

impl TimedEvent {
    /// Pair an event with its observation instant.
    #[must_use]
    pub const fn new(event: TardisEvent, at: Instant) -> Self {
        Self { event, at }
    }
}
