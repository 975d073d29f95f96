#![forbid(unsafe_code)]

//! Immutable per-recompute composition of everything the renderer reads.

use std::rc::Rc;

use tardis_core::{Pixel, Revision, TimeScale, Timestamp};

use crate::focus::FocusState;
use crate::input::Mode;
use crate::range::ConstrainedRange;

/// Pixel-space projections for the chart overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Markers {
    pub head: Option<Pixel>,
    pub base: Option<Pixel>,
    /// Tooltip focus pixel.
    pub focus: Option<Pixel>,
    /// Tooltip focus mapped back onto the timeline.
    pub focus_time: Option<Timestamp>,
}

impl Markers {
    #[must_use]
    pub fn project(range: ConstrainedRange, focus: &FocusState, scale: &dyn TimeScale) -> Self {
        Self {
            head: range.head.map(|at| scale.scale(at)),
            base: range.base.map(|at| scale.scale(at)),
            focus: focus.tooltip_focus,
            focus_time: focus.tooltip_focus.map(|px| scale.invert(px)),
        }
    }
}

/// One settled view of the engine.
///
/// Created fresh on every recompute and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub mode: Mode,
    pub range: ConstrainedRange,
    pub focus: FocusState,
    pub revisions: Rc<[Revision]>,
    /// Revisions with `base < created_at < head`; empty unless both are set.
    pub between: Vec<Revision>,
    /// Revisions near the tooltip focus; `None` when nothing is near or
    /// there is no focus.
    pub tooltip_revisions: Option<Vec<Revision>>,
    pub markers: Markers,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            mode: Mode::Head,
            range: ConstrainedRange::EMPTY,
            focus: FocusState::default(),
            revisions: Rc::from(Vec::new()),
            between: Vec::new(),
            tooltip_revisions: None,
            markers: Markers::default(),
        }
    }
}

impl Snapshot {
    #[must_use]
    pub fn is_comparing(&self) -> bool {
        self.range.bounds().is_some()
    }
}

/// Revisions strictly inside the selected range, in input order.
#[must_use]
pub fn strictly_between(revisions: &[Revision], range: ConstrainedRange) -> Vec<Revision> {
    match range.bounds() {
        Some((base, head)) => revisions
            .iter()
            .filter(|r| r.is_strictly_between(base, head))
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

/// Revisions whose projection lies within `radius` of `px`, edges inclusive.
///
/// An empty match is `None`.
#[must_use]
pub fn near_pointer(
    revisions: &[Revision],
    scale: &dyn TimeScale,
    px: Pixel,
    radius: Pixel,
) -> Option<Vec<Revision>> {
    let near: Vec<Revision> = revisions
        .iter()
        .filter(|r| (scale.scale(r.created_at) - px).abs() <= radius)
        .cloned()
        .collect();
    (!near.is_empty()).then_some(near)
}

/// Build a snapshot from the current graph values.
#[must_use]
pub fn compose(
    mode: Mode,
    range: ConstrainedRange,
    focus: FocusState,
    revisions: &Rc<[Revision]>,
    scale: &dyn TimeScale,
    radius: Pixel,
) -> Snapshot {
    let tooltip_revisions = focus
        .tooltip_focus
        .and_then(|px| near_pointer(revisions, scale, px, radius));
    Snapshot {
        mode,
        range,
        focus,
        revisions: Rc::clone(revisions),
        between: strictly_between(revisions, range),
        tooltip_revisions,
        markers: Markers::project(range, &focus, scale),
    }
}
