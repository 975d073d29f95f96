#![forbid(unsafe_code)]

//! The [`Tardis`] facade: raw events in, settled [`Snapshot`]s out.
//!
//! # Graph
//!
//! ```text
//! TardisEvent ──► InputNormalizer ──► RangeEngine ───────┐
//!            └──► FocusSuppressor (debounce, hover) ─────┼──► composer ──► Signal<Snapshot>
//!   set_revisions / resize ──► revisions, LinearTimeScale┘
//! ```
//!
//! Every dispatched event runs inside one [`BatchScope`]. The range and
//! tooltip reactions rank below the composer, so snapshot subscribers only
//! ever observe the settled graph, also when a host batches several events.
//!
//! Time is injected: the host reports `now` with each event, asks
//! [`Tardis::next_deadline`] and calls [`Tardis::tick`] when the deadline is
//! reached. An event dispatched at `now` first fires any debounce that was
//! due at or before `now`.

use std::rc::Rc;

use tardis_core::{LinearTimeScale, Pixel, Revision, TardisEvent, TimedEvent, option};
use tracing::{info, info_span, warn};
use web_time::Instant;

use crate::config::{ConfigError, TardisConfig};
use crate::focus::{FocusSignals, FocusState, FocusSuppressor};
use crate::input::{InputNormalizer, Mode, RawInputs};
use crate::range::{ConstrainedRange, RangeEngine};
use crate::reactive::{BatchScope, Observable, Rank, Reaction, Signal, Subscription};
use crate::snapshot::{Snapshot, compose};

/// Reactive constraint-and-suppression engine for one timeline widget.
#[derive(Debug)]
pub struct Tardis {
    config: TardisConfig,
    normalizer: InputNormalizer,
    range: RangeEngine,
    focus: FocusSuppressor,
    revisions: Observable<Rc<[Revision]>>,
    scale: Observable<LinearTimeScale>,
    snapshot: Observable<Snapshot>,
    _watches: Vec<Subscription>,
}

impl Default for Tardis {
    fn default() -> Self {
        Self::new(TardisConfig::default())
    }
}

impl Tardis {
    /// Build an engine with no revisions.
    #[must_use]
    pub fn new(config: TardisConfig) -> Self {
        info!(config = %config.to_jsonl(), "tardis engine created");

        let normalizer = InputNormalizer::new();
        let inputs = normalizer.inputs();
        let range = RangeEngine::new(&inputs, config.sibling_seed);
        let focus = FocusSuppressor::new(config.debounce());

        let revisions: Rc<[Revision]> = Rc::from(Vec::new());
        let scale = Observable::new(LinearTimeScale::fit(&revisions, config.viewport_width));
        let revisions = Observable::new(revisions);

        let sources = Sources {
            mode: inputs.mode.clone(),
            range: range.range(),
            focus: focus.signals(),
            revisions: revisions.signal(),
            scale: scale.signal(),
            radius: config.tooltip_radius,
        };
        let snapshot = Observable::new(sources.compose());

        let composer = {
            let snapshot = snapshot.clone();
            let sources = sources.clone();
            Reaction::new("snapshot.compose", Rank::Compose, move || {
                snapshot.set(sources.compose());
            })
        };
        let watches = vec![
            composer.watch(&sources.mode),
            composer.watch(&sources.range),
            composer.watch(&sources.focus.raw_focus),
            composer.watch(&sources.focus.tooltip_focus),
            composer.watch(&sources.focus.tooltip_hover),
            composer.watch(&sources.revisions),
            composer.watch(&sources.scale),
        ];

        Self {
            config,
            normalizer,
            range,
            focus,
            revisions,
            scale,
            snapshot,
            _watches: watches,
        }
    }

    /// Build an engine, rejecting a configuration that does not validate.
    pub fn try_new(config: TardisConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.validated()?))
    }

    #[must_use]
    pub fn config(&self) -> &TardisConfig {
        &self.config
    }

    /// Replace the revision list and refit the time scale to it.
    pub fn set_revisions(&mut self, revisions: impl Into<Rc<[Revision]>>) {
        let revisions = revisions.into();
        let _batch = BatchScope::new();
        info!(count = revisions.len(), "revisions replaced");
        self.scale.set(LinearTimeScale::fit(&revisions, self.config.viewport_width));
        self.revisions.set(revisions);
    }

    /// Refit the time scale to a new chart width.
    ///
    /// Returns `false` and keeps the current width when `width` is not a
    /// finite positive number.
    pub fn resize(&mut self, width: Pixel) -> bool {
        let Some(width) = option(width).filter(|w| *w > 0.0) else {
            warn!(width, "unusable viewport width ignored");
            return false;
        };
        let _batch = BatchScope::new();
        self.config.viewport_width = width;
        let revisions = self.revisions.get();
        self.scale.set(LinearTimeScale::fit(&revisions, width));
        true
    }

    /// Dispatch a timestamped raw event.
    pub fn dispatch(&mut self, event: TimedEvent) {
        self.handle(event.event, event.at);
    }

    /// Apply `event` as observed at `now`.
    pub fn handle(&mut self, event: TardisEvent, now: Instant) {
        self.tick(now);

        let _span = info_span!("tardis.dispatch", kind = event.kind().as_str()).entered();
        let _batch = BatchScope::new();
        match event {
            TardisEvent::PointerMove { offset } => self.focus.pointer_move(offset, now),
            TardisEvent::PointerLeave => self.focus.pointer_leave(now),
            TardisEvent::Click { offset } => {
                let scale = self.scale.get();
                self.normalizer.click(offset, &scale);
            }
            TardisEvent::ModeToggle(base) => self.normalizer.set_mode(Mode::from(base)),
            TardisEvent::Reset => self.normalizer.reset(),
            TardisEvent::TooltipEnter => self.focus.set_tooltip_hover(true),
            TardisEvent::TooltipLeave => self.focus.set_tooltip_hover(false),
        }
    }

    /// Fire the tooltip debounce if it is due at `now`.
    ///
    /// Returns `true` when a pending focus was released.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.focus.next_deadline().is_none_or(|due| due > now) {
            return false;
        }
        let _span = info_span!("tardis.dispatch", kind = "debounce").entered();
        let _batch = BatchScope::new();
        self.focus.poll(now)
    }

    /// When [`tick`](Self::tick) next has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.focus.next_deadline()
    }

    /// Latest settled snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.get()
    }

    /// Read-only stream of snapshots.
    #[must_use]
    pub fn snapshots(&self) -> Signal<Snapshot> {
        self.snapshot.signal()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.normalizer.mode()
    }

    #[must_use]
    pub fn range(&self) -> ConstrainedRange {
        self.range.current()
    }

    #[must_use]
    pub fn focus(&self) -> FocusState {
        self.focus.state()
    }

    #[must_use]
    pub fn scale(&self) -> LinearTimeScale {
        self.scale.get()
    }

    #[must_use]
    pub fn revisions(&self) -> Rc<[Revision]> {
        self.revisions.get()
    }

    /// Read-only views of the normalized input streams.
    #[must_use]
    pub fn inputs(&self) -> RawInputs {
        self.normalizer.inputs()
    }

    #[must_use]
    pub fn focus_signals(&self) -> FocusSignals {
        self.focus.signals()
    }
}

/// Everything the composer reads.
#[derive(Clone)]
struct Sources {
    mode: Signal<Mode>,
    range: Signal<ConstrainedRange>,
    focus: FocusSignals,
    revisions: Signal<Rc<[Revision]>>,
    scale: Signal<LinearTimeScale>,
    radius: Pixel,
}

impl Sources {
    fn compose(&self) -> Snapshot {
        let revisions = self.revisions.get();
        compose(
            self.mode.get(),
            self.range.get(),
            self.focus.state(),
            &revisions,
            &self.scale.get(),
            self.radius,
        )
    }
}
