#![forbid(unsafe_code)]

//! Tardis Runtime
//!
//! The reactive constraint-and-suppression engine behind the Tardis
//! timeline widget: users pick a *head* and a *base* revision on a chart
//! and hover to see nearby revisions in a tooltip.
//!
//! # Key Components
//!
//! - [`Tardis`] - Facade: raw events in, settled [`Snapshot`]s out
//! - [`InputNormalizer`] - Raw picks, toggles and resets into canonical streams
//! - [`RangeEngine`] - Rubber-band head/base constraint (`base <= head`)
//! - [`FocusSuppressor`] - Pointer focus, tooltip debounce and hover lock
//! - [`Snapshot`] - Immutable per-recompute view for the renderer
//! - [`TardisConfig`] - Tunables as data, loadable from TOML/JSON
//!
//! # Role in Tardis
//! `tardis-runtime` sits on top of `tardis-core`'s value types. It owns every
//! channel of the graph, the only timer (the tooltip debounce) and the
//! batching that makes each event's recomputation atomic for subscribers.
//!
//! # Threading
//! The graph is single-threaded and `!Send`; time is injected by the host
//! through [`Tardis::handle`], [`Tardis::tick`] and [`Tardis::next_deadline`].

pub mod config;
pub mod debounce;
pub mod engine;
#[cfg(feature = "event-trace")]
pub mod event_trace;
pub mod focus;
pub mod input;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod range;
pub mod reactive;
pub mod snapshot;

pub use config::{ConfigError, TardisConfig};
pub use debounce::Debouncer;
pub use engine::Tardis;
pub use focus::{FocusSignals, FocusState, FocusSuppressor, resolve_tooltip};
pub use input::{InputNormalizer, Mode, RawInputs};
pub use range::{ConstrainedRange, RangeEngine, RangeInput, SiblingSeed, advance};
pub use reactive::{BatchScope, Observable, Rank, Reaction, Signal, Subscription};
pub use snapshot::{Markers, Snapshot, compose, near_pointer, strictly_between};

pub use tardis_core::{
    LinearTimeScale, NoSuchElement, OptionExt, Pixel, Revision, TardisEvent, TimeScale,
    TimedEvent, Timestamp, option,
};
