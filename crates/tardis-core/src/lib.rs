#![forbid(unsafe_code)]

//! Core: revisions, raw input events, time scales, and option helpers.
//!
//! # Role in Tardis
//! `tardis-core` is the leaf layer. It owns the value types that flow
//! through the reactive engine in `tardis-runtime` but has no notion of
//! streams, timers, or subscribers itself.
//!
//! # Primary responsibilities
//! - **Option helpers**: the single place where raw emptiness (NaN offsets,
//!   empty strings) becomes absence, plus the fallible `get`.
//! - **TardisEvent**: canonical raw input events (pointer, click, mode
//!   toggle, reset, tooltip hover).
//! - **Revision**: the immutable dated records shown on the timeline.
//! - **TimeScale**: the timestamp ↔ pixel bijection consumed by the engine.

pub mod event;
pub mod option;
pub mod revision;
pub mod scale;

pub use event::{EventKind, TardisEvent, TimedEvent};
pub use option::{NoSuchElement, OptionExt, Sentinel, option};
pub use revision::{Revision, Timestamp};
pub use scale::{LinearTimeScale, Pixel, TimeScale};
