#![forbid(unsafe_code)]

//! Reactive graph primitives.
//!
//! - [`Observable`]: writable channel, owned by exactly one component.
//! - [`Signal`]: read-only view of a channel, handed to the rest of the graph.
//! - [`Reaction`]: a keyed recompute step that coalesces when several of its
//!   inputs change in the same batch.
//! - [`BatchScope`]: defers notifications so consumers only see settled state.
//! - [`Rank`]: drain order inside a batch; derived channels settle before
//!   their readers, and plain subscribers run last.
//!
//! All primitives are `Rc`-based and single-threaded.

pub mod batch;
pub mod observable;
pub mod reaction;
pub mod signal;

pub use batch::{BatchScope, Rank};
pub use observable::{Observable, Subscription};
pub use reaction::Reaction;
pub use signal::Signal;
