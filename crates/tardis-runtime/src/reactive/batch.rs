#![forbid(unsafe_code)]

//! Batch coalescing for [`Observable`](super::Observable) notifications.
//!
//! One raw event usually changes several channels at once: a reset clears
//! both picks, the mode and the reset generation. Without batching, each
//! change would notify immediately and a downstream subscriber could see
//! the picks cleared while the mode still says "base". A [`BatchScope`]
//! defers all notifications until it exits, then fires each unique callback
//! once with the latest value.
//!
//! # Invariants
//!
//! 1. Nested batches are supported: only the outermost scope flushes.
//! 2. Within a batch, `Observable::get()` returns the latest value (values
//!    update immediately, only notifications are deferred).
//! 3. After a batch exits, subscribers have seen the final state, never an
//!    intermediate one.
//! 4. Every flush step runs the pending callbacks of the lowest [`Rank`],
//!    in first-enqueue order. A [`Rank::Compose`] callback therefore never
//!    runs while a [`Rank::Derive`] callback is pending, and plain
//!    subscribers run only once every reaction has settled.
//! 5. Callbacks that mutate further observables during a flush enqueue into
//!    a later step; flushing continues until the graph is quiescent or
//!    [`MAX_FLUSH_ROUNDS`] steps have run.
//!
//! # Failure Modes
//!
//! - **Callback panics during flush**: remaining callbacks of the step are
//!   still called, then the first panic is re-raised.
//! - **Cyclic graph**: a cycle that keeps changing values is cut off after
//!   [`MAX_FLUSH_ROUNDS`] with a warning; the leftover callbacks are dropped.

use std::cell::RefCell;
use tracing::{info, info_span, warn};
use web_time::Instant;

/// Upper bound on flush steps per batch.
pub const MAX_FLUSH_ROUNDS: u32 = 64;

/// Drain order of deferred callbacks. Lower ranks settle first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    /// Reactions that derive a channel from raw inputs (range, tooltip focus).
    Derive,
    /// Reactions that read derived channels (the snapshot composer).
    Compose,
    /// Plain observable subscribers, hosts included.
    Subscriber,
}

type DeferredNotify = Box<dyn FnOnce()>;

struct DeferredEntry {
    key: usize,
    rank: Rank,
    notify: DeferredNotify,
}

struct BatchContext {
    /// Nesting depth. Only flush when this reaches 0.
    depth: u32,
    deferred: Vec<DeferredEntry>,
    /// Source changes coalesced into this batch.
    signals_changed: u64,
}

thread_local! {
    static BATCH_CTX: RefCell<Option<BatchContext>> = const { RefCell::new(None) };
}

/// Returns true if a batch is currently active on this thread.
pub fn is_batching() -> bool {
    BATCH_CTX.with(|ctx| ctx.borrow().is_some())
}

/// Enqueue `f` keyed by `key` at `rank`, or run it now when no batch is
/// active. Returns `true` if deferred.
///
/// If the key is already pending, the queued callback is replaced (latest
/// wins) but keeps its original position.
pub fn defer_or_run_keyed(key: usize, rank: Rank, f: impl FnOnce() + 'static) -> bool {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        if let Some(ref mut batch) = *guard {
            if let Some(entry) = batch.deferred.iter_mut().find(|entry| entry.key == key) {
                entry.notify = Box::new(f);
            } else {
                batch.deferred.push(DeferredEntry {
                    key,
                    rank,
                    notify: Box::new(f),
                });
            }
            true
        } else {
            drop(guard);
            f();
            false
        }
    })
}

/// Record source changes while a batch is active.
pub fn record_signals_changed(count: u64) {
    if count == 0 {
        return;
    }
    BATCH_CTX.with(|ctx| {
        if let Some(ref mut batch) = *ctx.borrow_mut() {
            batch.signals_changed = batch.signals_changed.saturating_add(count);
        }
    });
}

/// Remove and return the pending callbacks of the lowest rank.
fn take_step() -> Vec<DeferredNotify> {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        let Some(batch) = guard.as_mut() else {
            return Vec::new();
        };
        let Some(lowest) = batch.deferred.iter().map(|entry| entry.rank).min() else {
            return Vec::new();
        };
        let (step, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut batch.deferred)
            .into_iter()
            .partition(|entry| entry.rank == lowest);
        batch.deferred = rest;
        step.into_iter().map(|entry| entry.notify).collect()
    })
}

/// Run deferred notifications step by step until quiescent.
///
/// The batch context stays installed while flushing so cascaded changes
/// are deferred into a later step instead of firing mid-step.
fn flush() {
    let mut step = take_step();
    if step.is_empty() {
        return;
    }

    let signals_changed = BATCH_CTX.with(|ctx| {
        ctx.borrow()
            .as_ref()
            .map_or(0, |batch| batch.signals_changed)
    });
    let propagation_start = Instant::now();
    let _span = info_span!(
        "tardis.propagate",
        signals_changed,
        reactions_invalidated = tracing::field::Empty,
        rounds = tracing::field::Empty,
        duration_us = tracing::field::Empty
    )
    .entered();

    let mut reactions_invalidated = 0_u64;
    let mut rounds = 0_u32;
    let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;

    while !step.is_empty() {
        if rounds == MAX_FLUSH_ROUNDS {
            warn!(
                rounds,
                dropped = step.len(),
                "reactive cascade did not settle; dropping remaining notifications"
            );
            break;
        }
        rounds += 1;
        reactions_invalidated += step.len() as u64;

        for notify in step {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(notify));
            if let Err(payload) = result
                && first_panic.is_none()
            {
                first_panic = Some(payload);
            }
        }
        if first_panic.is_some() {
            break;
        }
        step = take_step();
    }

    let duration_us = propagation_start.elapsed().as_micros() as u64;
    let span = tracing::Span::current();
    span.record("reactions_invalidated", reactions_invalidated);
    span.record("rounds", rounds);
    span.record("duration_us", duration_us);
    info!(
        tardis_propagation_duration_us = duration_us,
        signals_changed, reactions_invalidated, rounds, "tardis propagation duration"
    );

    if let Some(payload) = first_panic {
        // Leave no half-flushed context behind for the next batch.
        BATCH_CTX.with(|ctx| *ctx.borrow_mut() = None);
        std::panic::resume_unwind(payload);
    }
}

/// RAII guard that begins a batch scope.
///
/// While a `BatchScope` is alive, all observable notifications are
/// deferred. When the outermost scope drops, they fire.
pub struct BatchScope {
    is_root: bool,
}

impl BatchScope {
    /// Begin a new batch scope, nesting if one is already active.
    #[must_use]
    pub fn new() -> Self {
        let is_root = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            match *guard {
                Some(ref mut batch) => {
                    batch.depth += 1;
                    false
                }
                None => {
                    *guard = Some(BatchContext {
                        depth: 1,
                        deferred: Vec::new(),
                        signals_changed: 0,
                    });
                    true
                }
            }
        });
        Self { is_root }
    }

    /// Number of notifications pending in this batch.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        BATCH_CTX.with(|ctx| ctx.borrow().as_ref().map_or(0, |b| b.deferred.len()))
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let should_flush = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            if let Some(ref mut batch) = *guard {
                batch.depth -= 1;
                batch.depth == 0
            } else {
                false
            }
        });

        if should_flush {
            flush();
            BATCH_CTX.with(|ctx| {
                *ctx.borrow_mut() = None;
            });
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("is_root", &self.is_root)
            .field("pending", &self.pending_count())
            .finish()
    }
}
