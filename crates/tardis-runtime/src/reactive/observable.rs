#![forbid(unsafe_code)]

//! Writable reactive cell with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). When the value changes (determined by
//! `PartialEq`), all live subscribers are notified in registration order.
//! Inside a batch the notifications are deferred and drained by
//! [`Rank`](super::batch::Rank): reactions first, plain subscribers last.
//!
//! Observables are the *channels* of the Tardis graph. The component that
//! creates one keeps the writable handle private and hands out a read-only
//! [`Signal`] view via [`Observable::signal`], so every mutation in the graph
//! happens in exactly one place.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: If [`Subscription`] guards are stored indefinitely
//!   without being dropped, callbacks accumulate. Dead weak references are
//!   cleaned lazily during `notify()`.
//! - **Cascades**: a subscriber that sets another observable triggers a
//!   nested notification. Inside a batch these run in a later flush round.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{info, info_span};
use web_time::Instant;

use super::batch::{self, Rank};
use super::signal::Signal;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct Subscriber<T> {
    rank: Rank,
    callback: CallbackWeak<T>,
}

struct ObservableInner<T> {
    value: T,
    version: u64,
    /// Pruned on notify.
    subscribers: Vec<Subscriber<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers of equal rank are notified in registration order.
/// 4. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable with the given initial value (version 0).
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Set a new value. If it differs from the current value the version is
    /// incremented and all live subscribers are notified.
    ///
    /// Safe to call re-entrantly from within subscriber callbacks.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Modify the value in place. Notifies only if the result differs from
    /// the previous value.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value != old {
                inner.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Subscribe to value changes.
    ///
    /// Inside a batch the callback runs after every reaction has settled.
    /// Dropping the returned guard unsubscribes the callback.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe_ranked(Rank::Subscriber, callback)
    }

    /// Subscribe with an explicit drain rank.
    pub(crate) fn subscribe_ranked(
        &self,
        rank: Rank,
        callback: impl Fn(&T) + 'static,
    ) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let callback = Rc::downgrade(&strong);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Subscriber { rank, callback });
        // `Rc<dyn Fn(&T)>` cannot coerce to `Rc<dyn Any>` directly, so box it.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Read-only view sharing this observable's state.
    #[must_use]
    pub fn signal(&self) -> Signal<T> {
        Signal::new(self.clone())
    }

    /// Current version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Notify live subscribers and prune dead ones.
    ///
    /// Inside a [`super::batch::BatchScope`] notifications are deferred,
    /// keyed per callback and ordered by rank, so each subscriber runs once
    /// per flush step with the latest value.
    fn notify(&self) {
        let callbacks: Vec<(Rank, CallbackRc<T>)> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|s| s.callback.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(|s| s.callback.upgrade().map(|cb| (s.rank, cb)))
                .collect()
        };

        if callbacks.is_empty() {
            return;
        }

        let reactions_invalidated = callbacks.len() as u64;

        if batch::is_batching() {
            batch::record_signals_changed(1);
            for (rank, cb) in callbacks {
                let callback_key = Rc::as_ptr(&cb) as *const () as usize;
                let source = self.clone();
                batch::defer_or_run_keyed(callback_key, rank, move || {
                    let latest = source.get();
                    cb(&latest);
                });
            }
            return;
        }

        let value = self.inner.borrow().value.clone();
        let propagation_start = Instant::now();
        let _span = info_span!(
            "tardis.propagate",
            signals_changed = 1_u64,
            reactions_invalidated,
            duration_us = tracing::field::Empty
        )
        .entered();

        for (_, cb) in &callbacks {
            cb(&value);
        }

        let duration_us = propagation_start.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        info!(
            tardis_propagation_duration_us = duration_us,
            signals_changed = 1_u64,
            reactions_invalidated,
            "tardis propagation duration"
        );
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping it drops the strong `Rc` behind the callback, so the `Weak` in
/// the observable's list fails to upgrade on the next notification.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
