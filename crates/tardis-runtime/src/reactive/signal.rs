#![forbid(unsafe_code)]

//! Read-only view over an [`Observable`].

use super::batch::Rank;
use super::observable::{Observable, Subscription};

/// Read-only handle to a reactive channel.
///
/// A `Signal` can be read and subscribed to, never written. Components keep
/// the [`Observable`] they own private and expose only `Signal`s, which keeps
/// every write to a channel inside its owner.
pub struct Signal<T> {
    source: Observable<T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal").field(&self.source).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub(crate) fn new(source: Observable<T>) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.source.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.source.version()
    }

    /// See [`Observable::subscribe`].
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.source.subscribe(callback)
    }

    pub(crate) fn subscribe_ranked(
        &self,
        rank: Rank,
        callback: impl Fn(&T) + 'static,
    ) -> Subscription {
        self.source.subscribe_ranked(rank, callback)
    }
}
