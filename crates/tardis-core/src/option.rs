#![forbid(unsafe_code)]

//! Presence/absence helpers layered on [`Option`].
//!
//! Everything in Tardis that may be "not chosen yet" is an `Option<T>`.
//! The standard combinators already cover the monadic contract:
//!
//! | Contract          | `Option` method      |
//! |-------------------|----------------------|
//! | `map`             | [`Option::map`]      |
//! | `flatMap`         | [`Option::and_then`] |
//! | `filter`          | [`Option::filter`]   |
//! | `getOrElse(d)`    | [`Option::unwrap_or`]|
//! | `orElse(alt)`     | [`Option::or`]       |
//! | `isDefined`       | [`Option::is_some`]  |
//! | `isEmpty`         | [`Option::is_none`]  |
//!
//! This module adds the two pieces the standard library leaves open:
//!
//! - [`option`]: the smart constructor. Raw values coming from the event
//!   source (pixel offsets, labels) pass through here exactly once; it is the
//!   only place that decides what counts as "empty".
//! - [`OptionExt::get`]: extraction that reports [`NoSuchElement`] instead of
//!   panicking. Reaching the error is a caller bug; engine code composes via
//!   `map`/`and_then`/`unwrap_or` and never calls it.

use std::fmt;

/// Returned by [`OptionExt::get`] when the value is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoSuchElement;

impl fmt::Display for NoSuchElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no such element: get() called on an absent value")
    }
}

impl std::error::Error for NoSuchElement {}

/// Values that carry their own "null" sentinel.
pub trait Sentinel: Sized {
    /// Present value produced by [`option`].
    type Value;

    /// Map the sentinel to `None`, anything else to `Some`.
    fn into_present(self) -> Option<Self::Value>;
}

impl Sentinel for f64 {
    type Value = f64;

    fn into_present(self) -> Option<f64> {
        Some(self).filter(|v| v.is_finite())
    }
}

impl Sentinel for f32 {
    type Value = f32;

    fn into_present(self) -> Option<f32> {
        Some(self).filter(|v| v.is_finite())
    }
}

impl Sentinel for String {
    type Value = String;

    fn into_present(self) -> Option<String> {
        Some(self).filter(|s| !s.is_empty())
    }
}

impl<'a> Sentinel for &'a str {
    type Value = &'a str;

    fn into_present(self) -> Option<&'a str> {
        Some(self).filter(|s| !s.is_empty())
    }
}

impl<T: Sentinel> Sentinel for Option<T> {
    type Value = T::Value;

    fn into_present(self) -> Option<T::Value> {
        self.and_then(Sentinel::into_present)
    }
}

/// Smart constructor: lift a raw value into `Option`, mapping its sentinel
/// (non-finite float, empty string, nested `None`) to absence.
///
/// ```
/// use tardis_core::option;
///
/// assert_eq!(option(12.5_f64), Some(12.5));
/// assert_eq!(option(f64::NAN), None);
/// assert_eq!(option(Some("")), None);
/// ```
#[must_use]
pub fn option<T: Sentinel>(value: T) -> Option<T::Value> {
    value.into_present()
}

/// Extension methods for [`Option`].
pub trait OptionExt<T> {
    /// Extract the value, failing with [`NoSuchElement`] when absent.
    ///
    /// Only call this after presence has been established; prefer `map`,
    /// `and_then` or `unwrap_or` everywhere else.
    fn get(self) -> Result<T, NoSuchElement>;

    /// Combine with another option when both are present, otherwise keep
    /// `self` untouched. Absence on the `other` side never erases `self`.
    fn merge_with(self, other: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get(self) -> Result<T, NoSuchElement> {
        self.ok_or(NoSuchElement)
    }

    fn merge_with(self, other: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
        match (self, other) {
            (Some(a), Some(b)) => Some(f(a, b)),
            (a, _) => a,
        }
    }
}
