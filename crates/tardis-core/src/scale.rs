#![forbid(unsafe_code)]

//! Timestamp ↔ pixel mapping.
//!
//! The engine only needs a bijection between the time axis and chart
//! pixels: clicks are inverted into timestamps, and revisions, head and
//! base are projected back into pixels for proximity tests and markers.
//! [`TimeScale`] is that seam. [`LinearTimeScale`] is the stock
//! implementation, refitted whenever the revision list or the viewport
//! width changes.
//!
//! # Degenerate inputs
//!
//! - An empty or single-instant domain projects everything onto the left
//!   edge and inverts every pixel to the domain start.
//! - A zero-width range inverts every pixel to the domain start.
//! - Inversions that would overflow the timestamp range saturate at the
//!   nearer domain edge.

use chrono::TimeDelta;

use crate::revision::{self, Revision, Timestamp};

/// Horizontal chart coordinate in pixels.
pub type Pixel = f64;

/// A bijection between timestamps and pixels.
pub trait TimeScale {
    /// Project a timestamp onto the x axis.
    fn scale(&self, at: Timestamp) -> Pixel;

    /// Map an x offset back to a timestamp.
    fn invert(&self, px: Pixel) -> Timestamp;
}

/// Linear mapping from `[start, end]` onto `[left, right]` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTimeScale {
    start: Timestamp,
    end: Timestamp,
    left: Pixel,
    right: Pixel,
}

impl LinearTimeScale {
    /// Create a scale from an explicit domain and pixel range.
    #[must_use]
    pub fn new(domain: (Timestamp, Timestamp), range: (Pixel, Pixel)) -> Self {
        Self {
            start: domain.0,
            end: domain.1,
            left: range.0,
            right: range.1,
        }
    }

    /// Fit the domain to the extent of `revisions` and the range to
    /// `[0, width]`.
    ///
    /// With no revisions the domain collapses to the Unix epoch.
    #[must_use]
    pub fn fit(revisions: &[Revision], width: Pixel) -> Self {
        let (start, end) = revision::extent(revisions).unwrap_or_default();
        Self::new((start, end), (0.0, width))
    }

    /// Domain as `(start, end)`.
    #[must_use]
    pub const fn domain(&self) -> (Timestamp, Timestamp) {
        (self.start, self.end)
    }

    /// Pixel range as `(left, right)`.
    #[must_use]
    pub const fn range(&self) -> (Pixel, Pixel) {
        (self.left, self.right)
    }

    fn span_ms(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64
    }
}

impl TimeScale for LinearTimeScale {
    fn scale(&self, at: Timestamp) -> Pixel {
        let span = self.span_ms();
        if span == 0.0 {
            return self.left;
        }
        let t = (at - self.start).num_milliseconds() as f64 / span;
        self.left + t * (self.right - self.left)
    }

    fn invert(&self, px: Pixel) -> Timestamp {
        let width = self.right - self.left;
        if width == 0.0 || !px.is_finite() {
            return self.start;
        }
        let offset_ms = ((px - self.left) / width * self.span_ms()).round();
        // `as` saturates; try_milliseconds rejects what TimeDelta cannot hold.
        TimeDelta::try_milliseconds(offset_ms as i64)
            .and_then(|delta| self.start.checked_add_signed(delta))
            .unwrap_or(if offset_ms < 0.0 { self.start } else { self.end })
    }
}
