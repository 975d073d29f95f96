#![forbid(unsafe_code)]

//! Property tests for the option helpers, revision extents and the linear
//! time scale.
//!
//! Run:
//!   cargo test -p tardis-core --test value_laws

use chrono::{DateTime, TimeDelta};
use proptest::prelude::*;
use tardis_core::{LinearTimeScale, OptionExt, Revision, TimeScale, Timestamp, option, revision};

fn at_ms(ms: i64) -> Timestamp {
    DateTime::from_timestamp_millis(ms).unwrap()
}

fn any_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        6 => any::<f64>(),
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

proptest! {
    #[test]
    fn option_is_present_exactly_for_finite(x in any_f64()) {
        prop_assert_eq!(option(x).is_some(), x.is_finite());
        if let Some(v) = option(x) {
            prop_assert_eq!(v.to_bits(), x.to_bits());
        }
    }

    #[test]
    fn option_flattens_nested(x in prop::option::of(any_f64())) {
        prop_assert_eq!(option(x), x.filter(|v| v.is_finite()));
    }

    #[test]
    fn get_agrees_with_presence(x in any_f64()) {
        prop_assert_eq!(option(x).get().is_ok(), x.is_finite());
    }

    #[test]
    fn merge_never_erases_self(a in prop::option::of(0_i64..100), b in prop::option::of(0_i64..100)) {
        let merged = a.merge_with(b, i64::max);
        prop_assert_eq!(merged.is_some(), a.is_some());
        if let (Some(a), Some(b)) = (a, b) {
            prop_assert_eq!(merged, Some(a.max(b)));
        }
    }

    #[test]
    fn extent_bounds_every_revision(ms in prop::collection::vec(-1_000_000_i64..1_000_000, 1..30)) {
        let revisions: Vec<Revision> = ms
            .iter()
            .enumerate()
            .map(|(i, &t)| Revision::new(i as u64, "census", at_ms(t), "ada"))
            .collect();
        let (lo, hi) = revision::extent(&revisions).unwrap();
        prop_assert!(revisions.iter().all(|r| lo <= r.created_at && r.created_at <= hi));
        prop_assert!(revisions.iter().any(|r| r.created_at == lo));
        prop_assert!(revisions.iter().any(|r| r.created_at == hi));
    }

    #[test]
    fn strictly_between_excludes_endpoints(t in -1000_i64..1000, base in -1000_i64..1000, len in 0_i64..1000) {
        let r = Revision::new(1, "census", at_ms(t), "ada");
        let inside = r.is_strictly_between(at_ms(base), at_ms(base + len));
        prop_assert_eq!(inside, base < t && t < base + len);
    }

    #[test]
    fn unit_scale_inverts_exactly(start in -1_000_000_i64..1_000_000, ms in 0_i64..=1024) {
        let scale = LinearTimeScale::new((at_ms(start), at_ms(start + 1024)), (0.0, 1024.0));
        let t = at_ms(start + ms);
        prop_assert_eq!(scale.scale(t), ms as f64);
        prop_assert_eq!(scale.invert(ms as f64), t);
    }

    #[test]
    fn scale_is_monotone(
        span in 1_i64..10_000_000_000,
        width in 1.0_f64..10_000.0,
        a in 0.0_f64..1.0,
        b in 0.0_f64..1.0,
    ) {
        let scale = LinearTimeScale::new((at_ms(0), at_ms(span)), (0.0, width));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let ta = at_ms((a * span as f64) as i64);
        let tb = at_ms((b * span as f64) as i64);
        prop_assert!(scale.scale(ta) <= scale.scale(tb));
        prop_assert!(scale.invert(a * width) <= scale.invert(b * width));
    }

    #[test]
    fn invert_round_trips_within_one_pixel_of_time(
        span in 1_000_i64..10_000_000_000,
        width in 1.0_f64..4_000.0,
        px in 0.0_f64..1.0,
    ) {
        let scale = LinearTimeScale::new((at_ms(0), at_ms(span)), (0.0, width));
        let px = px * width;
        let back = scale.scale(scale.invert(px));
        // invert rounds to whole milliseconds.
        let ms_per_px = span as f64 / width;
        prop_assert!((back - px).abs() <= 1.0 / ms_per_px + 1e-6, "{px} -> {back}");
    }

    #[test]
    fn invert_never_panics(px in any_f64(), width in any_f64()) {
        let scale = LinearTimeScale::new((at_ms(0), at_ms(86_400_000)), (0.0, width));
        let t = scale.invert(px);
        if !px.is_finite() {
            prop_assert_eq!(t, at_ms(0));
        }
    }
}

#[test]
fn invert_saturates_far_outside_the_range() {
    let scale = LinearTimeScale::new((at_ms(0), at_ms(1000)), (0.0, 10.0));
    assert_eq!(scale.invert(f64::MAX), at_ms(1000));
    assert_eq!(scale.invert(-f64::MAX), at_ms(0));
    assert_eq!(scale.invert(-5.0), at_ms(0) - TimeDelta::milliseconds(500));
}
