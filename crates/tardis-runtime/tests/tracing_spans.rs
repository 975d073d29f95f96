#![forbid(unsafe_code)]

//! Span and event shape emitted while dispatching events.
//!
//! Verifies the `tardis.dispatch` → `tardis.propagate` hierarchy, the
//! required span fields, and the log levels used for resets, range changes
//! and dropped clicks.
//!
//! Run:
//!   cargo test -p tardis-runtime --test tracing_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tardis_runtime::{Revision, Tardis, TardisConfig, TardisEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::{Duration, Instant};

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

#[derive(Default, Clone)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    span_index: Arc<Mutex<HashMap<u64, usize>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans().into_iter().filter(|s| s.name == name).collect()
    }

    fn events_with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        for field in attrs.metadata().fields() {
            fields.entry(field.name().to_string()).or_default();
        }

        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|pid| ctx.span(pid))
            .map(|span_ref| span_ref.name().to_string());

        let mut spans = self.spans.lock().unwrap();
        self.span_index
            .lock()
            .unwrap()
            .insert(id.into_u64(), spans.len());
        spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields,
            parent_name,
        });
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);
        let index = self.span_index.lock().unwrap();
        if let Some(&idx) = index.get(&id.into_u64())
            && let Some(span) = self.spans.lock().unwrap().get_mut(idx)
        {
            span.fields.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn capture(f: impl FnOnce()) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn engine() -> Tardis {
    let mut tardis = Tardis::new(TardisConfig::default());
    tardis.set_revisions(vec![
        Revision::new(1, "census", chrono::DateTime::from_timestamp(0, 0).unwrap(), "ada"),
        Revision::new(2, "census", chrono::DateTime::from_timestamp(800, 0).unwrap(), "ada"),
    ]);
    tardis
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn dispatch_span_carries_event_kind() {
    let mut tardis = engine();
    let handle = capture(|| {
        tardis.handle(TardisEvent::Click { offset: 100.0 }, Instant::now());
    });

    let dispatch = handle.spans_named("tardis.dispatch");
    assert_eq!(dispatch.len(), 1);
    assert_eq!(dispatch[0].fields.get("kind").map(String::as_str), Some("click"));
    assert_eq!(dispatch[0].parent_name, None, "dispatch is a root span");
}

#[test]
fn propagation_nests_under_dispatch_with_counters() {
    let mut tardis = engine();
    let handle = capture(|| {
        tardis.handle(TardisEvent::Click { offset: 100.0 }, Instant::now());
    });

    let propagate = handle.spans_named("tardis.propagate");
    assert_eq!(propagate.len(), 1, "one flush per dispatched event");
    let span = &propagate[0];
    assert_eq!(span.parent_name.as_deref(), Some("tardis.dispatch"));
    for field in ["signals_changed", "reactions_invalidated", "rounds", "duration_us"] {
        let value = span.fields.get(field).unwrap_or_else(|| panic!("missing {field}"));
        assert!(!value.is_empty(), "{field} recorded");
    }
    let rounds: u32 = span.fields["rounds"].parse().unwrap();
    assert!(rounds >= 2, "range then snapshot recompute");
}

#[test]
fn range_change_logs_at_debug() {
    let mut tardis = engine();
    let handle = capture(|| {
        tardis.handle(TardisEvent::Click { offset: 100.0 }, Instant::now());
    });

    let constrained = handle.events_with_message("range constrained");
    assert_eq!(constrained.len(), 1);
    assert_eq!(constrained[0].level, tracing::Level::DEBUG);
    assert!(constrained[0].fields.contains_key("from"));
    assert!(constrained[0].fields.contains_key("to"));
}

#[test]
fn reset_logs_at_info() {
    let mut tardis = engine();
    let handle = capture(|| {
        tardis.handle(TardisEvent::Reset, Instant::now());
    });

    let resets = handle.events_with_message("selection reset");
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].level, tracing::Level::INFO);
    assert_eq!(resets[0].fields.get("generation").map(String::as_str), Some("1"));
    assert_eq!(resets[0].parent_span_name.as_deref(), Some("tardis.dispatch"));
}

#[test]
fn dropped_click_warns() {
    let mut tardis = engine();
    let handle = capture(|| {
        tardis.handle(TardisEvent::Click { offset: f64::NAN }, Instant::now());
    });

    let warnings: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("dropped"));
    assert!(handle.spans_named("tardis.propagate").is_empty(), "nothing changed");
}

#[test]
fn debounce_fire_gets_its_own_dispatch_span() {
    let mut tardis = engine();
    let t0 = Instant::now();
    tardis.handle(TardisEvent::PointerMove { offset: 10.0 }, t0);

    let handle = capture(|| {
        tardis.tick(t0 + Duration::from_millis(300));
    });

    let dispatch = handle.spans_named("tardis.dispatch");
    assert_eq!(dispatch.len(), 1);
    assert_eq!(dispatch[0].fields.get("kind").map(String::as_str), Some("debounce"));
    assert!(!handle.events_with_message("debounce fired").is_empty());
}
