#![forbid(unsafe_code)]

//! Session traces: record the raw inputs of a [`Tardis`] session and feed
//! them back into a fresh engine.
//!
//! A trace is JSONL. Line one is a `trace_header` carrying the session name
//! and starting chart width; the last line is a `trace_summary`. Every line
//! in between is one input (an event, a resize or a host tick) stamped with
//! nanoseconds since the session anchor. Absent pixel offsets are `null`.
//! Files may be gzip-compressed; the reader sniffs the gzip magic.
//!
//! ```ignore
//! let mut writer = EventTraceWriter::gzip("session.jsonl.gz", "bug-1234", 800.0)?;
//! writer.record_timed(&timed, anchor)?;
//! writer.record(TraceInput::Tick, elapsed_ns(anchor, now))?;
//! writer.finish()?.finish()?;
//!
//! let trace = EventTraceReader::open("session.jsonl.gz")?;
//! let mut tardis = Tardis::new(TardisConfig { viewport_width: trace.viewport_width().unwrap_or(800.0), ..config });
//! EventReplayer::from_trace(&trace).replay_into(&mut tardis, Instant::now());
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tardis_core::{Pixel, TardisEvent, TimedEvent, option};
use web_time::{Duration, Instant};

use crate::engine::Tardis;

pub const SCHEMA_VERSION: &str = "tardis-trace-v1";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One line of a trace file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceRecord {
    #[serde(rename = "trace_header")]
    Header {
        schema_version: String,
        session_name: String,
        viewport_width: Pixel,
    },
    PointerMove {
        ts_ns: u64,
        offset: Option<Pixel>,
    },
    PointerLeave {
        ts_ns: u64,
    },
    Click {
        ts_ns: u64,
        offset: Option<Pixel>,
    },
    /// `base` is the checkbox state.
    ModeToggle {
        ts_ns: u64,
        base: bool,
    },
    Reset {
        ts_ns: u64,
    },
    TooltipEnter {
        ts_ns: u64,
    },
    TooltipLeave {
        ts_ns: u64,
    },
    Resize {
        ts_ns: u64,
        width: Pixel,
    },
    Tick {
        ts_ns: u64,
    },
    #[serde(rename = "trace_summary")]
    Summary {
        total_events: u64,
        total_duration_ns: u64,
    },
}

/// Something the host did to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceInput {
    Event(TardisEvent),
    Resize(Pixel),
    Tick,
}

impl TraceInput {
    /// Stamp this input for the wire. Non-finite offsets become `null`.
    #[must_use]
    pub fn at(self, ts_ns: u64) -> TraceRecord {
        match self {
            TraceInput::Event(TardisEvent::PointerMove { offset }) => TraceRecord::PointerMove {
                ts_ns,
                offset: option(offset),
            },
            TraceInput::Event(TardisEvent::PointerLeave) => TraceRecord::PointerLeave { ts_ns },
            TraceInput::Event(TardisEvent::Click { offset }) => TraceRecord::Click {
                ts_ns,
                offset: option(offset),
            },
            TraceInput::Event(TardisEvent::ModeToggle(base)) => {
                TraceRecord::ModeToggle { ts_ns, base }
            }
            TraceInput::Event(TardisEvent::Reset) => TraceRecord::Reset { ts_ns },
            TraceInput::Event(TardisEvent::TooltipEnter) => TraceRecord::TooltipEnter { ts_ns },
            TraceInput::Event(TardisEvent::TooltipLeave) => TraceRecord::TooltipLeave { ts_ns },
            TraceInput::Resize(width) => TraceRecord::Resize { ts_ns, width },
            TraceInput::Tick => TraceRecord::Tick { ts_ns },
        }
    }

    /// Apply to `tardis` as if it happened at `now`.
    pub fn apply(self, tardis: &mut Tardis, now: Instant) {
        match self {
            TraceInput::Event(event) => tardis.handle(event, now),
            TraceInput::Resize(width) => {
                tardis.resize(width);
            }
            TraceInput::Tick => {
                tardis.tick(now);
            }
        }
    }
}

impl TraceRecord {
    /// The stamped input on this line; `None` for header and summary.
    ///
    /// A `null` offset comes back as `NaN`, which the engine reads as absent.
    #[must_use]
    pub fn input(&self) -> Option<(TraceInput, u64)> {
        let offset = |o: Option<Pixel>| o.unwrap_or(f64::NAN);
        let (input, ts_ns) = match *self {
            TraceRecord::PointerMove { ts_ns, offset: o } => (
                TraceInput::Event(TardisEvent::PointerMove { offset: offset(o) }),
                ts_ns,
            ),
            TraceRecord::PointerLeave { ts_ns } => {
                (TraceInput::Event(TardisEvent::PointerLeave), ts_ns)
            }
            TraceRecord::Click { ts_ns, offset: o } => (
                TraceInput::Event(TardisEvent::Click { offset: offset(o) }),
                ts_ns,
            ),
            TraceRecord::ModeToggle { ts_ns, base } => {
                (TraceInput::Event(TardisEvent::ModeToggle(base)), ts_ns)
            }
            TraceRecord::Reset { ts_ns } => (TraceInput::Event(TardisEvent::Reset), ts_ns),
            TraceRecord::TooltipEnter { ts_ns } => {
                (TraceInput::Event(TardisEvent::TooltipEnter), ts_ns)
            }
            TraceRecord::TooltipLeave { ts_ns } => {
                (TraceInput::Event(TardisEvent::TooltipLeave), ts_ns)
            }
            TraceRecord::Resize { ts_ns, width } => (TraceInput::Resize(width), ts_ns),
            TraceRecord::Tick { ts_ns } => (TraceInput::Tick, ts_ns),
            TraceRecord::Header { .. } | TraceRecord::Summary { .. } => return None,
        };
        Some((input, ts_ns))
    }
}

/// Nanoseconds from `anchor` to `at`; zero if `at` is earlier.
#[must_use]
pub fn elapsed_ns(anchor: Instant, at: Instant) -> u64 {
    u64::try_from(at.saturating_duration_since(anchor).as_nanos()).unwrap_or(u64::MAX)
}

/// Appends stamped inputs to a JSONL sink.
pub struct EventTraceWriter<W: Write> {
    out: BufWriter<W>,
    inputs: u64,
    span_ns: Option<(u64, u64)>,
}

impl EventTraceWriter<File> {
    pub fn plain(
        path: impl AsRef<Path>,
        session_name: &str,
        viewport_width: Pixel,
    ) -> io::Result<Self> {
        Self::from_writer(File::create(path)?, session_name, viewport_width)
    }
}

impl EventTraceWriter<GzEncoder<File>> {
    /// Call `finish()` on the returned encoder after [`EventTraceWriter::finish`]
    /// to write the gzip trailer.
    pub fn gzip(
        path: impl AsRef<Path>,
        session_name: &str,
        viewport_width: Pixel,
    ) -> io::Result<Self> {
        let encoder = GzEncoder::new(File::create(path)?, Compression::fast());
        Self::from_writer(encoder, session_name, viewport_width)
    }
}

impl<W: Write> EventTraceWriter<W> {
    pub fn from_writer(sink: W, session_name: &str, viewport_width: Pixel) -> io::Result<Self> {
        let mut writer = Self {
            out: BufWriter::new(sink),
            inputs: 0,
            span_ns: None,
        };
        writer.write_line(&TraceRecord::Header {
            schema_version: SCHEMA_VERSION.to_owned(),
            session_name: session_name.to_owned(),
            viewport_width,
        })?;
        Ok(writer)
    }

    pub fn record(&mut self, input: TraceInput, ts_ns: u64) -> io::Result<()> {
        self.write_line(&input.at(ts_ns))?;
        self.inputs += 1;
        self.span_ns = Some(match self.span_ns {
            Some((first, _)) => (first, ts_ns),
            None => (ts_ns, ts_ns),
        });
        Ok(())
    }

    /// Record an event stamped relative to the session anchor.
    pub fn record_timed(&mut self, timed: &TimedEvent, anchor: Instant) -> io::Result<()> {
        self.record(TraceInput::Event(timed.event), elapsed_ns(anchor, timed.at))
    }

    #[inline]
    pub fn inputs(&self) -> u64 {
        self.inputs
    }

    /// Write the summary line, flush and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        let total_duration_ns = self
            .span_ns
            .map_or(0, |(first, last)| last.saturating_sub(first));
        self.write_line(&TraceRecord::Summary {
            total_events: self.inputs,
            total_duration_ns,
        })?;
        self.out.into_inner().map_err(|e| e.into_error())
    }

    fn write_line(&mut self, record: &TraceRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")
    }
}

/// Loads whole trace files, plain or gzip.
pub struct EventTraceReader;

impl EventTraceReader {
    pub fn open(path: impl AsRef<Path>) -> io::Result<TraceFile> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<TraceFile> {
        let mut text = Vec::new();
        if data.starts_with(&GZIP_MAGIC) {
            GzDecoder::new(data).read_to_end(&mut text)?;
        } else {
            text.extend_from_slice(data);
        }
        let records = serde_json::Deserializer::from_slice(&text)
            .into_iter::<TraceRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TraceFile { records })
    }
}

/// A parsed trace.
#[derive(Debug, Clone)]
pub struct TraceFile {
    records: Vec<TraceRecord>,
}

impl TraceFile {
    #[inline]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    #[must_use]
    pub fn session_name(&self) -> Option<&str> {
        match self.records.first()? {
            TraceRecord::Header { session_name, .. } => Some(session_name),
            _ => None,
        }
    }

    /// Chart width the session started with.
    #[must_use]
    pub fn viewport_width(&self) -> Option<Pixel> {
        match self.records.first()? {
            TraceRecord::Header { viewport_width, .. } => Some(*viewport_width),
            _ => None,
        }
    }

    /// Input count from the summary line; `None` for a truncated trace.
    #[must_use]
    pub fn total_events(&self) -> Option<u64> {
        match self.records.last()? {
            TraceRecord::Summary { total_events, .. } => Some(*total_events),
            _ => None,
        }
    }

    pub fn inputs_with_timestamps(&self) -> Vec<(TraceInput, u64)> {
        self.records.iter().filter_map(TraceRecord::input).collect()
    }
}

/// Feeds a trace back into an engine in recorded order.
///
/// Offsets are mapped onto a caller-chosen anchor, so replay runs as fast
/// as the engine does and never sleeps.
#[derive(Debug, Clone)]
pub struct EventReplayer {
    inputs: Vec<(TraceInput, u64)>,
    next: usize,
}

impl EventReplayer {
    #[must_use]
    pub fn new(inputs: Vec<(TraceInput, u64)>) -> Self {
        Self { inputs, next: 0 }
    }

    #[must_use]
    pub fn from_trace(trace: &TraceFile) -> Self {
        Self::new(trace.inputs_with_timestamps())
    }

    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.next >= self.inputs.len()
    }

    /// Apply every pending input stamped at or before `until_ns`. Returns
    /// how many were applied.
    pub fn replay_until(&mut self, tardis: &mut Tardis, anchor: Instant, until_ns: u64) -> usize {
        let start = self.next;
        while let Some(&(input, ts_ns)) = self.inputs.get(self.next) {
            if ts_ns > until_ns {
                break;
            }
            let now = anchor
                .checked_add(Duration::from_nanos(ts_ns))
                .unwrap_or(anchor);
            input.apply(tardis, now);
            self.next += 1;
        }
        let applied = self.next - start;
        tracing::debug!(applied, until_ns, "trace replayed");
        applied
    }

    /// Apply everything left.
    pub fn replay_into(&mut self, tardis: &mut Tardis, anchor: Instant) -> usize {
        self.replay_until(tardis, anchor, u64::MAX)
    }
}
