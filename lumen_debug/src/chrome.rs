// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! Converts a binary recording (from [`RecorderSink`](crate::recorder::RecorderSink))
//! into JSON that can be loaded in `chrome://tracing` or
//! [Perfetto](https://ui.perfetto.dev/).
//!
//! Timestamps are host nanoseconds converted to microseconds. Frames that
//! were paced become complete (`"X"`) events spanning the sleep; everything
//! else is an instant (`"i"`) event.

use std::io::{self, Write};

use lumen_core::geometry::ResizeDecision;
use lumen_core::time::{Duration, HostTime};
use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const PID: u32 = 1;
const TID_LIFECYCLE: u32 = 1;
const TID_FRAMES: u32 = 2;

/// Exports a binary recording as Chrome Trace Event Format JSON.
///
/// Writes a JSON array of trace events to `writer`.
///
/// # Errors
///
/// Returns any I/O or serialization error from `writer`.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(|event| to_trace_event(&event)).collect();
    serde_json::to_writer_pretty(writer, &events).map_err(io::Error::other)
}

fn micros(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn duration_micros(d: Duration) -> f64 {
    d.nanos() as f64 / 1000.0
}

fn instant(name: &str, cat: &str, tid: u32, at: HostTime, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": micros(at),
        "pid": PID,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn to_trace_event(event: &RecordedEvent) -> Value {
    match event {
        RecordedEvent::Command(e) => instant(
            e.command.name(),
            "Lifecycle",
            TID_LIFECYCLE,
            e.at,
            json!({
                "before": format!("{:?}", e.before),
                "after": format!("{:?}", e.after),
            }),
        ),
        RecordedEvent::Resize(e) => {
            let decision = match e.decision {
                ResizeDecision::Unchanged => json!("unchanged"),
                ResizeDecision::Deferred { remaining } => json!({ "deferred": remaining }),
                ResizeDecision::Apply(size) => {
                    json!({ "apply": [size.width, size.height] })
                }
            };
            instant(
                "resize",
                "Geometry",
                TID_LIFECYCLE,
                e.at,
                json!({
                    "measured": [e.measured.width, e.measured.height],
                    "forced": e.forced,
                    "decision": decision,
                }),
            )
        }
        RecordedEvent::Recovery(e) => instant(
            "graphics-recovery",
            "Graphics",
            TID_LIFECYCLE,
            e.at,
            json!({
                "error": e.error.to_string(),
                "recovery": format!("{:?}", e.recovery),
            }),
        ),
        RecordedEvent::Frame(e) => match e.paced {
            Some(paced) => {
                let dur = duration_micros(paced.slept);
                json!({
                    "ph": "X",
                    "name": format!("frame {}", e.frame_index),
                    "cat": "Frame",
                    "ts": micros(e.at) - dur,
                    "dur": dur,
                    "pid": PID,
                    "tid": TID_FRAMES,
                    "args": {
                        "swapped": e.swapped,
                        "reference_us": micros(paced.reference),
                    },
                })
            }
            None => instant(
                &format!("frame {}", e.frame_index),
                "Frame",
                TID_FRAMES,
                e.at,
                json!({ "swapped": e.swapped }),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use lumen_core::geometry::PixelSize;
    use lumen_core::graphics::{ErrorCode, GraphicsError, Recovery};
    use lumen_core::lifecycle::{LifecycleState, PlatformCommand};
    use lumen_core::pacing::Paced;
    use lumen_core::trace::{CommandEvent, FrameEvent, RecoveryEvent, ResizeEvent, TraceSink};

    fn export_to_json(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn empty_recording_is_empty_array() {
        let rec = RecorderSink::new();
        assert!(export_to_json(&rec).is_empty());
    }

    #[test]
    fn commands_are_instant_events() {
        let mut rec = RecorderSink::new();
        rec.on_command(&CommandEvent {
            at: HostTime(2_000_000),
            command: PlatformCommand::WindowCreated,
            before: LifecycleState::NoWindow,
            after: LifecycleState::WindowNoContext,
        });

        let events = export_to_json(&rec);
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e["ph"], "i");
        assert_eq!(e["name"], "window-created");
        assert_eq!(e["cat"], "Lifecycle");
        assert_eq!(e["ts"], 2000.0);
        assert_eq!(e["args"]["after"], "WindowNoContext");
    }

    #[test]
    fn paced_frame_spans_its_sleep() {
        let mut rec = RecorderSink::new();
        rec.on_frame(&FrameEvent {
            frame_index: 5,
            at: HostTime(20_000_000),
            swapped: false,
            paced: Some(Paced {
                reference: HostTime(20_000_000),
                slept: Duration(4_000_000),
            }),
        });
        rec.on_frame(&FrameEvent {
            frame_index: 6,
            at: HostTime(36_000_000),
            swapped: true,
            paced: None,
        });

        let events = export_to_json(&rec);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["ph"], "X");
        assert_eq!(events[0]["ts"], 16_000.0);
        assert_eq!(events[0]["dur"], 4_000.0);
        assert_eq!(events[0]["tid"], TID_FRAMES);
        assert_eq!(events[1]["ph"], "i");
        assert_eq!(events[1]["name"], "frame 6");
        assert_eq!(events[1]["args"]["swapped"], true);
    }

    #[test]
    fn resize_and_recovery_carry_details() {
        let mut rec = RecorderSink::new();
        rec.on_resize(&ResizeEvent {
            at: HostTime(1_000),
            measured: PixelSize::new(640, 480),
            forced: true,
            decision: ResizeDecision::Apply(PixelSize::new(640, 480)),
        });
        rec.on_graphics_recovery(&RecoveryEvent {
            at: HostTime(2_000),
            error: GraphicsError::Swap(ErrorCode::BadSurface),
            recovery: Recovery::RecreateSurface,
        });

        let events = export_to_json(&rec);
        assert_eq!(events[0]["cat"], "Geometry");
        assert_eq!(events[0]["args"]["decision"]["apply"], json!([640, 480]));
        assert_eq!(events[0]["args"]["forced"], true);
        assert_eq!(events[1]["cat"], "Graphics");
        assert_eq!(events[1]["args"]["recovery"], "RecreateSurface");
        assert!(
            events[1]["args"]["error"]
                .as_str()
                .is_some_and(|s| s.starts_with("buffer swap failed"))
        );
    }
}
