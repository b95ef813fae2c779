// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the session loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! controller calls as it works. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::geometry::{PixelSize, ResizeDecision};
use crate::graphics::{GraphicsError, Recovery};
use crate::lifecycle::{LifecycleState, PlatformCommand};
use crate::pacing::Paced;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a platform command was handled.
#[derive(Clone, Copy, Debug)]
pub struct CommandEvent {
    /// When handling finished.
    pub at: HostTime,
    /// The command.
    pub command: PlatformCommand,
    /// State before the command.
    pub before: LifecycleState,
    /// State after the command and its effects.
    pub after: LifecycleState,
}

/// Emitted when a resize poll saw a size change.
#[derive(Clone, Copy, Debug)]
pub struct ResizeEvent {
    /// When the poll ran.
    pub at: HostTime,
    /// Drawable size measured by the poll.
    pub measured: PixelSize,
    /// Whether the poll came from a content-rect change.
    pub forced: bool,
    /// What the debouncer decided.
    pub decision: ResizeDecision,
}

/// Emitted after a graphics error was recovered from.
#[derive(Clone, Copy, Debug)]
pub struct RecoveryEvent {
    /// When recovery finished.
    pub at: HostTime,
    /// The error that triggered recovery.
    pub error: GraphicsError,
    /// The recovery performed.
    pub recovery: Recovery,
}

/// Emitted at the end of every animating loop iteration.
#[derive(Clone, Copy, Debug)]
pub struct FrameEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// When the iteration finished.
    pub at: HostTime,
    /// Whether the render callback swapped buffers itself.
    pub swapped: bool,
    /// Pacing outcome, when the pacer ran.
    pub paced: Option<Paced>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the session loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a platform command was handled.
    fn on_command(&mut self, e: &CommandEvent) {
        _ = e;
    }

    /// Called when a resize poll saw a changed size.
    fn on_resize(&mut self, e: &ResizeEvent) {
        _ = e;
    }

    /// Called after graphics recovery.
    fn on_graphics_recovery(&mut self, e: &RecoveryEvent) {
        _ = e;
    }

    /// Called at the end of an animating frame.
    fn on_frame(&mut self, e: &FrameEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Borrows this tracer for a shorter scope.
    #[inline]
    #[must_use]
    pub fn reborrow(&mut self) -> Tracer<'_> {
        #[cfg(feature = "trace")]
        {
            Tracer {
                sink: match &mut self.sink {
                    Some(sink) => Some(&mut **sink),
                    None => None,
                },
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            Tracer {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CommandEvent`].
    #[inline]
    pub fn command(&mut self, e: &CommandEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_command(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ResizeEvent`].
    #[inline]
    pub fn resize(&mut self, e: &ResizeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_resize(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RecoveryEvent`].
    #[inline]
    pub fn graphics_recovery(&mut self, e: &RecoveryEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_graphics_recovery(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameEvent`].
    #[inline]
    pub fn frame(&mut self, e: &FrameEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;

    fn sample_frame() -> FrameEvent {
        FrameEvent {
            frame_index: 7,
            at: HostTime(1_000),
            swapped: false,
            paced: Some(Paced {
                reference: HostTime(900),
                slept: Duration(100),
            }),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame(&sample_frame());
        sink.on_command(&CommandEvent {
            at: HostTime(0),
            command: PlatformCommand::Start,
            before: LifecycleState::NoWindow,
            after: LifecycleState::NoWindow,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame(&sample_frame());
        tracer.reborrow().frame(&sample_frame());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_through_reborrow() {
        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame(&mut self, e: &FrameEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame(&sample_frame());
        tracer.reborrow().frame(&sample_frame());
        drop(tracer);
        assert_eq!(sink.frames, [7, 7]);
    }
}
