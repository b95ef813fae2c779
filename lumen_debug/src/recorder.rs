// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each led by a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].

use lumen_core::geometry::{PixelSize, ResizeDecision};
use lumen_core::graphics::{ConfigAttributes, ErrorCode, GraphicsError, Recovery};
use lumen_core::lifecycle::{LifecycleState, PlatformCommand};
use lumen_core::pacing::Paced;
use lumen_core::time::{Duration, HostTime};
use lumen_core::trace::{CommandEvent, FrameEvent, RecoveryEvent, ResizeEvent, TraceSink};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_COMMAND: u8 = 1;
const TAG_RESIZE: u8 = 2;
const TAG_RECOVERY: u8 = 3;
const TAG_FRAME: u8 = 4;

const COMMANDS: [PlatformCommand; 14] = [
    PlatformCommand::WindowCreated,
    PlatformCommand::WindowResized,
    PlatformCommand::WindowDestroyed,
    PlatformCommand::WindowRedrawNeeded,
    PlatformCommand::ContentRectChanged,
    PlatformCommand::GainedFocus,
    PlatformCommand::LostFocus,
    PlatformCommand::LowMemory,
    PlatformCommand::Start,
    PlatformCommand::Resume,
    PlatformCommand::Pause,
    PlatformCommand::Stop,
    PlatformCommand::Destroy,
    PlatformCommand::SaveState,
];

const STATES: [LifecycleState; 4] = [
    LifecycleState::NoWindow,
    LifecycleState::WindowNoContext,
    LifecycleState::ContextInactive,
    LifecycleState::Animating,
];

const RECOVERIES: [Recovery; 3] = [
    Recovery::RecreateSurface,
    Recovery::RecreateContext,
    Recovery::Reinitialize,
];

fn index_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    table
        .iter()
        .position(|v| v == value)
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(u8::MAX)
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_size(&mut self, size: PixelSize) {
        self.write_i32(size.width);
        self.write_i32(size.height);
    }

    fn write_code(&mut self, code: ErrorCode) {
        self.write_i32(code.raw());
    }

    fn write_error(&mut self, error: &GraphicsError) {
        match error {
            GraphicsError::NoDisplay => self.write_u8(0),
            GraphicsError::NoMatchingConfig(a) => {
                self.write_u8(1);
                for bits in [a.red, a.green, a.blue, a.alpha, a.depth, a.stencil, a.samples] {
                    self.write_i32(bits);
                }
            }
            GraphicsError::SurfaceCreation(code) => {
                self.write_u8(2);
                self.write_code(*code);
            }
            GraphicsError::ContextCreation(code) => {
                self.write_u8(3);
                self.write_code(*code);
            }
            GraphicsError::MakeCurrent(code) => {
                self.write_u8(4);
                self.write_code(*code);
            }
            GraphicsError::Swap(code) => {
                self.write_u8(5);
                self.write_code(*code);
            }
        }
    }

    fn write_decision(&mut self, decision: ResizeDecision) {
        match decision {
            ResizeDecision::Unchanged => self.write_u8(0),
            ResizeDecision::Deferred { remaining } => {
                self.write_u8(1);
                self.write_u32(remaining);
            }
            ResizeDecision::Apply(size) => {
                self.write_u8(2);
                self.write_size(size);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_command(&mut self, e: &CommandEvent) {
        self.write_u8(TAG_COMMAND);
        self.write_u64(e.at.nanos());
        self.write_u8(index_of(&COMMANDS, &e.command));
        self.write_u8(index_of(&STATES, &e.before));
        self.write_u8(index_of(&STATES, &e.after));
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.write_u8(TAG_RESIZE);
        self.write_u64(e.at.nanos());
        self.write_size(e.measured);
        self.write_u8(u8::from(e.forced));
        self.write_decision(e.decision);
    }

    fn on_graphics_recovery(&mut self, e: &RecoveryEvent) {
        self.write_u8(TAG_RECOVERY);
        self.write_u64(e.at.nanos());
        self.write_error(&e.error);
        self.write_u8(index_of(&RECOVERIES, &e.recovery));
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        self.write_u8(TAG_FRAME);
        self.write_u64(e.frame_index);
        self.write_u64(e.at.nanos());
        self.write_u8(u8::from(e.swapped));
        match e.paced {
            Some(paced) => {
                self.write_u8(1);
                self.write_u64(paced.reference.nanos());
                self.write_u64(paced.slept.nanos());
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
                self.write_u64(0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`CommandEvent`].
    Command(CommandEvent),
    /// A [`ResizeEvent`].
    Resize(ResizeEvent),
    /// A [`RecoveryEvent`].
    Recovery(RecoveryEvent),
    /// A [`FrameEvent`].
    Frame(FrameEvent),
}

impl RecordedEvent {
    /// When the event happened.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::Command(e) => e.at,
            Self::Resize(e) => e.at,
            Self::Recovery(e) => e.at,
            Self::Frame(e) => e.at,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_size(&mut self) -> Option<PixelSize> {
        Some(PixelSize::new(self.read_i32()?, self.read_i32()?))
    }

    fn read_indexed<T: Copy>(&mut self, table: &[T]) -> Option<T> {
        table.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_code(&mut self) -> Option<ErrorCode> {
        self.read_i32().map(ErrorCode::from_raw)
    }

    fn read_error(&mut self) -> Option<GraphicsError> {
        Some(match self.read_u8()? {
            0 => GraphicsError::NoDisplay,
            1 => GraphicsError::NoMatchingConfig(ConfigAttributes {
                red: self.read_i32()?,
                green: self.read_i32()?,
                blue: self.read_i32()?,
                alpha: self.read_i32()?,
                depth: self.read_i32()?,
                stencil: self.read_i32()?,
                samples: self.read_i32()?,
            }),
            2 => GraphicsError::SurfaceCreation(self.read_code()?),
            3 => GraphicsError::ContextCreation(self.read_code()?),
            4 => GraphicsError::MakeCurrent(self.read_code()?),
            5 => GraphicsError::Swap(self.read_code()?),
            _ => return None,
        })
    }

    fn read_decision(&mut self) -> Option<ResizeDecision> {
        Some(match self.read_u8()? {
            0 => ResizeDecision::Unchanged,
            1 => ResizeDecision::Deferred {
                remaining: self.read_u32()?,
            },
            2 => ResizeDecision::Apply(self.read_size()?),
            _ => return None,
        })
    }

    fn decode_command(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Command(CommandEvent {
            at: self.read_time()?,
            command: self.read_indexed(&COMMANDS)?,
            before: self.read_indexed(&STATES)?,
            after: self.read_indexed(&STATES)?,
        }))
    }

    fn decode_resize(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Resize(ResizeEvent {
            at: self.read_time()?,
            measured: self.read_size()?,
            forced: self.read_u8()? != 0,
            decision: self.read_decision()?,
        }))
    }

    fn decode_recovery(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Recovery(RecoveryEvent {
            at: self.read_time()?,
            error: self.read_error()?,
            recovery: self.read_indexed(&RECOVERIES)?,
        }))
    }

    fn decode_frame(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let at = self.read_time()?;
        let swapped = self.read_u8()? != 0;
        let has_paced = self.read_u8()? != 0;
        let reference = self.read_time()?;
        let slept = Duration(self.read_u64()?);
        Some(RecordedEvent::Frame(FrameEvent {
            frame_index,
            at,
            swapped,
            paced: has_paced.then_some(Paced { reference, slept }),
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_COMMAND => self.decode_command(),
            TAG_RESIZE => self.decode_resize(),
            TAG_RECOVERY => self.decode_recovery(),
            TAG_FRAME => self.decode_frame(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
