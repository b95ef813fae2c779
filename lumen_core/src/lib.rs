// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback-driven display session for a single native window.
//!
//! `lumen_core` turns a platform's activity lifecycle, raw input, sensor
//! samples and window geometry into a small set of application callbacks,
//! while managing the rendering surface and context behind them. Every
//! native call sits behind a trait, so the whole session runs against fakes
//! in tests.
//!
//! # Architecture
//!
//! A UI thread produces events; a dedicated render thread owns all state:
//!
//! ```text
//!   UI thread                              render thread
//!   ─────────                              ─────────────
//!   PlatformEvent ──► channel ──► LifecycleController::run()
//!                                   │
//!   GeometrySender ◄─ rendezvous ─► ├─► transition() ──► Effects
//!                                   ├─► InputDispatcher ──► Callbacks
//!                                   ├─► SensorPipeline  ──► Callbacks
//!                                   └─► frame: ContextManager
//!                                              GeometryReconciler
//!                                              render callback
//!                                              FramePacer
//! ```
//!
//! **[`controller`]** — [`LifecycleController`](controller::LifecycleController)
//! and the [`Platform`](controller::Platform) trait bundling the native
//! collaborators.
//!
//! **[`lifecycle`]** — Lifecycle flags and the pure
//! [`transition`](lifecycle::transition) function that maps platform
//! commands to effects.
//!
//! **[`callbacks`]** — The [`Callbacks`](callbacks::Callbacks) table and the
//! [`Display`](callbacks::Display) handle passed to every callback.
//!
//! **[`graphics`]** — Framebuffer negotiation, context version cascade and
//! self-healing error recovery over a [`GraphicsBackend`](graphics::GraphicsBackend).
//!
//! **[`geometry`]** — Content rectangles, resize debouncing, keyboard
//! occlusion and interface orientation.
//!
//! **[`rendezvous`]** — The blocking content-rect handshake between the UI
//! and render threads.
//!
//! **[`input`]** — Key and touch translation.
//!
//! **[`sensor`]** — Sensor enablement and sample normalization.
//!
//! **[`pacing`]** — Emulated vsync for frames that do not swap.
//!
//! **[`host`]** — The [`HostQueries`](host::HostQueries) trait and helpers for
//! window decoration, orientation requests and display density.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! session instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod callbacks;
pub mod clock;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod graphics;
pub mod host;
pub mod input;
pub mod lifecycle;
pub mod pacing;
pub mod rendezvous;
pub mod sensor;
pub mod time;
pub mod trace;

#[cfg(test)]
mod testing;
