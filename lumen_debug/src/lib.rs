// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording and Chrome trace export for lumen session diagnostics.
//!
//! This crate provides a [`TraceSink`](lumen_core::trace::TraceSink)
//! implementation for development and post-mortem analysis:
//!
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Record a session with
//! [`LifecycleController::run_traced`](lumen_core::controller::LifecycleController::run_traced),
//! then export the bytes:
//!
//! ```no_run
//! # fn demo(bytes: &[u8]) -> std::io::Result<()> {
//! let mut file = std::fs::File::create("session.json")?;
//! lumen_debug::chrome::export(bytes, &mut file)?;
//! # Ok(())
//! # }
//! ```

pub mod chrome;
pub mod recorder;
