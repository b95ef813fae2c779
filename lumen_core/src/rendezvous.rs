// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-rectangle handshake between the UI thread and the render thread.
//!
//! The UI thread must not return from its content-rect notification until
//! the render thread has taken the new rectangle, otherwise layout code on
//! the UI side could observe bounds the session has not seen yet.
//!
//! ```text
//!  UI thread                         render thread
//!  ---------                         -------------
//!  lock
//!  pending = rect
//!  send ContentRectChanged  ───────► (wakes)
//!  wait until applied == pending
//!                                    lock
//!                                    applied = pending
//!                                    notify_all, unlock
//!  (returns)                         reconcile geometry
//! ```
//!
//! There is no timeout. If the render side is gone the UI call fails with
//! [`RendezvousError::SessionClosed`] instead of waiting forever.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::geometry::PixelRect;
use crate::lifecycle::{PlatformCommand, PlatformEvent};

/// Errors from the UI side of the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RendezvousError {
    /// The render thread stopped listening.
    #[error("display session is closed")]
    SessionClosed,
}

#[derive(Debug, Default)]
struct RectPair {
    pending: PixelRect,
    applied: PixelRect,
    closed: bool,
}

/// Pending and applied content rectangles behind a mutex/condvar pair.
#[derive(Debug, Default)]
pub struct ContentRectCell {
    rects: Mutex<RectPair>,
    changed: Condvar,
}

impl ContentRectCell {
    /// Creates a cell with both rectangles empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RectPair> {
        // Plain data; a poisoned lock still holds valid rectangles.
        self.rects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// UI side: publishes `rect`, calls `wake` while still holding the lock,
    /// then blocks until the render thread has applied it.
    ///
    /// `wake` returns `false` when the render side cannot be reached.
    pub fn submit(&self, rect: PixelRect, wake: impl FnOnce() -> bool) -> Result<(), RendezvousError> {
        let mut rects = self.lock();
        if rects.closed {
            return Err(RendezvousError::SessionClosed);
        }
        rects.pending = rect;
        if !wake() {
            return Err(RendezvousError::SessionClosed);
        }
        let rects = self
            .changed
            .wait_while(rects, |r| r.applied != r.pending && !r.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if rects.applied == rects.pending {
            Ok(())
        } else {
            Err(RendezvousError::SessionClosed)
        }
    }

    /// Render side: copies pending into applied and wakes every waiter.
    ///
    /// `under_lock` runs before the broadcast while the lock is held.
    pub fn apply(&self, under_lock: impl FnOnce(PixelRect)) -> PixelRect {
        let mut rects = self.lock();
        rects.applied = rects.pending;
        under_lock(rects.applied);
        self.changed.notify_all();
        rects.applied
    }

    /// The last applied rectangle.
    pub fn applied(&self) -> PixelRect {
        self.lock().applied
    }

    /// Render side: releases every waiter with an error and rejects new
    /// submissions until [`reopen`](Self::reopen).
    pub fn close(&self) {
        let mut rects = self.lock();
        rects.closed = true;
        self.changed.notify_all();
    }

    /// Accepts submissions again after a render-thread re-entry.
    pub fn reopen(&self) {
        self.lock().closed = false;
    }
}

/// UI-thread handle for submitting content rectangles.
#[derive(Clone, Debug)]
pub struct GeometrySender {
    cell: Arc<ContentRectCell>,
    events: Sender<PlatformEvent>,
}

impl GeometrySender {
    /// Creates a sender that wakes the render thread through `events`.
    pub fn new(cell: Arc<ContentRectCell>, events: Sender<PlatformEvent>) -> Self {
        Self { cell, events }
    }

    /// Hands `rect` to the render thread and waits until it was applied.
    pub fn set_content_rect(&self, rect: PixelRect) -> Result<(), RendezvousError> {
        self.cell.submit(rect, || {
            self.events
                .send(PlatformEvent::Command(PlatformCommand::ContentRectChanged))
                .is_ok()
        })
    }

    /// The rectangle the render thread most recently took.
    pub fn applied(&self) -> PixelRect {
        self.cell.applied()
    }
}
