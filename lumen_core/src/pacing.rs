// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-cadence frame pacing.
//!
//! When the render callback does not swap buffers, nothing blocks on the
//! display and the loop would spin. [`FramePacer`] sleeps the render thread
//! until shortly before the next refresh deadline, measured from the last
//! swap (real or emulated).

use crate::clock::Clock;
use crate::time::{Duration, HostTime};

/// Refresh rate assumed when the host does not report a usable one.
pub const DEFAULT_REFRESH_RATE: f64 = 60.0;

/// How far ahead of the deadline sleeping stops.
pub const WAKE_MARGIN: Duration = Duration::from_micros(500);

/// Result of one pacing step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paced {
    /// The time recorded as the last swap.
    pub reference: HostTime,
    /// Total time spent sleeping.
    pub slept: Duration,
}

/// Swap-time bookkeeping for emulated vsync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePacer {
    last_swap: HostTime,
}

impl FramePacer {
    /// Creates a pacer whose first deadline is one interval after `now`.
    #[must_use]
    pub const fn new(now: HostTime) -> Self {
        Self { last_swap: now }
    }

    /// Time of the last real or emulated swap.
    #[must_use]
    pub const fn last_swap(&self) -> HostTime {
        self.last_swap
    }

    /// Records a real buffer swap.
    pub fn record_swap(&mut self, at: HostTime) {
        self.last_swap = at;
    }

    /// Refresh interval for a host-reported rate, defaulting to 60 Hz.
    #[must_use]
    pub fn refresh_interval(rate: Option<f32>) -> Duration {
        let hz = match rate {
            Some(hz) if hz > 0.0 => f64::from(hz),
            _ => {
                log::debug!("refresh rate unavailable ({rate:?}), assuming {DEFAULT_REFRESH_RATE} Hz");
                DEFAULT_REFRESH_RATE
            }
        };
        Duration::from_secs_f64(1.0 / hz)
    }

    /// Waits out the rest of the current refresh interval.
    ///
    /// If the deadline already passed, the current time becomes the
    /// reference so a slow frame does not cause a burst of catch-up frames.
    /// Otherwise the thread sleeps until [`WAKE_MARGIN`] before the deadline
    /// and the deadline itself becomes the reference.
    pub fn pace(&mut self, clock: &dyn Clock, rate: Option<f32>) -> Paced {
        let deadline = self.last_swap.saturating_add(Self::refresh_interval(rate));
        let start = clock.now();
        if start >= deadline {
            self.last_swap = start;
            return Paced {
                reference: start,
                slept: Duration::ZERO,
            };
        }
        let wake = deadline.checked_sub(WAKE_MARGIN).unwrap_or(HostTime(0));
        let mut now = start;
        while now < wake {
            clock.sleep(wake.saturating_duration_since(now));
            now = clock.now();
        }
        self.last_swap = deadline;
        Paced {
            reference: deadline,
            slept: now.saturating_duration_since(start),
        }
    }
}
