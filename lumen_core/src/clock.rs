// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic clock reads and sleeping.

use rustix::time::{ClockId, Timespec, clock_gettime};

use crate::time::{Duration, HostTime};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Source of monotonic time for the render thread.
///
/// The frame pacer both reads and sleeps through this trait so tests can
/// substitute a manual clock.
pub trait Clock {
    /// Returns the current monotonic time.
    fn now(&self) -> HostTime;

    /// Blocks the calling thread for at least `duration`.
    fn sleep(&self, duration: Duration);
}

/// `CLOCK_MONOTONIC` clock with thread sleeping.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> HostTime {
        now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration.into());
    }
}

/// Returns the current monotonic host time in nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    timespec_to_host_time(clock_gettime(ClockId::Monotonic))
}

fn timespec_to_host_time(timespec: Timespec) -> HostTime {
    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(999_999_999);

    let ticks_u128 = u128::from(seconds)
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u128::from(nanos));
    HostTime(u64::try_from(ticks_u128).unwrap_or(u64::MAX))
}
