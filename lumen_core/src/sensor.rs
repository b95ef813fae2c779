// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Motion sensor enablement and sample normalization.
//!
//! Raw samples arrive in the device's conventions. [`normalize`] maps them to
//! the session's: acceleration in units of gravity pointing the other way,
//! rotation as a row-major 3×3 matrix, timestamps in seconds.

use core::ops::Mul;

use crate::time::Duration;

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f64 = 9.806_65;

/// Preferred interval between sensor samples.
pub const SENSOR_UPDATE_INTERVAL: Duration = Duration::from_micros(10_000);

/// A kind of motion sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Linear acceleration including gravity.
    Accelerometer,
    /// Ambient magnetic field in microtesla.
    Magnetometer,
    /// Angular rate in radians per second.
    Gyroscope,
    /// Device attitude.
    RotationMatrix,
}

impl SensorKind {
    /// Number of sensor kinds.
    pub const COUNT: usize = 4;

    /// Every kind, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Accelerometer,
        Self::Magnetometer,
        Self::Gyroscope,
        Self::RotationMatrix,
    ];

    /// Dense index in `0..COUNT`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Accelerometer => 0,
            Self::Magnetometer => 1,
            Self::Gyroscope => 2,
            Self::RotationMatrix => 3,
        }
    }
}

/// A three-component vector.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

/// A row-major 3×3 matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3 {
    /// `rows[r][c]` is the element at row `r`, column `c`.
    pub rows: [[f64; 3]; 3],
}

impl Matrix3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Builds the rotation matrix of a unit quaternion.
    ///
    /// When `w` is absent or zero it is reconstructed from the vector part.
    #[must_use]
    pub fn from_quaternion(x: f64, y: f64, z: f64, w: Option<f64>) -> Self {
        let w = match w {
            Some(w) if w != 0.0 => w,
            _ => (1.0 - (x * x + y * y + z * z)).max(0.0).sqrt(),
        };
        let (xx, yy, zz) = (2.0 * x * x, 2.0 * y * y, 2.0 * z * z);
        let (xy, xz, yz) = (2.0 * x * y, 2.0 * x * z, 2.0 * y * z);
        let (xw, yw, zw) = (2.0 * x * w, 2.0 * y * w, 2.0 * z * w);
        Self {
            rows: [
                [1.0 - yy - zz, xy - zw, xz + yw],
                [xy + zw, 1.0 - xx - zz, yz - xw],
                [xz - yw, yz + xw, 1.0 - xx - yy],
            ],
        }
    }

    /// Determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let [a, b, c] = self.rows;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// Transpose.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let r = self.rows;
        Self {
            rows: [
                [r[0][0], r[1][0], r[2][0]],
                [r[0][1], r[1][1], r[2][1]],
                [r[0][2], r[1][2], r[2][2]],
            ],
        }
    }
}

impl Mul for Matrix3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut rows = [[0.0; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[r][k] * rhs.rows[k][c]).sum();
            }
        }
        Self { rows }
    }
}

/// Sample payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorValue {
    /// Accelerometer, magnetometer and gyroscope readings.
    Vector(Vector3),
    /// Rotation readings.
    Matrix(Matrix3),
}

/// A normalized sensor sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorEvent {
    /// Which sensor produced the sample.
    pub kind: SensorKind,
    /// Sample time in seconds.
    pub timestamp: f64,
    /// The reading.
    pub value: SensorValue,
}

/// A sample as the device reports it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSensorEvent {
    /// Which sensor produced the sample.
    pub kind: SensorKind,
    /// Sample time in nanoseconds.
    pub timestamp_ns: i64,
    /// The three vector components.
    pub vector: [f32; 3],
    /// Quaternion scalar part, when the platform supplies it.
    pub scalar: Option<f32>,
}

/// Converts a raw sample to session conventions.
#[must_use]
pub fn normalize(raw: &RawSensorEvent) -> SensorEvent {
    let [x, y, z] = raw.vector.map(f64::from);
    let value = match raw.kind {
        SensorKind::Accelerometer => SensorValue::Vector(Vector3 {
            x: x / -STANDARD_GRAVITY,
            y: y / -STANDARD_GRAVITY,
            z: z / -STANDARD_GRAVITY,
        }),
        SensorKind::Magnetometer | SensorKind::Gyroscope => SensorValue::Vector(Vector3 { x, y, z }),
        SensorKind::RotationMatrix => {
            SensorValue::Matrix(Matrix3::from_quaternion(x, y, z, raw.scalar.map(f64::from)))
        }
    };
    SensorEvent {
        kind: raw.kind,
        timestamp: raw.timestamp_ns as f64 / 1e9,
        value,
    }
}

/// Device sensor manager and its event queue.
pub trait SensorDevice {
    /// Whether the device has a default sensor of this kind.
    fn is_available(&self, kind: SensorKind) -> bool;

    /// Minimum sample interval the sensor supports, if it reports one.
    fn min_delay(&self, kind: SensorKind) -> Option<Duration>;

    /// Creates the shared event queue.
    fn create_queue(&mut self) -> bool;

    /// Destroys the shared event queue.
    fn destroy_queue(&mut self);

    /// Starts delivery for a sensor.
    fn enable(&mut self, kind: SensorKind) -> bool;

    /// Stops delivery for a sensor.
    fn disable(&mut self, kind: SensorKind) -> bool;

    /// Sets a sensor's sample interval.
    fn set_event_rate(&mut self, kind: SensorKind, interval: Duration);

    /// Takes the next queued sample.
    fn poll(&mut self) -> Option<RawSensorEvent>;
}

/// Per-kind enablement and the most recent samples.
#[derive(Debug)]
pub struct SensorPipeline<S> {
    device: S,
    queue: bool,
    enabled: [bool; SensorKind::COUNT],
    last: [Option<SensorEvent>; SensorKind::COUNT],
}

impl<S: SensorDevice> SensorPipeline<S> {
    /// Creates a pipeline with every sensor off and no queue.
    pub fn new(device: S) -> Self {
        Self {
            device,
            queue: false,
            enabled: [false; SensorKind::COUNT],
            last: [None; SensorKind::COUNT],
        }
    }

    /// Shared access to the device.
    pub fn device(&self) -> &S {
        &self.device
    }

    /// Exclusive access to the device.
    pub fn device_mut(&mut self) -> &mut S {
        &mut self.device
    }

    /// Whether the device has this kind of sensor.
    pub fn is_available(&self, kind: SensorKind) -> bool {
        self.device.is_available(kind)
    }

    /// Whether delivery is on at the device.
    pub fn is_enabled(&self, kind: SensorKind) -> bool {
        self.enabled[kind.index()]
    }

    /// The last valid sample of a kind.
    pub fn last_sample(&self, kind: SensorKind) -> Option<&SensorEvent> {
        self.last[kind.index()].as_ref()
    }

    /// Turns delivery for one sensor on or off.
    ///
    /// Turning a sensor off invalidates its last sample even when the device
    /// lacks the sensor. The event queue is created on first use.
    pub fn set_sensor_enabled(&mut self, kind: SensorKind, enabled: bool) {
        let i = kind.index();
        if !enabled {
            self.last[i] = None;
        }
        if self.enabled[i] == enabled || !self.device.is_available(kind) {
            return;
        }
        if !self.queue {
            if !self.device.create_queue() {
                log::debug!("sensor queue unavailable, {kind:?} left off");
                return;
            }
            self.queue = true;
        }
        if enabled {
            if self.device.enable(kind) {
                if let Some(min) = self.device.min_delay(kind).filter(|d| *d > Duration::ZERO) {
                    self.device
                        .set_event_rate(kind, SENSOR_UPDATE_INTERVAL.max(min));
                }
                self.enabled[i] = true;
            }
        } else if self.device.disable(kind) {
            self.enabled[i] = false;
        }
    }

    /// Brings every sensor in line with `wanted && animating`.
    pub fn sync(&mut self, wanted: [bool; SensorKind::COUNT], animating: bool) {
        for kind in SensorKind::ALL {
            self.set_sensor_enabled(kind, animating && wanted[kind.index()]);
        }
    }

    /// Drains the queue and returns the newest sample of each kind that
    /// received one, in kind order.
    pub fn drain_queue(&mut self) -> Vec<SensorEvent> {
        let mut received = [false; SensorKind::COUNT];
        if self.queue {
            while let Some(raw) = self.device.poll() {
                let event = normalize(&raw);
                let i = raw.kind.index();
                self.last[i] = Some(event);
                received[i] = true;
            }
        }
        SensorKind::ALL
            .into_iter()
            .filter(|kind| received[kind.index()])
            .filter_map(|kind| self.last[kind.index()])
            .collect()
    }

    /// Turns every sensor off and destroys the queue.
    pub fn release(&mut self) {
        for kind in SensorKind::ALL {
            self.set_sensor_enabled(kind, false);
        }
        if self.queue {
            self.device.destroy_queue();
            self.queue = false;
        }
    }
}
