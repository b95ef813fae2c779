// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Application callbacks and the [`Display`] handle they receive.
//!
//! Every callback lives in an optional [`Slot`]. A callback is taken out of
//! its slot while it runs and put back afterwards unless the slot was written
//! in the meantime, so callbacks may freely register, replace or clear other
//! callbacks (including their own) through [`Display::callbacks_mut`].

use core::fmt;

use kurbo::{Insets, Rect, Size};

use crate::clock::Clock;
use crate::config::{DisplayConfig, Orientations, RenderingApi, UserInterfaceChrome};
use crate::geometry::{GeometryState, Orientation, PixelSize, fallback_chrome_insets};
use crate::graphics::{ContextManager, GraphicsBackend, GraphicsError, Recovery};
use crate::host::{HostQueries, RequestedOrientation};
use crate::input::{InputDispatcher, InputSink, Key, KeyAction, TouchPhase};
use crate::pacing::FramePacer;
use crate::sensor::{SensorDevice, SensorEvent, SensorKind, SensorPipeline};
use crate::time::HostTime;
use crate::trace::{RecoveryEvent, Tracer};

/// Called once a context is current on a new surface.
pub type SurfaceCreatedFn = Box<dyn FnMut(&mut Display<'_>, PixelSize)>;
/// Called when the drawable size changed.
pub type SurfaceResizedFn = Box<dyn FnMut(&mut Display<'_>, PixelSize)>;
/// Called with no arguments beyond the display.
pub type DisplayFn = Box<dyn FnMut(&mut Display<'_>)>;
/// Called when focus, and with it animation, changes.
pub type FocusFn = Box<dyn FnMut(&mut Display<'_>, bool)>;
/// Called when the interface orientation changed.
pub type OrientationFn = Box<dyn FnMut(&mut Display<'_>, Orientation)>;
/// Called when soft keyboard visibility or its frame changed.
pub type KeyboardFn = Box<dyn FnMut(&mut Display<'_>, bool, Rect)>;
/// Called for key events; returns whether the key was consumed.
pub type KeyFn = Box<dyn FnMut(&mut Display<'_>, Key, KeyAction) -> bool>;
/// Called for printable characters.
pub type CharFn = Box<dyn FnMut(&mut Display<'_>, char)>;
/// Called for touches with the slot, phase and position in pixels.
pub type TouchFn = Box<dyn FnMut(&mut Display<'_>, usize, TouchPhase, f64, f64)>;
/// Called with the newest sample of a sensor.
pub type SensorFn = Box<dyn FnMut(&mut Display<'_>, &SensorEvent)>;

/// One optional callback.
///
/// Every [`set`](Self::set) is counted, which lets a running callback clear
/// or replace its own slot without being put back afterwards.
pub struct Slot<F> {
    callback: Option<F>,
    writes: u32,
    running: bool,
}

impl<F> Default for Slot<F> {
    fn default() -> Self {
        Self {
            callback: None,
            writes: 0,
            running: false,
        }
    }
}

impl<F> fmt::Debug for Slot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("set", &self.is_set())
            .field("writes", &self.writes)
            .finish()
    }
}

impl<F> Slot<F> {
    /// Installs or clears the callback.
    pub fn set(&mut self, callback: Option<F>) {
        self.callback = callback;
        self.writes = self.writes.wrapping_add(1);
        self.running = false;
    }

    /// Clears the callback.
    pub fn clear(&mut self) {
        self.set(None);
    }

    /// Whether a callback is installed, counting one that is running.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.callback.is_some() || self.running
    }

    /// Takes the callback out for a call, with the write count it was taken at.
    pub(crate) fn take(&mut self) -> Option<(F, u32)> {
        let callback = self.callback.take()?;
        self.running = true;
        Some((callback, self.writes))
    }

    /// Puts a called callback back unless the slot was written meanwhile.
    pub(crate) fn restore(&mut self, callback: F, taken_at: u32) {
        if self.writes == taken_at {
            self.callback = Some(callback);
            self.running = false;
        }
    }
}

/// The table of application callbacks.
#[derive(Debug, Default)]
pub struct Callbacks {
    /// A context became current on a new surface.
    pub surface_created: Slot<SurfaceCreatedFn>,
    /// The context was destroyed or lost.
    pub surface_destroyed: Slot<DisplayFn>,
    /// The drawable size changed.
    pub surface_resized: Slot<SurfaceResizedFn>,
    /// Contents must be redrawn before the next render.
    pub surface_refresh: Slot<DisplayFn>,
    /// Draw a frame.
    pub render: Slot<DisplayFn>,
    /// Focus changed.
    pub focus: Slot<FocusFn>,
    /// The system is low on memory.
    pub low_memory: Slot<DisplayFn>,
    /// The interface orientation changed.
    pub orientation_changed: Slot<OrientationFn>,
    /// Soft keyboard visibility changed.
    pub keyboard_visibility_changed: Slot<KeyboardFn>,
    /// Key events.
    pub key: Slot<KeyFn>,
    /// Printable characters.
    pub character: Slot<CharFn>,
    /// Touch events.
    pub touch: Slot<TouchFn>,
    sensors: [Slot<SensorFn>; SensorKind::COUNT],
}

impl Callbacks {
    /// Installs or clears the callback for a sensor kind.
    ///
    /// Outside a running session this only updates the table; sensors are
    /// reconciled on the next focus change. Use
    /// [`Display::set_sensor_callback`] from inside callbacks.
    pub fn set_sensor(&mut self, kind: SensorKind, callback: Option<SensorFn>) {
        self.sensors[kind.index()].set(callback);
    }

    /// Whether a callback is installed for a sensor kind.
    #[must_use]
    pub fn has_sensor(&self, kind: SensorKind) -> bool {
        self.sensors[kind.index()].is_set()
    }

    pub(crate) fn wanted_sensors(&self) -> [bool; SensorKind::COUNT] {
        SensorKind::ALL.map(|kind| self.has_sensor(kind))
    }
}

/// Runs a callback slot with the take/call/put-back discipline.
macro_rules! fire {
    ($display:ident, $slot:ident $(, $arg:expr)*) => {
        match $display.callbacks.$slot.take() {
            Some((mut callback, taken_at)) => {
                let out = callback($display $(, $arg)*);
                $display.callbacks.$slot.restore(callback, taken_at);
                Some(out)
            }
            None => None,
        }
    };
}

/// Surface operations reachable from a callback.
pub(crate) trait SurfaceControl {
    fn swap_buffers(&mut self) -> Result<(), GraphicsError>;
    fn handle_error(
        &mut self,
        error: &GraphicsError,
        config: &DisplayConfig,
    ) -> Result<Recovery, GraphicsError>;
    fn rendering_api(&self) -> RenderingApi;
    fn drawable_size(&self) -> PixelSize;
}

impl<G: GraphicsBackend> SurfaceControl for ContextManager<G> {
    fn swap_buffers(&mut self) -> Result<(), GraphicsError> {
        Self::swap_buffers(self)
    }

    fn handle_error(
        &mut self,
        error: &GraphicsError,
        config: &DisplayConfig,
    ) -> Result<Recovery, GraphicsError> {
        Self::handle_error(self, error, config)
    }

    fn rendering_api(&self) -> RenderingApi {
        Self::rendering_api(self)
    }

    fn drawable_size(&self) -> PixelSize {
        Self::drawable_size(self)
    }
}

/// Sensor operations reachable from a callback.
pub(crate) trait SensorControl {
    fn sync(&mut self, wanted: [bool; SensorKind::COUNT], animating: bool);
    fn is_available(&self, kind: SensorKind) -> bool;
}

impl<S: SensorDevice> SensorControl for SensorPipeline<S> {
    fn sync(&mut self, wanted: [bool; SensorKind::COUNT], animating: bool) {
        Self::sync(self, wanted, animating);
    }

    fn is_available(&self, kind: SensorKind) -> bool {
        Self::is_available(self, kind)
    }
}

/// Per-iteration flags shared between the loop and callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FrameFlags {
    pub(crate) refresh_requested: bool,
    pub(crate) swapped: bool,
    pub(crate) animating: bool,
    pub(crate) scale: f64,
}

impl Default for FrameFlags {
    fn default() -> Self {
        Self {
            refresh_requested: true,
            swapped: false,
            animating: false,
            scale: 1.0,
        }
    }
}

/// The session as seen from inside a callback.
pub struct Display<'a> {
    pub(crate) config: &'a mut DisplayConfig,
    pub(crate) callbacks: &'a mut Callbacks,
    pub(crate) surface: &'a mut dyn SurfaceControl,
    pub(crate) sensors: &'a mut dyn SensorControl,
    pub(crate) host: &'a dyn HostQueries,
    pub(crate) clock: &'a dyn Clock,
    pub(crate) pacer: &'a mut FramePacer,
    pub(crate) input: &'a mut InputDispatcher,
    pub(crate) geometry: &'a GeometryState,
    pub(crate) frame: &'a mut FrameFlags,
    pub(crate) tracer: Tracer<'a>,
}

impl fmt::Debug for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl Display<'_> {
    /// Presents the back buffer.
    ///
    /// Failures are recovered from internally; the application only sees the
    /// resulting surface-destroyed/created callbacks. A recovery that cannot
    /// negotiate a surface again is reported to the host.
    pub fn swap_buffers(&mut self) {
        let result = self.surface.swap_buffers();
        self.pacer.record_swap(self.clock.now());
        self.frame.swapped = true;
        let Err(error) = result else {
            return;
        };
        match self.surface.handle_error(&error, self.config) {
            Ok(recovery) => self.tracer.graphics_recovery(&RecoveryEvent {
                at: self.clock.now(),
                error,
                recovery,
            }),
            Err(fatal) => {
                log::error!("surface initialization failed: {fatal}");
                self.host.report_error(&fatal);
            }
        }
    }

    /// Asks for the refresh callback before the next render.
    pub fn request_refresh(&mut self) {
        self.frame.refresh_requested = true;
    }

    /// Current monotonic time.
    pub fn now(&self) -> HostTime {
        self.clock.now()
    }

    /// Session configuration.
    pub fn config(&self) -> &DisplayConfig {
        self.config
    }

    /// Callback table, for installing or clearing callbacks.
    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        self.callbacks
    }

    /// Installs or clears a sensor callback and reconciles sensor delivery.
    pub fn set_sensor_callback(&mut self, kind: SensorKind, callback: Option<SensorFn>) {
        self.callbacks.set_sensor(kind, callback);
        self.sensors
            .sync(self.callbacks.wanted_sensors(), self.frame.animating);
    }

    /// Whether the device has this kind of sensor.
    pub fn is_sensor_available(&self, kind: SensorKind) -> bool {
        self.sensors.is_available(kind)
    }

    /// Drawable size in pixels.
    pub fn drawable_size(&self) -> Size {
        let size = self.surface.drawable_size();
        Size::new(f64::from(size.width), f64::from(size.height))
    }

    /// Pixels per density-independent unit.
    pub fn display_scale(&self) -> f64 {
        self.frame.scale
    }

    /// Rendering tier of the current context.
    pub fn rendering_api(&self) -> RenderingApi {
        self.surface.rendering_api()
    }

    /// Whether the device has a touch screen.
    pub fn has_touch(&self) -> bool {
        true
    }

    /// Whether more than one simultaneous touch is reported.
    pub fn is_multitouch(&self) -> bool {
        self.input.is_multitouch()
    }

    /// Turns multitouch reporting on or off.
    pub fn set_multitouch(&mut self, multitouch: bool) {
        self.config.multitouch = multitouch;
        self.input.set_multitouch(multitouch);
    }

    /// Current interface orientation, read from the host.
    pub fn interface_orientation(&self) -> Orientation {
        Orientation::from_rotation(self.host.rotation())
    }

    /// Orientations the application supports.
    pub fn supported_orientations(&self) -> Orientations {
        self.config.supported_orientations
    }

    /// Changes the supported orientations, updating the host's requested
    /// orientation when the set actually changed.
    pub fn set_supported_orientations(&mut self, orientations: Orientations) {
        if self.config.supported_orientations == orientations {
            return;
        }
        self.config.supported_orientations = orientations;
        self.host
            .set_requested_orientation(RequestedOrientation::from_supported(orientations));
    }

    /// Platform decoration mode.
    pub fn chrome(&self) -> UserInterfaceChrome {
        self.config.chrome
    }

    /// Changes the platform decoration mode and applies it.
    pub fn set_chrome(&mut self, chrome: UserInterfaceChrome) {
        if self.config.chrome == chrome {
            return;
        }
        self.config.chrome = chrome;
        self.host.apply_chrome(chrome);
    }

    /// Space taken by platform decoration on each edge, in pixels.
    pub fn chrome_insets(&self) -> Insets {
        let reported = if self.config.chrome == UserInterfaceChrome::Fullscreen {
            self.host.safe_area_insets()
        } else {
            self.host.system_window_insets()
        };
        if let Some(insets) = reported {
            return insets;
        }
        log::debug!("chrome insets unavailable, deriving from the visible frame");
        let visible = self
            .host
            .visible_display_frame()
            .unwrap_or(self.geometry.content_rect);
        fallback_chrome_insets(visible, self.surface.drawable_size())
    }

    /// Shows or hides the soft keyboard.
    pub fn set_keyboard_visible(&mut self, visible: bool) {
        if !self.host.set_keyboard_visible(visible) {
            log::debug!("soft keyboard request ignored by host");
            return;
        }
        if visible && self.config.chrome == UserInterfaceChrome::Fullscreen {
            self.host
                .apply_chrome(UserInterfaceChrome::NavigationAndStatusBar);
        }
    }

    /// Whether a soft keyboard was last seen occluding the window.
    pub fn is_keyboard_visible(&self) -> bool {
        self.geometry.keyboard_visible
    }

    pub(crate) fn fire_surface_created(&mut self, size: PixelSize) {
        let display = self;
        fire!(display, surface_created, size);
    }

    pub(crate) fn fire_surface_destroyed(&mut self) {
        let display = self;
        fire!(display, surface_destroyed);
    }

    pub(crate) fn fire_surface_resized(&mut self, size: PixelSize) {
        let display = self;
        fire!(display, surface_resized, size);
    }

    pub(crate) fn fire_refresh(&mut self) {
        let display = self;
        fire!(display, surface_refresh);
    }

    pub(crate) fn fire_render(&mut self) {
        let display = self;
        fire!(display, render);
    }

    pub(crate) fn fire_focus(&mut self, focused: bool) {
        let display = self;
        fire!(display, focus, focused);
    }

    pub(crate) fn fire_low_memory(&mut self) {
        let display = self;
        fire!(display, low_memory);
    }

    pub(crate) fn fire_orientation(&mut self, orientation: Orientation) {
        let display = self;
        fire!(display, orientation_changed, orientation);
    }

    pub(crate) fn fire_keyboard(&mut self, visible: bool, frame: Rect) {
        let display = self;
        fire!(display, keyboard_visibility_changed, visible, frame);
    }

    pub(crate) fn fire_sensor(&mut self, event: &SensorEvent) {
        let i = event.kind.index();
        if let Some((mut callback, taken_at)) = self.callbacks.sensors[i].take() {
            callback(self, event);
            self.callbacks.sensors[i].restore(callback, taken_at);
        }
    }
}

impl InputSink for Display<'_> {
    fn key(&mut self, key: Key, action: KeyAction) -> bool {
        let display = self;
        fire!(display, key, key, action).unwrap_or(false)
    }

    fn wants_keys(&self) -> bool {
        self.callbacks.key.is_set()
    }

    fn wants_characters(&self) -> bool {
        self.callbacks.character.is_set()
    }

    fn character(&mut self, ch: char) {
        let display = self;
        fire!(display, character, ch);
    }

    fn touch(&mut self, slot: usize, phase: TouchPhase, x: f64, y: f64) {
        let display = self;
        fire!(display, touch, slot, phase, x, y);
    }

    fn unicode_char(&self, key_code: i32, meta_state: i32) -> Option<u32> {
        self.host.unicode_char(key_code, meta_state)
    }

    fn move_task_to_back(&mut self) -> bool {
        self.host.move_task_to_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Counter = Box<dyn FnMut() -> u32>;

    fn counter(start: u32) -> Counter {
        let mut n = start;
        Box::new(move || {
            n += 1;
            n
        })
    }

    #[test]
    fn untouched_slot_gets_its_callback_back() {
        let mut slot = Slot::<Counter>::default();
        slot.set(Some(counter(0)));
        let (mut callback, taken_at) = slot.take().unwrap();
        assert!(slot.is_set(), "a running callback still counts as installed");
        assert_eq!(callback(), 1);
        slot.restore(callback, taken_at);
        assert!(slot.is_set());
        let (mut callback, _) = slot.take().unwrap();
        assert_eq!(callback(), 2);
    }

    #[test]
    fn slot_cleared_while_running_stays_clear() {
        let mut slot = Slot::<Counter>::default();
        slot.set(Some(counter(0)));
        let (callback, taken_at) = slot.take().unwrap();
        slot.clear();
        assert!(!slot.is_set());
        slot.restore(callback, taken_at);
        assert!(!slot.is_set());
        assert!(slot.take().is_none());
    }

    #[test]
    fn replacement_installed_while_running_wins() {
        let mut slot = Slot::<Counter>::default();
        slot.set(Some(counter(0)));
        let (callback, taken_at) = slot.take().unwrap();
        slot.set(Some(counter(100)));
        slot.restore(callback, taken_at);
        let (mut callback, _) = slot.take().unwrap();
        assert_eq!(callback(), 101);
    }

    #[test]
    fn sensor_slots_follow_the_same_rules() {
        let mut callbacks = Callbacks::default();
        callbacks.set_sensor(SensorKind::Gyroscope, Some(Box::new(|_, _| {})));
        assert!(callbacks.wanted_sensors()[SensorKind::Gyroscope.index()]);
        let i = SensorKind::Gyroscope.index();
        let (callback, taken_at) = callbacks.sensors[i].take().unwrap();
        callbacks.set_sensor(SensorKind::Gyroscope, None);
        callbacks.sensors[i].restore(callback, taken_at);
        assert!(!callbacks.has_sensor(SensorKind::Gyroscope));
    }
}
