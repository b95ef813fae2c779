// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted fakes for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use kurbo::Insets;

use crate::clock::Clock;
use crate::config::{ColorFormat, RenderingApi, SwapBehavior, UserInterfaceChrome};
use crate::geometry::{PixelRect, PixelSize};
use crate::graphics::{
    ConfigAttributes, ConfigId, ContextId, ErrorCode, GraphicsBackend, GraphicsError, SurfaceId,
};
use crate::host::{HostQueries, RequestedOrientation, system_ui_flags};
use crate::input::{InputSink, Key, KeyAction, TouchPhase};
use crate::sensor::{RawSensorEvent, SensorDevice, SensorKind};
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Graphics
// ---------------------------------------------------------------------------

/// A backend call, in the order it was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BackendCall {
    Connect,
    ChooseConfig(ConfigAttributes),
    SetBuffersGeometry(i32),
    CreateSurface(SurfaceId),
    SetSwapBehavior(SwapBehavior),
    DestroySurface(SurfaceId),
    CreateContext(RenderingApi),
    DestroyContext(ContextId),
    MakeCurrent,
    Unbind,
    Swap,
    Terminate,
}

#[derive(Debug)]
pub(crate) struct FakeBackend {
    pub(crate) no_display: bool,
    pub(crate) max_samples: i32,
    pub(crate) max_depth: i32,
    pub(crate) reject_all_configs: bool,
    pub(crate) configs_left: Option<u32>,
    pub(crate) max_api: RenderingApi,
    pub(crate) minor_query_fails: bool,
    pub(crate) fail_make_current: bool,
    pub(crate) fail_swap: Option<ErrorCode>,
    pub(crate) chosen: Option<ConfigAttributes>,
    pub(crate) calls: Vec<BackendCall>,
    pub(crate) surfaces_created: u64,
    pub(crate) contexts_created: u64,
    pub(crate) swaps: u32,
    pub(crate) size: PixelSize,
    pub(crate) context_api: Option<RenderingApi>,
    pub(crate) error: ErrorCode,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            no_display: false,
            max_samples: 4,
            max_depth: 24,
            reject_all_configs: false,
            configs_left: None,
            max_api: RenderingApi::OpenGlEs32,
            minor_query_fails: false,
            fail_make_current: false,
            fail_swap: None,
            chosen: None,
            calls: Vec::new(),
            surfaces_created: 0,
            contexts_created: 0,
            swaps: 0,
            size: PixelSize::new(1080, 1920),
            context_api: None,
            error: ErrorCode::Other(0x3000),
        }
    }
}

impl GraphicsBackend for FakeBackend {
    fn connect(&mut self) -> bool {
        self.calls.push(BackendCall::Connect);
        !self.no_display
    }

    fn terminate(&mut self) {
        self.calls.push(BackendCall::Terminate);
    }

    fn choose_config(&mut self, attributes: &ConfigAttributes) -> Option<ConfigId> {
        self.calls.push(BackendCall::ChooseConfig(*attributes));
        if self.reject_all_configs
            || self.configs_left == Some(0)
            || attributes.samples > self.max_samples
            || attributes.depth > self.max_depth
        {
            return None;
        }
        if let Some(left) = &mut self.configs_left {
            *left -= 1;
        }
        self.chosen = Some(*attributes);
        Some(ConfigId(1))
    }

    fn native_visual_id(&mut self, _config: ConfigId) -> Option<i32> {
        Some(1)
    }

    fn set_buffers_geometry(&mut self, format: i32) {
        self.calls.push(BackendCall::SetBuffersGeometry(format));
    }

    fn create_window_surface(&mut self, _config: ConfigId) -> Option<SurfaceId> {
        self.surfaces_created += 1;
        let surface = SurfaceId(self.surfaces_created);
        self.calls.push(BackendCall::CreateSurface(surface));
        Some(surface)
    }

    fn set_swap_behavior(&mut self, _surface: SurfaceId, behavior: SwapBehavior) {
        self.calls.push(BackendCall::SetSwapBehavior(behavior));
    }

    fn surface_size(&mut self, _surface: SurfaceId) -> Option<PixelSize> {
        Some(self.size)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.calls.push(BackendCall::DestroySurface(surface));
    }

    fn create_context(&mut self, _config: ConfigId, api: RenderingApi) -> Option<ContextId> {
        self.calls.push(BackendCall::CreateContext(api));
        if api > self.max_api {
            self.error = ErrorCode::Other(0x3005);
            return None;
        }
        self.contexts_created += 1;
        self.context_api = Some(api);
        Some(ContextId(self.contexts_created))
    }

    fn query_major_version(&mut self, _context: ContextId) -> Option<i32> {
        self.context_api.map(|api| api.version().0)
    }

    fn query_minor_version(&mut self, _context: ContextId) -> Option<i32> {
        if self.minor_query_fails {
            return None;
        }
        self.context_api.map(|api| api.version().1)
    }

    fn destroy_context(&mut self, context: ContextId) {
        self.calls.push(BackendCall::DestroyContext(context));
        self.context_api = None;
    }

    fn make_current(&mut self, surface: Option<SurfaceId>, context: Option<ContextId>) -> bool {
        if surface.is_none() && context.is_none() {
            self.calls.push(BackendCall::Unbind);
            return true;
        }
        self.calls.push(BackendCall::MakeCurrent);
        if self.fail_make_current {
            self.error = ErrorCode::Other(0x3002);
            return false;
        }
        true
    }

    fn swap_buffers(&mut self, _surface: SurfaceId) -> bool {
        self.calls.push(BackendCall::Swap);
        self.swaps += 1;
        match self.fail_swap {
            Some(code) => {
                self.error = code;
                false
            }
            None => true,
        }
    }

    fn last_error(&mut self) -> ErrorCode {
        self.error
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct FakeSensors {
    pub(crate) available: [bool; SensorKind::COUNT],
    pub(crate) min_delay: Option<Duration>,
    pub(crate) enabled: [bool; SensorKind::COUNT],
    pub(crate) queues_created: u32,
    pub(crate) queues_destroyed: u32,
    pub(crate) rates: Vec<(SensorKind, Duration)>,
    pub(crate) queued: VecDeque<RawSensorEvent>,
}

impl Default for FakeSensors {
    fn default() -> Self {
        Self {
            available: [true; SensorKind::COUNT],
            min_delay: None,
            enabled: [false; SensorKind::COUNT],
            queues_created: 0,
            queues_destroyed: 0,
            rates: Vec::new(),
            queued: VecDeque::new(),
        }
    }
}

impl FakeSensors {
    pub(crate) fn with_min_delay(min_delay: Duration) -> Self {
        Self {
            min_delay: Some(min_delay),
            ..Self::default()
        }
    }
}

impl SensorDevice for FakeSensors {
    fn is_available(&self, kind: SensorKind) -> bool {
        self.available[kind.index()]
    }

    fn min_delay(&self, _kind: SensorKind) -> Option<Duration> {
        self.min_delay
    }

    fn create_queue(&mut self) -> bool {
        self.queues_created += 1;
        true
    }

    fn destroy_queue(&mut self) {
        self.queues_destroyed += 1;
    }

    fn enable(&mut self, kind: SensorKind) -> bool {
        self.enabled[kind.index()] = true;
        true
    }

    fn disable(&mut self, kind: SensorKind) -> bool {
        self.enabled[kind.index()] = false;
        true
    }

    fn set_event_rate(&mut self, kind: SensorKind, interval: Duration) {
        self.rates.push((kind, interval));
    }

    fn poll(&mut self) -> Option<RawSensorEvent> {
        self.queued.pop_front()
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RecordedInput {
    Key(Key, KeyAction),
    Char(char),
    Touch(usize, TouchPhase, f64, f64),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingInput {
    pub(crate) events: Vec<RecordedInput>,
    pub(crate) consume: bool,
    pub(crate) ignores_keys: bool,
    pub(crate) host_backgrounds: bool,
    pub(crate) unicode: Option<u32>,
    pub(crate) moved_to_back: u32,
}

impl InputSink for RecordingInput {
    fn key(&mut self, key: Key, action: KeyAction) -> bool {
        self.events.push(RecordedInput::Key(key, action));
        self.consume
    }

    fn wants_keys(&self) -> bool {
        !self.ignores_keys
    }

    fn wants_characters(&self) -> bool {
        true
    }

    fn character(&mut self, ch: char) {
        self.events.push(RecordedInput::Char(ch));
    }

    fn touch(&mut self, slot: usize, phase: TouchPhase, x: f64, y: f64) {
        self.events.push(RecordedInput::Touch(slot, phase, x, y));
    }

    fn unicode_char(&self, _key_code: i32, _meta_state: i32) -> Option<u32> {
        self.unicode
    }

    fn move_task_to_back(&mut self) -> bool {
        self.moved_to_back += 1;
        self.host_backgrounds
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// A clock that only moves when told to, or when slept on.
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Cell<HostTime>,
    sleep_cap: Cell<Option<Duration>>,
    sleeps: Cell<u32>,
}

impl ManualClock {
    pub(crate) fn new(start: HostTime) -> Self {
        Self {
            now: Cell::new(start),
            sleep_cap: Cell::new(None),
            sleeps: Cell::new(0),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Makes every sleep wake after at most `cap`.
    pub(crate) fn set_sleep_cap(&self, cap: Option<Duration>) {
        self.sleep_cap.set(cap);
    }

    pub(crate) fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        let slept = match self.sleep_cap.get() {
            Some(cap) => duration.min(cap),
            None => duration,
        };
        self.advance(slept);
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum HostCall {
    AttachThread,
    DetachThread,
    ApplyChrome(UserInterfaceChrome, Option<u32>),
    SetWindowFormat(ColorFormat, bool),
    AllowDisplayCutout,
    RequestOrientation(RequestedOrientation),
    SetKeyboardVisible(bool),
    MoveTaskToBack,
    ResetContentRectTracking,
    ReportError(GraphicsError),
}

/// A host that answers from fields and records every side effect.
#[derive(Debug)]
pub(crate) struct RecordingHost {
    pub(crate) sdk: Option<i32>,
    pub(crate) density: Option<i32>,
    pub(crate) rotation: Cell<Option<i32>>,
    pub(crate) refresh_rate: Option<f32>,
    pub(crate) visible_frame: Cell<Option<PixelRect>>,
    pub(crate) safe_area: Option<Insets>,
    pub(crate) system_window: Option<Insets>,
    pub(crate) keyboard_allowed: bool,
    pub(crate) backgrounds: bool,
    pub(crate) calls: RefCell<Vec<HostCall>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            sdk: Some(30),
            density: Some(320),
            rotation: Cell::new(Some(0)),
            refresh_rate: Some(60.0),
            visible_frame: Cell::new(None),
            safe_area: None,
            system_window: None,
            keyboard_allowed: true,
            backgrounds: true,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl RecordingHost {
    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl HostQueries for RecordingHost {
    fn attach_thread(&self) {
        self.record(HostCall::AttachThread);
    }

    fn detach_thread(&self) {
        self.record(HostCall::DetachThread);
    }

    fn sdk_version(&self) -> Option<i32> {
        self.sdk
    }

    fn display_density(&self) -> Option<i32> {
        self.density
    }

    fn rotation(&self) -> Option<i32> {
        self.rotation.get()
    }

    fn refresh_rate(&self) -> Option<f32> {
        self.refresh_rate
    }

    fn visible_display_frame(&self) -> Option<PixelRect> {
        self.visible_frame.get()
    }

    fn safe_area_insets(&self) -> Option<Insets> {
        self.safe_area
    }

    fn system_window_insets(&self) -> Option<Insets> {
        self.system_window
    }

    fn set_keyboard_visible(&self, visible: bool) -> bool {
        self.record(HostCall::SetKeyboardVisible(visible));
        self.keyboard_allowed
    }

    fn apply_chrome(&self, chrome: UserInterfaceChrome) {
        let flags = system_ui_flags(chrome, self.sdk.unwrap_or(0));
        self.record(HostCall::ApplyChrome(chrome, flags));
    }

    fn set_window_format(&self, color: ColorFormat, fullscreen: bool) {
        self.record(HostCall::SetWindowFormat(color, fullscreen));
    }

    fn allow_display_cutout(&self) {
        self.record(HostCall::AllowDisplayCutout);
    }

    fn set_requested_orientation(&self, request: RequestedOrientation) {
        self.record(HostCall::RequestOrientation(request));
    }

    fn move_task_to_back(&self) -> bool {
        self.record(HostCall::MoveTaskToBack);
        self.backgrounds
    }

    fn unicode_char(&self, key_code: i32, _meta_state: i32) -> Option<u32> {
        // Letters A..Z map to lowercase characters.
        (29..=54)
            .contains(&key_code)
            .then(|| u32::from(b'a') + key_code.abs_diff(29))
    }

    fn reset_content_rect_tracking(&self) {
        self.record(HostCall::ResetContentRectTracking);
    }

    fn report_error(&self, error: &GraphicsError) {
        self.record(HostCall::ReportError(*error));
    }
}
