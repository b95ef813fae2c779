// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-rect handshake against a controller on a real render thread.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use kurbo::Rect;
use lumen_core::clock::MonotonicClock;
use lumen_core::config::DisplayConfig;
use lumen_core::controller::{LifecycleController, Platform};
use lumen_core::geometry::{PixelRect, PixelSize};
use lumen_core::graphics::{
    ConfigAttributes, ConfigId, ContextId, ErrorCode, GraphicsBackend, SurfaceId,
};
use lumen_core::host::HostQueries;
use lumen_core::lifecycle::{PlatformCommand, PlatformEvent};
use lumen_core::rendezvous::{GeometrySender, RendezvousError};
use lumen_core::sensor::{RawSensorEvent, SensorDevice, SensorKind};
use lumen_core::time::Duration;

const CONTENT: PixelRect = PixelRect::new(0, 0, 800, 1200);

struct Window;

impl GraphicsBackend for Window {
    fn connect(&mut self) -> bool {
        true
    }
    fn terminate(&mut self) {}
    fn choose_config(&mut self, _attributes: &ConfigAttributes) -> Option<ConfigId> {
        Some(ConfigId(1))
    }
    fn native_visual_id(&mut self, _config: ConfigId) -> Option<i32> {
        None
    }
    fn set_buffers_geometry(&mut self, _format: i32) {}
    fn create_window_surface(&mut self, _config: ConfigId) -> Option<SurfaceId> {
        Some(SurfaceId(1))
    }
    fn set_swap_behavior(&mut self, _surface: SurfaceId, _behavior: lumen_core::config::SwapBehavior) {}
    fn surface_size(&mut self, _surface: SurfaceId) -> Option<PixelSize> {
        Some(PixelSize::new(800, 1200))
    }
    fn destroy_surface(&mut self, _surface: SurfaceId) {}
    fn create_context(
        &mut self,
        _config: ConfigId,
        _api: lumen_core::config::RenderingApi,
    ) -> Option<ContextId> {
        Some(ContextId(1))
    }
    fn query_major_version(&mut self, _context: ContextId) -> Option<i32> {
        Some(2)
    }
    fn query_minor_version(&mut self, _context: ContextId) -> Option<i32> {
        None
    }
    fn destroy_context(&mut self, _context: ContextId) {}
    fn make_current(&mut self, _surface: Option<SurfaceId>, _context: Option<ContextId>) -> bool {
        true
    }
    fn swap_buffers(&mut self, _surface: SurfaceId) -> bool {
        true
    }
    fn last_error(&mut self) -> ErrorCode {
        ErrorCode::Other(0x3000)
    }
}

/// Reports a soft keyboard covering the bottom 300 pixels.
struct KeyboardHost;

impl HostQueries for KeyboardHost {
    fn visible_display_frame(&self) -> Option<PixelRect> {
        Some(PixelRect::new(0, 0, 800, 900))
    }
}

struct NoSensors;

impl SensorDevice for NoSensors {
    fn is_available(&self, _kind: SensorKind) -> bool {
        false
    }
    fn min_delay(&self, _kind: SensorKind) -> Option<Duration> {
        None
    }
    fn create_queue(&mut self) -> bool {
        false
    }
    fn destroy_queue(&mut self) {}
    fn enable(&mut self, _kind: SensorKind) -> bool {
        false
    }
    fn disable(&mut self, _kind: SensorKind) -> bool {
        false
    }
    fn set_event_rate(&mut self, _kind: SensorKind, _interval: Duration) {}
    fn poll(&mut self) -> Option<RawSensorEvent> {
        None
    }
}

struct TestPlatform;

impl Platform for TestPlatform {
    type Graphics = Window;
    type Host = KeyboardHost;
    type Sensors = NoSensors;
    type Clock = MonotonicClock;
}

struct Session {
    geometry: GeometrySender,
    events: Sender<PlatformEvent>,
    render: JoinHandle<Vec<(bool, Rect)>>,
}

/// Starts a controller on its own thread and returns the UI-side handles.
fn start_session() -> Session {
    let (handles_tx, handles_rx) = mpsc::channel();
    let render = thread::spawn(move || {
        let mut controller = LifecycleController::<TestPlatform>::new(
            DisplayConfig::default(),
            Window,
            KeyboardHost,
            NoSensors,
            MonotonicClock,
        );
        let (keyboard_tx, keyboard_rx) = mpsc::channel();
        controller
            .callbacks_mut()
            .keyboard_visibility_changed
            .set(Some(Box::new(move |_, visible, frame| {
                keyboard_tx.send((visible, frame)).unwrap();
            })));
        handles_tx
            .send((controller.geometry_sender(), controller.event_sender()))
            .unwrap();
        controller.run();
        keyboard_rx.try_iter().collect()
    });
    let (geometry, events) = handles_rx.recv().unwrap();
    Session {
        geometry,
        events,
        render,
    }
}

#[test]
fn applied_rect_matches_submitted_on_return() {
    let session = start_session();
    session
        .events
        .send(PlatformEvent::Command(PlatformCommand::WindowCreated))
        .unwrap();

    session.geometry.set_content_rect(CONTENT).unwrap();
    assert_eq!(session.geometry.applied(), CONTENT);

    let shrunk = PixelRect::new(0, 0, 800, 900);
    session.geometry.set_content_rect(shrunk).unwrap();
    assert_eq!(session.geometry.applied(), shrunk);

    session
        .events
        .send(PlatformEvent::Command(PlatformCommand::Destroy))
        .unwrap();
    let keyboard = session.render.join().unwrap();
    assert_eq!(
        keyboard,
        [
            (true, Rect::new(0.0, 900.0, 800.0, 1200.0)),
            (false, Rect::ZERO),
        ],
        "keyboard shown, then hidden once content matches the visible frame"
    );
}

#[test]
fn submissions_from_many_ui_calls_all_complete() {
    let session = start_session();
    for bottom in (1000..1200).step_by(50) {
        let rect = PixelRect::new(0, 0, 800, bottom);
        session.geometry.set_content_rect(rect).unwrap();
        assert_eq!(session.geometry.applied(), rect);
    }
    session
        .events
        .send(PlatformEvent::Command(PlatformCommand::Destroy))
        .unwrap();
    session.render.join().unwrap();
}

#[test]
fn ui_call_fails_after_render_thread_exits() {
    let session = start_session();
    session
        .events
        .send(PlatformEvent::Command(PlatformCommand::Destroy))
        .unwrap();
    session.render.join().unwrap();
    assert_eq!(
        session.geometry.set_content_rect(CONTENT),
        Err(RendezvousError::SessionClosed)
    );
}
