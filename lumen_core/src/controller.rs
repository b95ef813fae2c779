// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render thread: lifecycle handling and the frame loop.
//!
//! [`LifecycleController`] owns every piece of session state. The platform
//! glue constructs it once per process, hands clones of
//! [`event_sender`](LifecycleController::event_sender) and
//! [`geometry_sender`](LifecycleController::geometry_sender) to the UI
//! thread, and calls [`run`](LifecycleController::run) on the render thread.
//! `run` returns after a destroy command; calling it again re-enters the same
//! session.
//!
//! Each loop iteration waits for events (blocking while inactive, polling
//! while animating), handles every pending event, and then draws a frame if
//! animating.

use core::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::callbacks::{Callbacks, Display, FrameFlags, SensorFn};
use crate::clock::Clock;
use crate::config::{DisplayConfig, UserInterfaceChrome};
use crate::geometry::{GeometryReconciler, GeometryState, Orientation, ResizeDecision};
use crate::graphics::{ContextManager, GraphicsBackend, GraphicsError, GraphicsEvent};
use crate::host::{HostQueries, display_scale};
use crate::input::{InputDispatcher, InputEvent};
use crate::lifecycle::{
    Effect, LifecycleFlags, LifecycleState, PlatformCommand, PlatformEvent, transition,
};
use crate::pacing::FramePacer;
use crate::rendezvous::{ContentRectCell, GeometrySender};
use crate::sensor::{SensorDevice, SensorKind, SensorPipeline};
use crate::trace::{CommandEvent, FrameEvent, RecoveryEvent, ResizeEvent, TraceSink, Tracer};

/// The native collaborators of a session.
pub trait Platform {
    /// Display connection, surfaces and contexts.
    type Graphics: GraphicsBackend;
    /// Window and activity queries.
    type Host: HostQueries;
    /// Motion sensors.
    type Sensors: SensorDevice;
    /// Monotonic time.
    type Clock: Clock;
}

/// Owner of the display session and driver of the render loop.
pub struct LifecycleController<P: Platform> {
    config: DisplayConfig,
    callbacks: Callbacks,
    graphics: ContextManager<P::Graphics>,
    sensors: SensorPipeline<P::Sensors>,
    host: P::Host,
    clock: P::Clock,
    geometry: GeometryReconciler,
    pacer: FramePacer,
    input: InputDispatcher,
    flags: LifecycleFlags,
    frame: FrameFlags,
    frame_index: u64,
    entered: bool,
    cutout_allowed: bool,
    cell: Arc<ContentRectCell>,
    sender: Sender<PlatformEvent>,
    events: Receiver<PlatformEvent>,
}

impl<P: Platform> fmt::Debug for LifecycleController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("config", &self.config)
            .field("flags", &self.flags)
            .field("state", &self.state())
            .field("geometry", self.geometry.state())
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> LifecycleController<P> {
    /// Creates a session. Nothing native is touched until [`run`](Self::run).
    pub fn new(
        config: DisplayConfig,
        graphics: P::Graphics,
        host: P::Host,
        sensors: P::Sensors,
        clock: P::Clock,
    ) -> Self {
        let (sender, events) = mpsc::channel();
        let pacer = FramePacer::new(clock.now());
        Self {
            input: InputDispatcher::new(config.multitouch),
            config,
            callbacks: Callbacks::default(),
            graphics: ContextManager::new(graphics),
            sensors: SensorPipeline::new(sensors),
            host,
            clock,
            geometry: GeometryReconciler::default(),
            pacer,
            flags: LifecycleFlags::default(),
            frame: FrameFlags::default(),
            frame_index: 0,
            entered: false,
            cutout_allowed: false,
            cell: Arc::new(ContentRectCell::new()),
            sender,
            events,
        }
    }

    /// A sender for platform commands, input and sensor wake-ups.
    pub fn event_sender(&self) -> Sender<PlatformEvent> {
        self.sender.clone()
    }

    /// A handle for the UI thread's content-rect notifications.
    pub fn geometry_sender(&self) -> GeometrySender {
        GeometrySender::new(Arc::clone(&self.cell), self.sender.clone())
    }

    /// Session configuration.
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Mutable configuration, for setup before the first window.
    pub fn config_mut(&mut self) -> &mut DisplayConfig {
        &mut self.config
    }

    /// Callback table.
    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    /// Installs or clears a sensor callback and reconciles sensor delivery.
    pub fn set_sensor_callback(&mut self, kind: SensorKind, callback: Option<SensorFn>) {
        self.callbacks.set_sensor(kind, callback);
        self.sensors
            .sync(self.callbacks.wanted_sensors(), self.flags.animating);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        LifecycleState::derive(self.flags, self.graphics.has_context())
    }

    /// Current lifecycle flags.
    pub fn flags(&self) -> LifecycleFlags {
        self.flags
    }

    /// The context manager.
    pub fn graphics(&self) -> &ContextManager<P::Graphics> {
        &self.graphics
    }

    /// The sensor pipeline.
    pub fn sensors(&self) -> &SensorPipeline<P::Sensors> {
        &self.sensors
    }

    /// The host.
    pub fn host(&self) -> &P::Host {
        &self.host
    }

    /// Geometry as of the last reconciliation.
    pub fn geometry(&self) -> &GeometryState {
        self.geometry.state()
    }

    /// Runs the render loop until a destroy command.
    pub fn run(&mut self) {
        self.run_with(Tracer::none());
    }

    /// Like [`run`](Self::run), reporting session events to `sink`.
    pub fn run_traced(&mut self, sink: &mut dyn TraceSink) {
        self.run_with(Tracer::new(sink));
    }

    fn run_with(&mut self, mut tracer: Tracer<'_>) {
        self.enter();
        while self.pump(&mut tracer) {
            if self.flags.animating {
                self.draw_frame(&mut tracer);
            }
        }
        self.leave();
    }

    fn enter(&mut self) {
        self.host.attach_thread();
        self.cell.reopen();
        self.frame.scale = display_scale(self.host.display_density());
        if !self.entered {
            self.entered = true;
            let orientation = Orientation::from_rotation(self.host.rotation());
            self.geometry = GeometryReconciler::new(orientation);
            self.pacer = FramePacer::new(self.clock.now());
        }
        let fullscreen = self.config.chrome == UserInterfaceChrome::Fullscreen;
        self.host
            .set_window_format(self.config.color_format, fullscreen);
        self.host.apply_chrome(self.config.chrome);
        if !self.cutout_allowed {
            self.cutout_allowed = true;
            self.host.allow_display_cutout();
        }
        log::debug!("render thread entered, display scale {}", self.frame.scale);
    }

    fn leave(&mut self) {
        self.cell.close();
        self.host.detach_thread();
        log::debug!("render thread left");
    }

    /// Handles every pending event. Returns `false` once the loop must end.
    fn pump(&mut self, tracer: &mut Tracer<'_>) -> bool {
        let mut next = if self.flags.animating {
            self.events.try_recv().ok()
        } else {
            match self.events.recv() {
                Ok(event) => Some(event),
                Err(_) => return false,
            }
        };
        while let Some(event) = next {
            if !self.handle_event(event, tracer) {
                return false;
            }
            next = self.events.try_recv().ok();
        }
        true
    }

    fn handle_event(&mut self, event: PlatformEvent, tracer: &mut Tracer<'_>) -> bool {
        match event {
            PlatformEvent::Command(command) => return self.handle_command(command, tracer),
            PlatformEvent::Input(input) => self.handle_input(&input, tracer),
            PlatformEvent::SensorQueueReady => {
                for sample in self.sensors.drain_queue() {
                    self.display(tracer.reborrow()).fire_sensor(&sample);
                }
            }
        }
        self.dispatch_graphics_events(tracer);
        true
    }

    fn handle_input(&mut self, input: &InputEvent, tracer: &mut Tracer<'_>) {
        let dispatcher = self.input;
        let handled = dispatcher.dispatch(input, &mut self.display(tracer.reborrow()));
        if !handled {
            log::trace!("input not handled: {input:?}");
        }
    }

    fn handle_command(&mut self, command: PlatformCommand, tracer: &mut Tracer<'_>) -> bool {
        let before = self.state();
        let (next, effects) = transition(self.flags, command);
        self.flags = next;
        self.frame.animating = next.animating;
        let mut keep_running = true;
        for effect in effects {
            keep_running &= self.apply_effect(effect, tracer);
        }
        let after = self.state();
        log::debug!("{}: {before:?} -> {after:?}", command.name());
        tracer.command(&CommandEvent {
            at: self.clock.now(),
            command,
            before,
            after,
        });
        keep_running
    }

    fn apply_effect(&mut self, effect: Effect, tracer: &mut Tracer<'_>) -> bool {
        match effect {
            Effect::EnsureSurfaceAndContext => {
                if let Err(error) = self.graphics.ensure_surface_and_context(&self.config) {
                    self.on_graphics_error(error, tracer);
                }
                self.dispatch_graphics_events(tracer);
            }
            Effect::DestroySurface => {
                self.graphics.destroy_surface();
                self.dispatch_graphics_events(tracer);
            }
            Effect::DestroyAll => {
                self.graphics.destroy_all();
                self.dispatch_graphics_events(tracer);
            }
            Effect::RequestRefresh => self.frame.refresh_requested = true,
            Effect::DrawFrame => self.draw_frame(tracer),
            Effect::FocusChanged(focused) => self.display(tracer.reborrow()).fire_focus(focused),
            Effect::SyncSensors(animating) => {
                self.sensors.sync(self.callbacks.wanted_sensors(), animating);
            }
            Effect::ReleaseSensors => self.sensors.release(),
            Effect::ApplyContentRect => self.apply_content_rect(tracer),
            Effect::LowMemory => self.display(tracer.reborrow()).fire_low_memory(),
            Effect::ApplyChrome => self.host.apply_chrome(self.config.chrome),
            Effect::Exit => return false,
        }
        true
    }

    fn on_graphics_error(&mut self, error: GraphicsError, tracer: &mut Tracer<'_>) {
        if error.is_fatal() {
            log::error!("surface initialization failed: {error}");
            self.host.report_error(&error);
            return;
        }
        match self.graphics.handle_error(&error, &self.config) {
            Ok(recovery) => tracer.graphics_recovery(&RecoveryEvent {
                at: self.clock.now(),
                error,
                recovery,
            }),
            Err(fatal) => self.on_graphics_error(fatal, tracer),
        }
    }

    fn dispatch_graphics_events(&mut self, tracer: &mut Tracer<'_>) {
        for event in self.graphics.take_events() {
            let mut display = self.display(tracer.reborrow());
            match event {
                GraphicsEvent::SurfaceCreated(size) => {
                    display.frame.refresh_requested = true;
                    display.fire_surface_created(size);
                }
                GraphicsEvent::SurfaceDestroyed => display.fire_surface_destroyed(),
            }
        }
    }

    fn apply_content_rect(&mut self, tracer: &mut Tracer<'_>) {
        let host = &self.host;
        let rect = self.cell.apply(|_| host.reset_content_rect_tracking());
        self.geometry.apply_content_rect(rect);
        self.check_resize(true, tracer);
        self.update_orientation(tracer);

        let visible = self.host.visible_display_frame().unwrap_or_else(|| {
            log::debug!("visible display frame unavailable, using the content rect");
            rect
        });
        if let Some(change) = self.geometry.update_keyboard(visible, self.frame.scale) {
            self.frame.refresh_requested = true;
            self.display(tracer.reborrow())
                .fire_keyboard(change.visible, change.frame.to_rect());
        }
    }

    fn update_orientation(&mut self, tracer: &mut Tracer<'_>) {
        let current = Orientation::from_rotation(self.host.rotation());
        if let Some(orientation) = self.geometry.update_orientation(current) {
            self.frame.refresh_requested = true;
            self.display(tracer.reborrow()).fire_orientation(orientation);
        }
    }

    fn check_resize(&mut self, force: bool, tracer: &mut Tracer<'_>) {
        let Some(measured) = self.graphics.measure_drawable() else {
            return;
        };
        let known = self.graphics.drawable_size();
        let decision = self.geometry.check_resize(known, measured, force);
        if decision == ResizeDecision::Unchanged {
            return;
        }
        tracer.resize(&ResizeEvent {
            at: self.clock.now(),
            measured,
            forced: force,
            decision,
        });
        if let ResizeDecision::Apply(size) = decision {
            log::debug!("drawable resized to {}x{}", size.width, size.height);
            self.graphics.set_drawable_size(size);
            self.update_orientation(tracer);
            self.frame.refresh_requested = true;
            self.display(tracer.reborrow()).fire_surface_resized(size);
        }
    }

    fn draw_frame(&mut self, tracer: &mut Tracer<'_>) {
        if !self.graphics.ensure_current() {
            return;
        }
        self.check_resize(false, tracer);

        self.frame.swapped = false;
        {
            let mut display = self.display(tracer.reborrow());
            if display.frame.refresh_requested {
                display.frame.refresh_requested = false;
                display.fire_refresh();
            }
            display.fire_render();
        }

        let paced = if self.frame.swapped {
            None
        } else {
            Some(self.pacer.pace(&self.clock, self.host.refresh_rate()))
        };
        self.dispatch_graphics_events(tracer);

        tracer.frame(&FrameEvent {
            frame_index: self.frame_index,
            at: self.clock.now(),
            swapped: self.frame.swapped,
            paced,
        });
        self.frame_index += 1;
    }

    fn display<'s>(&'s mut self, tracer: Tracer<'s>) -> Display<'s> {
        Display {
            config: &mut self.config,
            callbacks: &mut self.callbacks,
            surface: &mut self.graphics,
            sensors: &mut self.sensors,
            host: &self.host,
            clock: &self.clock,
            pacer: &mut self.pacer,
            input: &mut self.input,
            geometry: self.geometry.state(),
            frame: &mut self.frame,
            tracer,
        }
    }
}
