// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session lifecycle state machine.
//!
//! The lifecycle is a small set of [`LifecycleFlags`] plus a pure
//! [`transition`] function. Each platform command yields the next flags and a
//! list of [`Effect`]s; the controller carries the effects out in order.
//! Keeping the decision pure means the whole table can be tested without a
//! graphics stack.

use crate::input::InputEvent;

/// Commands delivered by the platform's activity glue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlatformCommand {
    /// A native window is ready.
    WindowCreated,
    /// The platform reports a window resize.
    WindowResized,
    /// The native window is about to go away.
    WindowDestroyed,
    /// The window contents must be redrawn.
    WindowRedrawNeeded,
    /// The content rectangle changed; the new one waits in the rendezvous
    /// cell.
    ContentRectChanged,
    /// The activity gained input focus.
    GainedFocus,
    /// The activity lost input focus.
    LostFocus,
    /// The system is low on memory.
    LowMemory,
    /// The activity started.
    Start,
    /// The activity resumed.
    Resume,
    /// The activity paused.
    Pause,
    /// The activity stopped.
    Stop,
    /// The activity is being destroyed.
    Destroy,
    /// The activity should save its state.
    SaveState,
}

impl PlatformCommand {
    /// Short name for logs and traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WindowCreated => "window-created",
            Self::WindowResized => "window-resized",
            Self::WindowDestroyed => "window-destroyed",
            Self::WindowRedrawNeeded => "window-redraw-needed",
            Self::ContentRectChanged => "content-rect-changed",
            Self::GainedFocus => "gained-focus",
            Self::LostFocus => "lost-focus",
            Self::LowMemory => "low-memory",
            Self::Start => "start",
            Self::Resume => "resume",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Destroy => "destroy",
            Self::SaveState => "save-state",
        }
    }
}

/// Anything the render thread can be woken for.
#[derive(Clone, Debug, PartialEq)]
pub enum PlatformEvent {
    /// A lifecycle command.
    Command(PlatformCommand),
    /// Raw input.
    Input(InputEvent),
    /// The sensor queue has samples.
    SensorQueueReady,
}

/// Persistent lifecycle flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LifecycleFlags {
    /// A native window exists.
    pub has_window: bool,
    /// Frames are being produced.
    pub animating: bool,
    /// The first activation already happened in this process.
    pub has_inited: bool,
}

/// Externally visible lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// No native window.
    #[default]
    NoWindow,
    /// A window but no rendering context.
    WindowNoContext,
    /// A context exists but frames are not being produced.
    ContextInactive,
    /// Frames are being produced.
    Animating,
}

impl LifecycleState {
    /// Derives the state from the flags and context presence.
    #[must_use]
    pub const fn derive(flags: LifecycleFlags, has_context: bool) -> Self {
        if !flags.has_window {
            Self::NoWindow
        } else if flags.animating {
            Self::Animating
        } else if has_context {
            Self::ContextInactive
        } else {
            Self::WindowNoContext
        }
    }
}

/// Work the controller performs after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Bring up the surface and context.
    EnsureSurfaceAndContext,
    /// Destroy the surface, keeping the context.
    DestroySurface,
    /// Destroy everything including the display connection.
    DestroyAll,
    /// Call the refresh callback before the next render.
    RequestRefresh,
    /// Draw one frame now.
    DrawFrame,
    /// Report a focus change to the application.
    FocusChanged(bool),
    /// Reconcile sensors with the animating flag.
    SyncSensors(bool),
    /// Disable all sensors and release the event queue.
    ReleaseSensors,
    /// Apply the pending content rectangle and reconcile geometry.
    ApplyContentRect,
    /// Forward a low-memory warning.
    LowMemory,
    /// Re-apply the configured chrome mode.
    ApplyChrome,
    /// Leave the render loop.
    Exit,
}

fn set_animating(flags: &mut LifecycleFlags, animating: bool, effects: &mut Vec<Effect>) {
    if flags.animating == animating {
        return;
    }
    flags.animating = animating;
    effects.push(Effect::RequestRefresh);
    if animating && !flags.has_inited {
        flags.has_inited = true;
    } else {
        effects.push(Effect::FocusChanged(animating));
    }
    effects.push(Effect::SyncSensors(animating));
}

/// Computes the next flags and the effects for a command.
#[must_use]
pub fn transition(flags: LifecycleFlags, command: PlatformCommand) -> (LifecycleFlags, Vec<Effect>) {
    let mut next = flags;
    let mut effects = Vec::new();
    match command {
        PlatformCommand::WindowCreated => {
            next.has_window = true;
            effects.extend([
                Effect::EnsureSurfaceAndContext,
                Effect::RequestRefresh,
                Effect::DrawFrame,
            ]);
        }
        PlatformCommand::WindowDestroyed => {
            next.has_window = false;
            effects.push(Effect::DestroySurface);
            set_animating(&mut next, false, &mut effects);
        }
        PlatformCommand::WindowRedrawNeeded => effects.push(Effect::RequestRefresh),
        PlatformCommand::GainedFocus => set_animating(&mut next, true, &mut effects),
        PlatformCommand::LostFocus => {
            if next.animating {
                effects.extend([Effect::RequestRefresh, Effect::DrawFrame]);
                set_animating(&mut next, false, &mut effects);
            }
        }
        PlatformCommand::ContentRectChanged => {
            effects.extend([Effect::RequestRefresh, Effect::ApplyContentRect]);
        }
        PlatformCommand::LowMemory => effects.push(Effect::LowMemory),
        PlatformCommand::Start => effects.push(Effect::ApplyChrome),
        PlatformCommand::Destroy => {
            next.has_window = false;
            effects.extend([Effect::ReleaseSensors, Effect::DestroyAll]);
            set_animating(&mut next, false, &mut effects);
            effects.push(Effect::Exit);
        }
        PlatformCommand::WindowResized
        | PlatformCommand::Resume
        | PlatformCommand::Pause
        | PlatformCommand::Stop
        | PlatformCommand::SaveState => {}
    }
    (next, effects)
}
