// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host platform services.
//!
//! [`HostQueries`] is the narrow capability interface through which the
//! session talks to the host runtime (window manager, input method service,
//! activity). Every query returns `Option` or `bool`: a host call that fails
//! for any reason reports "unavailable" and the caller falls back to a safe
//! default. Nothing in this trait can make the session fail.
//!
//! [`NullHost`] implements every method as "unavailable" and is what the
//! session effectively sees on a host where no service is reachable.

use kurbo::Insets;

use crate::config::{ColorFormat, Orientations, UserInterfaceChrome};
use crate::geometry::PixelRect;
use crate::graphics::GraphicsError;

/// Host density value meaning "use the default density".
pub const DENSITY_DEFAULT: i32 = 0;
/// Host density value meaning "any density" (added in API 21).
pub const DENSITY_ANY: i32 = 0xfffe;
/// Host density value meaning "no density information".
pub const DENSITY_NONE: i32 = 0xffff;
/// Baseline density, at which one density-independent unit is one pixel.
pub const DENSITY_MEDIUM: f64 = 160.0;

/// Converts a host density value into a display scale factor.
///
/// Sentinel and non-positive values fall back to `1.0`.
#[must_use]
pub fn display_scale(density: Option<i32>) -> f64 {
    match density {
        Some(d) if d > 0 && d != DENSITY_ANY && d != DENSITY_NONE => f64::from(d) / DENSITY_MEDIUM,
        _ => 1.0,
    }
}

/// Screen orientation request pushed to the host when the supported set
/// changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestedOrientation {
    /// Follow the sensor in any orientation.
    Sensor,
    /// Follow the sensor between the two landscape orientations.
    SensorLandscape,
    /// Follow the sensor between the two portrait orientations.
    SensorPortrait,
}

impl RequestedOrientation {
    /// Chooses the host request for a supported-orientation set.
    #[must_use]
    pub fn from_supported(orientations: Orientations) -> Self {
        let portrait = orientations
            .intersects(Orientations::PORTRAIT | Orientations::PORTRAIT_UPSIDE_DOWN);
        let landscape = orientations.intersects(Orientations::LANDSCAPE);
        match (portrait, landscape) {
            (true, true) => Self::Sensor,
            (false, true) => Self::SensorLandscape,
            _ => Self::SensorPortrait,
        }
    }

    /// The host's numeric code for this request.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Sensor => 0x0000_0004,
            Self::SensorLandscape => 0x0000_0006,
            Self::SensorPortrait => 0x0000_0007,
        }
    }
}

const STATUS_BAR_HIDDEN: u32 = 0x0000_0001;
const UI_FLAG_LOW_PROFILE: u32 = 0x0000_0001;
const UI_FLAG_HIDE_NAVIGATION: u32 = 0x0000_0002;
const UI_FLAG_FULLSCREEN: u32 = 0x0000_0004;
const UI_FLAG_LAYOUT_STABLE: u32 = 0x0000_0100;
const UI_FLAG_LAYOUT_HIDE_NAVIGATION: u32 = 0x0000_0200;
const UI_FLAG_LAYOUT_FULLSCREEN: u32 = 0x0000_0400;
const UI_FLAG_IMMERSIVE_STICKY: u32 = 0x0000_1000;

/// System UI visibility flags for a chrome mode on a given SDK level.
///
/// Returns `None` when the SDK predates system UI visibility control.
#[must_use]
pub const fn system_ui_flags(chrome: UserInterfaceChrome, sdk: i32) -> Option<u32> {
    if sdk < 11 {
        return None;
    }
    let flags = match chrome {
        UserInterfaceChrome::NavigationAndStatusBar => 0,
        _ if sdk < 14 => STATUS_BAR_HIDDEN,
        UserInterfaceChrome::Navigation => UI_FLAG_FULLSCREEN,
        UserInterfaceChrome::Fullscreen if sdk < 19 => UI_FLAG_LOW_PROFILE | UI_FLAG_FULLSCREEN,
        UserInterfaceChrome::Fullscreen => {
            UI_FLAG_HIDE_NAVIGATION
                | UI_FLAG_FULLSCREEN
                | UI_FLAG_LAYOUT_STABLE
                | UI_FLAG_LAYOUT_HIDE_NAVIGATION
                | UI_FLAG_LAYOUT_FULLSCREEN
                | UI_FLAG_IMMERSIVE_STICKY
        }
    };
    Some(flags)
}

/// Services provided by the host runtime.
///
/// Implementations must swallow host-side failures (pending exceptions,
/// missing methods on old platform versions) and report them as `None` or
/// `false`.
pub trait HostQueries {
    /// Attaches the calling render thread to the host runtime.
    fn attach_thread(&self) {}

    /// Detaches the render thread before it returns to the host.
    fn detach_thread(&self) {}

    /// Platform SDK level, if known.
    fn sdk_version(&self) -> Option<i32> {
        None
    }

    /// Raw display density value.
    fn display_density(&self) -> Option<i32> {
        None
    }

    /// Current display rotation in quarter turns.
    fn rotation(&self) -> Option<i32> {
        None
    }

    /// Display refresh rate in Hz.
    fn refresh_rate(&self) -> Option<f32> {
        None
    }

    /// Part of the window not covered by system overlays.
    fn visible_display_frame(&self) -> Option<PixelRect> {
        None
    }

    /// Display-cutout safe area insets.
    fn safe_area_insets(&self) -> Option<Insets> {
        None
    }

    /// Insets consumed by system bars.
    fn system_window_insets(&self) -> Option<Insets> {
        None
    }

    /// Shows or hides the soft keyboard; returns whether the request went
    /// through.
    fn set_keyboard_visible(&self, visible: bool) -> bool {
        _ = visible;
        false
    }

    /// Applies platform decoration visibility.
    fn apply_chrome(&self, chrome: UserInterfaceChrome) {
        _ = chrome;
    }

    /// Sets the window pixel format and the fullscreen window flag.
    fn set_window_format(&self, color: ColorFormat, fullscreen: bool) {
        _ = (color, fullscreen);
    }

    /// Lets the window draw under display cutouts.
    fn allow_display_cutout(&self) {}

    /// Asks the host to lock the screen orientation.
    fn set_requested_orientation(&self, request: RequestedOrientation) {
        _ = request;
    }

    /// Moves the application task to the background; returns whether the
    /// host complied.
    fn move_task_to_back(&self) -> bool {
        false
    }

    /// Unicode code point produced by a key with the given meta state.
    fn unicode_char(&self, key_code: i32, meta_state: i32) -> Option<u32> {
        _ = (key_code, meta_state);
        None
    }

    /// Resets the host's content-size tracking so the next layout pass
    /// delivers a content-rect notification again.
    fn reset_content_rect_tracking(&self) {}

    /// Reports a fatal surface initialization error.
    fn report_error(&self, error: &GraphicsError) {
        _ = error;
    }
}

/// A host where every service is unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl HostQueries for NullHost {}
