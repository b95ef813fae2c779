// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session configuration.
//!
//! [`DisplayConfig`] is read when the session first creates its graphics
//! resources. The application fills it in before the first window arrives and
//! may change individual fields later through
//! [`Display`](crate::callbacks::Display) setters, which push the affected
//! settings to the host immediately.

use bitflags::bitflags;

/// Color buffer format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    /// 16-bit RGB, 5/6/5 bits per channel.
    Rgb565,
    /// 32-bit RGBA, 8 bits per channel.
    #[default]
    Rgba8888,
}

impl ColorFormat {
    /// Red, green, blue and alpha bit counts.
    #[must_use]
    pub const fn channel_bits(self) -> [i32; 4] {
        match self {
            Self::Rgb565 => [5, 6, 5, 0],
            Self::Rgba8888 => [8, 8, 8, 8],
        }
    }
}

/// Depth buffer format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DepthFormat {
    /// No depth buffer.
    #[default]
    None,
    /// 16-bit depth.
    Depth16,
    /// 24-bit depth.
    Depth24,
}

impl DepthFormat {
    /// Number of depth bits requested.
    #[must_use]
    pub const fn bits(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Depth16 => 16,
            Self::Depth24 => 24,
        }
    }
}

/// Stencil buffer format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StencilFormat {
    /// No stencil buffer.
    #[default]
    None,
    /// 8-bit stencil.
    Stencil8,
}

impl StencilFormat {
    /// Number of stencil bits requested.
    #[must_use]
    pub const fn bits(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Stencil8 => 8,
        }
    }
}

/// Multisample anti-aliasing level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Multisample {
    /// No multisampling.
    #[default]
    None,
    /// 4x multisampling.
    X4,
}

impl Multisample {
    /// Number of samples requested.
    #[must_use]
    pub const fn samples(self) -> i32 {
        match self {
            Self::None => 0,
            Self::X4 => 4,
        }
    }
}

/// Rendering API tier, ordered from baseline to newest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RenderingApi {
    /// OpenGL ES 2.0.
    #[default]
    OpenGlEs2,
    /// OpenGL ES 3.0.
    OpenGlEs3,
    /// OpenGL ES 3.1.
    OpenGlEs31,
    /// OpenGL ES 3.2.
    OpenGlEs32,
}

impl RenderingApi {
    /// The `(major, minor)` version requested for this tier.
    #[must_use]
    pub const fn version(self) -> (i32, i32) {
        match self {
            Self::OpenGlEs2 => (2, 0),
            Self::OpenGlEs3 => (3, 0),
            Self::OpenGlEs31 => (3, 1),
            Self::OpenGlEs32 => (3, 2),
        }
    }

    /// Maps a negotiated context version back to a tier.
    #[must_use]
    pub const fn from_version(major: i32, minor: i32) -> Self {
        match (major, minor) {
            (3, 2) => Self::OpenGlEs32,
            (3, 1) => Self::OpenGlEs31,
            (3, _) => Self::OpenGlEs3,
            _ => Self::OpenGlEs2,
        }
    }
}

/// Whether the back buffer survives a swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SwapBehavior {
    /// Leave the platform default untouched.
    #[default]
    PlatformDefault,
    /// Request that buffer contents be preserved across swaps.
    BufferPreserved,
    /// Request that buffer contents be discarded after a swap.
    BufferDestroyed,
}

/// Which platform decoration stays visible around the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum UserInterfaceChrome {
    /// Navigation bar visible, status bar hidden.
    #[default]
    Navigation,
    /// Both navigation and status bars visible.
    NavigationAndStatusBar,
    /// No decoration; the surface covers the whole display.
    Fullscreen,
}

bitflags! {
    /// Set of interface orientations the application supports.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Orientations: u8 {
        /// Upright portrait.
        const PORTRAIT = 1 << 0;
        /// Portrait rotated 180 degrees.
        const PORTRAIT_UPSIDE_DOWN = 1 << 1;
        /// Landscape with the device rotated clockwise.
        const LANDSCAPE_LEFT = 1 << 2;
        /// Landscape with the device rotated counter-clockwise.
        const LANDSCAPE_RIGHT = 1 << 3;
        /// Either landscape orientation.
        const LANDSCAPE = Self::LANDSCAPE_LEFT.bits() | Self::LANDSCAPE_RIGHT.bits();
        /// Every orientation.
        const ALL = Self::PORTRAIT.bits()
            | Self::PORTRAIT_UPSIDE_DOWN.bits()
            | Self::LANDSCAPE.bits();
    }
}

impl Default for Orientations {
    fn default() -> Self {
        Self::ALL
    }
}

/// Configuration of a display session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DisplayConfig {
    /// Color buffer format.
    pub color_format: ColorFormat,
    /// Depth buffer format.
    pub depth_format: DepthFormat,
    /// Stencil buffer format.
    pub stencil_format: StencilFormat,
    /// Multisample level.
    pub multisample: Multisample,
    /// Highest rendering API tier to try.
    pub preferred_api: RenderingApi,
    /// Buffer retention across swaps.
    pub swap_behavior: SwapBehavior,
    /// Orientations the application supports.
    pub supported_orientations: Orientations,
    /// Platform decoration mode.
    pub chrome: UserInterfaceChrome,
    /// Whether more than one simultaneous touch is reported.
    pub multitouch: bool,
}
