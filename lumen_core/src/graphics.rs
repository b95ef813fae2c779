// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics context and surface lifecycle.
//!
//! [`ContextManager`] owns the display connection, the negotiated framebuffer
//! configuration, the window surface and the rendering context. Native calls
//! go through the [`GraphicsBackend`] trait, which mirrors the small subset of
//! EGL the session needs and hands out opaque handles.
//!
//! # Negotiation
//!
//! The requested [`ConfigAttributes`] are derived from [`DisplayConfig`]. If
//! no configuration matches, the request is relaxed one step at a time (see
//! [`ConfigAttributes::relaxed`]) until one does or nothing is left to relax.
//! Context creation walks [`context_cascade`] from the preferred tier down to
//! OpenGL ES 2.0.
//!
//! # Events
//!
//! Creating or losing a context is observable by the application. Rather than
//! calling back from inside the manager, these moments are queued as
//! [`GraphicsEvent`]s and drained by the controller with
//! [`ContextManager::take_events`].

use core::fmt;

use crate::config::{DisplayConfig, RenderingApi, SwapBehavior};
use crate::geometry::PixelSize;

/// Opaque handle to a framebuffer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConfigId(pub u64);

/// Opaque handle to a rendering context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

/// Opaque handle to a window surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Platform error code reported after a failed graphics call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The surface is no longer valid.
    BadSurface,
    /// The context was lost, typically after a power event.
    ContextLost,
    /// The context handle is invalid.
    BadContext,
    /// Any other platform code.
    Other(i32),
}

impl ErrorCode {
    const EGL_BAD_CONTEXT: i32 = 0x3006;
    const EGL_BAD_SURFACE: i32 = 0x300D;
    const EGL_CONTEXT_LOST: i32 = 0x300E;

    /// Classifies a raw platform error value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            Self::EGL_BAD_SURFACE => Self::BadSurface,
            Self::EGL_CONTEXT_LOST => Self::ContextLost,
            Self::EGL_BAD_CONTEXT => Self::BadContext,
            other => Self::Other(other),
        }
    }

    /// The raw platform value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::BadSurface => Self::EGL_BAD_SURFACE,
            Self::ContextLost => Self::EGL_CONTEXT_LOST,
            Self::BadContext => Self::EGL_BAD_CONTEXT,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSurface => f.write_str("bad surface"),
            Self::ContextLost => f.write_str("context lost"),
            Self::BadContext => f.write_str("bad context"),
            Self::Other(raw) => write!(f, "platform error {raw:#06x}"),
        }
    }
}

/// Errors raised by [`ContextManager`] operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// The display connection could not be opened.
    #[error("no display connection")]
    NoDisplay,
    /// Every relaxation of the requested attributes was rejected.
    #[error("no framebuffer configuration matches {0}")]
    NoMatchingConfig(ConfigAttributes),
    /// The window surface could not be created.
    #[error("window surface creation failed: {0}")]
    SurfaceCreation(ErrorCode),
    /// No tier of the context cascade could be created.
    #[error("context creation failed: {0}")]
    ContextCreation(ErrorCode),
    /// Binding the context to the surface failed.
    #[error("make-current failed: {0}")]
    MakeCurrent(ErrorCode),
    /// Presenting the back buffer failed.
    #[error("buffer swap failed: {0}")]
    Swap(ErrorCode),
}

impl GraphicsError {
    /// The platform code behind this error, if it came from a failed call.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::NoDisplay | Self::NoMatchingConfig(_) => None,
            Self::SurfaceCreation(code)
            | Self::ContextCreation(code)
            | Self::MakeCurrent(code)
            | Self::Swap(code) => Some(*code),
        }
    }

    /// Whether this error ends the initialization attempt for good.
    ///
    /// Fatal errors are reported to the host and never retried.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NoDisplay | Self::NoMatchingConfig(_))
    }
}

/// How a classified runtime error is recovered from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// Destroy and recreate the surface only.
    RecreateSurface,
    /// Drop the context and recreate it against the existing surface.
    RecreateContext,
    /// Tear everything down and initialize again.
    Reinitialize,
}

impl Recovery {
    /// Chooses a recovery for an error code; unknown errors reinitialize.
    #[must_use]
    pub const fn for_code(code: Option<ErrorCode>) -> Self {
        match code {
            Some(ErrorCode::BadSurface) => Self::RecreateSurface,
            Some(ErrorCode::ContextLost | ErrorCode::BadContext) => Self::RecreateContext,
            _ => Self::Reinitialize,
        }
    }
}

/// Framebuffer attributes passed to configuration selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ConfigAttributes {
    /// Red bits.
    pub red: i32,
    /// Green bits.
    pub green: i32,
    /// Blue bits.
    pub blue: i32,
    /// Alpha bits.
    pub alpha: i32,
    /// Depth bits.
    pub depth: i32,
    /// Stencil bits.
    pub stencil: i32,
    /// Multisample count; zero disables sample buffers.
    pub samples: i32,
}

impl ConfigAttributes {
    /// Builds the initial request for a session configuration.
    ///
    /// An 8-bit stencil forces 24-bit depth when any depth was requested.
    #[must_use]
    pub const fn from_config(config: &DisplayConfig) -> Self {
        let [red, green, blue, alpha] = config.color_format.channel_bits();
        let stencil = config.stencil_format.bits();
        let mut depth = config.depth_format.bits();
        if stencil > 0 && depth > 0 {
            depth = 24;
        }
        Self {
            red,
            green,
            blue,
            alpha,
            depth,
            stencil,
            samples: config.multisample.samples(),
        }
    }

    /// Returns the next, less demanding request.
    ///
    /// Multisampling drops by 2 until it reaches zero, then depth drops by 8
    /// until it reaches zero. Returns `None` when nothing is left to relax.
    #[must_use]
    pub const fn relaxed(self) -> Option<Self> {
        if self.samples > 0 {
            let samples = if self.samples > 2 { self.samples - 2 } else { 0 };
            Some(Self { samples, ..self })
        } else if self.depth > 0 {
            let depth = if self.depth > 8 { self.depth - 8 } else { 0 };
            Some(Self { depth, ..self })
        } else {
            None
        }
    }
}

impl fmt::Display for ConfigAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba {}/{}/{}/{} depth {} stencil {} samples {}",
            self.red, self.green, self.blue, self.alpha, self.depth, self.stencil, self.samples
        )
    }
}

/// Every request tried during negotiation, strictest first.
pub fn relaxation_sequence(initial: ConfigAttributes) -> impl Iterator<Item = ConfigAttributes> {
    core::iter::successors(Some(initial), |attrs| attrs.relaxed())
}

/// Context tiers tried for a preferred tier, newest first.
///
/// OpenGL ES 2.0 is always the last entry.
pub fn context_cascade(preferred: RenderingApi) -> impl Iterator<Item = RenderingApi> {
    [
        RenderingApi::OpenGlEs32,
        RenderingApi::OpenGlEs31,
        RenderingApi::OpenGlEs3,
        RenderingApi::OpenGlEs2,
    ]
    .into_iter()
    .filter(move |api| *api <= preferred)
}

/// Native graphics calls needed by [`ContextManager`].
///
/// Calls that can fail return `Option` or `bool`; the reason is then read
/// with [`last_error`](Self::last_error).
pub trait GraphicsBackend {
    /// Opens and initializes the default display connection.
    fn connect(&mut self) -> bool;

    /// Terminates the display connection.
    fn terminate(&mut self);

    /// Returns the first configuration matching `attributes`.
    fn choose_config(&mut self, attributes: &ConfigAttributes) -> Option<ConfigId>;

    /// Native visual id of a configuration.
    fn native_visual_id(&mut self, config: ConfigId) -> Option<i32>;

    /// Sets the native window's buffer format.
    fn set_buffers_geometry(&mut self, format: i32);

    /// Creates a surface for the current native window.
    fn create_window_surface(&mut self, config: ConfigId) -> Option<SurfaceId>;

    /// Requests a swap behavior other than the platform default.
    fn set_swap_behavior(&mut self, surface: SurfaceId, behavior: SwapBehavior);

    /// Current size of a surface.
    fn surface_size(&mut self, surface: SurfaceId) -> Option<PixelSize>;

    /// Destroys a surface.
    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Creates a context of the given tier.
    fn create_context(&mut self, config: ConfigId, api: RenderingApi) -> Option<ContextId>;

    /// Major version the created context reports.
    fn query_major_version(&mut self, context: ContextId) -> Option<i32>;

    /// Minor version the created context reports.
    fn query_minor_version(&mut self, context: ContextId) -> Option<i32>;

    /// Destroys a context.
    fn destroy_context(&mut self, context: ContextId);

    /// Binds `context` to `surface`, or unbinds when both are `None`.
    fn make_current(&mut self, surface: Option<SurfaceId>, context: Option<ContextId>) -> bool;

    /// Presents the back buffer of `surface`.
    fn swap_buffers(&mut self, surface: SurfaceId) -> bool;

    /// The error left by the most recent failed call.
    fn last_error(&mut self) -> ErrorCode;
}

/// A context lifecycle moment the application must hear about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphicsEvent {
    /// A context was created and made current against a surface of this size.
    SurfaceCreated(PixelSize),
    /// The context was destroyed or lost.
    SurfaceDestroyed,
}

/// Owner of the display connection, surface and context.
#[derive(Debug)]
pub struct ContextManager<G> {
    backend: G,
    connected: bool,
    config: Option<ConfigId>,
    context: Option<ContextId>,
    surface: Option<SurfaceId>,
    current: bool,
    api: RenderingApi,
    version: (i32, i32),
    drawable: PixelSize,
    events: Vec<GraphicsEvent>,
}

impl<G: GraphicsBackend> ContextManager<G> {
    /// Creates a manager with nothing initialized.
    pub fn new(backend: G) -> Self {
        Self {
            backend,
            connected: false,
            config: None,
            context: None,
            surface: None,
            current: false,
            api: RenderingApi::OpenGlEs2,
            version: (2, 0),
            drawable: PixelSize::default(),
            events: Vec::new(),
        }
    }

    /// Shared access to the backend.
    pub fn backend(&self) -> &G {
        &self.backend
    }

    /// Exclusive access to the backend.
    pub fn backend_mut(&mut self) -> &mut G {
        &mut self.backend
    }

    /// Whether a display connection is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether a surface exists.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Whether a context exists.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Whether the context is bound to the surface.
    pub fn is_current(&self) -> bool {
        self.current
    }

    /// Rendering tier of the current context.
    pub fn rendering_api(&self) -> RenderingApi {
        self.api
    }

    /// Negotiated `(major, minor)` context version.
    pub fn version(&self) -> (i32, i32) {
        self.version
    }

    /// Last known drawable size.
    pub fn drawable_size(&self) -> PixelSize {
        self.drawable
    }

    /// Records a drawable size after a resize was applied.
    pub fn set_drawable_size(&mut self, size: PixelSize) {
        self.drawable = size;
    }

    /// Queries the current size of the surface.
    pub fn measure_drawable(&mut self) -> Option<PixelSize> {
        let surface = self.surface?;
        self.backend.surface_size(surface)
    }

    /// Drains queued lifecycle events in the order they happened.
    pub fn take_events(&mut self) -> Vec<GraphicsEvent> {
        core::mem::take(&mut self.events)
    }

    /// Brings up whatever is missing so that a context is current on a
    /// surface.
    ///
    /// On the first call this opens the display and negotiates a
    /// configuration. When the connection already exists only the surface
    /// and context are (re)created as needed.
    pub fn ensure_surface_and_context(&mut self, config: &DisplayConfig) -> Result<(), GraphicsError> {
        if self.connected {
            self.init_surface(config)?;
            return self.init_context(config);
        }

        if !self.backend.connect() {
            return Err(GraphicsError::NoDisplay);
        }
        self.connected = true;

        let requested = ConfigAttributes::from_config(config);
        let mut last = requested;
        let mut chosen = None;
        for attrs in relaxation_sequence(requested) {
            last = attrs;
            if let Some(id) = self.backend.choose_config(&attrs) {
                chosen = Some((id, attrs));
                break;
            }
        }
        let Some((config_id, attrs)) = chosen else {
            log::warn!("framebuffer negotiation failed, last attempt: {last}");
            self.backend.terminate();
            self.connected = false;
            return Err(GraphicsError::NoMatchingConfig(last));
        };
        if attrs == requested {
            log::info!("framebuffer config: {attrs}");
        } else {
            log::info!("framebuffer config relaxed from {requested} to {attrs}");
        }
        self.config = Some(config_id);

        self.init_surface(config)?;
        if let Some(size) = self.measure_drawable() {
            self.drawable = size;
        }
        if let Some(format) = self.backend.native_visual_id(config_id) {
            self.backend.set_buffers_geometry(format);
        }
        self.init_context(config)
    }

    fn init_surface(&mut self, config: &DisplayConfig) -> Result<(), GraphicsError> {
        if self.surface.is_some() {
            return Ok(());
        }
        let Some(config_id) = self.config else {
            return Err(GraphicsError::NoDisplay);
        };
        let Some(surface) = self.backend.create_window_surface(config_id) else {
            return Err(GraphicsError::SurfaceCreation(self.backend.last_error()));
        };
        if config.swap_behavior != SwapBehavior::PlatformDefault {
            self.backend.set_swap_behavior(surface, config.swap_behavior);
        }
        self.surface = Some(surface);
        Ok(())
    }

    fn init_context(&mut self, config: &DisplayConfig) -> Result<(), GraphicsError> {
        let mut created = false;
        if self.context.is_none() {
            let Some(config_id) = self.config else {
                return Err(GraphicsError::NoDisplay);
            };
            let mut made = None;
            for api in context_cascade(config.preferred_api) {
                if let Some(context) = self.backend.create_context(config_id, api) {
                    made = Some((context, api));
                    break;
                }
            }
            let Some((context, requested)) = made else {
                return Err(GraphicsError::ContextCreation(self.backend.last_error()));
            };
            let (req_major, req_minor) = requested.version();
            let major = self.backend.query_major_version(context).unwrap_or(req_major);
            let minor = if major >= 3 {
                self.backend.query_minor_version(context).unwrap_or(req_minor)
            } else {
                req_minor
            };
            self.context = Some(context);
            self.version = (major, minor);
            self.api = RenderingApi::from_version(major, minor);
            created = true;
            log::info!("created context {major}.{minor} ({:?})", self.api);
        }

        if !self.backend.make_current(self.surface, self.context) {
            self.current = false;
            let code = self.backend.last_error();
            log::debug!("make-current failed: {code}");
            return Err(GraphicsError::MakeCurrent(code));
        }
        self.current = self.surface.is_some() && self.context.is_some();
        if created {
            self.events.push(GraphicsEvent::SurfaceCreated(self.drawable));
        }
        Ok(())
    }

    /// Rebinds the context if it exists but is not current.
    ///
    /// Returns whether a context is current afterwards. A failed bind is not
    /// an error; the caller simply skips the frame.
    pub fn ensure_current(&mut self) -> bool {
        if self.current {
            return true;
        }
        if self.surface.is_none() || self.context.is_none() {
            return false;
        }
        self.current = self.backend.make_current(self.surface, self.context);
        if !self.current {
            log::debug!("make-current failed: {}", self.backend.last_error());
        }
        self.current
    }

    /// Destroys the surface and unbinds the context, keeping the context.
    pub fn destroy_surface(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.backend.destroy_surface(surface);
        }
        if self.connected {
            self.backend.make_current(None, None);
        }
        self.current = false;
    }

    /// Tears down the context, surface and display connection.
    pub fn destroy_all(&mut self) {
        if self.connected {
            self.backend.make_current(None, None);
            if let Some(context) = self.context.take() {
                self.backend.destroy_context(context);
                self.events.push(GraphicsEvent::SurfaceDestroyed);
            }
            if let Some(surface) = self.surface.take() {
                self.backend.destroy_surface(surface);
            }
            self.backend.terminate();
        }
        self.connected = false;
        self.config = None;
        self.context = None;
        self.surface = None;
        self.current = false;
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&mut self) -> Result<(), GraphicsError> {
        let presented = match self.surface {
            Some(surface) => self.backend.swap_buffers(surface),
            None => false,
        };
        if presented {
            return Ok(());
        }
        let code = if self.surface.is_some() {
            self.backend.last_error()
        } else {
            ErrorCode::BadSurface
        };
        Err(GraphicsError::Swap(code))
    }

    /// Recovers from a runtime error according to its classification.
    ///
    /// Non-fatal failures during recovery are logged and left for the next
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns the fatal error when reinitialization cannot open a display or
    /// negotiate a framebuffer configuration.
    pub fn handle_error(
        &mut self,
        error: &GraphicsError,
        config: &DisplayConfig,
    ) -> Result<Recovery, GraphicsError> {
        let recovery = Recovery::for_code(error.code());
        log::warn!("recovering from {error} with {recovery:?}");
        let result = match recovery {
            Recovery::RecreateSurface => {
                self.destroy_surface();
                self.init_surface(config)
            }
            Recovery::RecreateContext => {
                if self.context.take().is_some() {
                    self.current = false;
                    self.events.push(GraphicsEvent::SurfaceDestroyed);
                }
                self.init_context(config)
            }
            Recovery::Reinitialize => {
                self.destroy_all();
                self.ensure_surface_and_context(config)
            }
        };
        match result {
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                log::warn!("recovery incomplete: {err}");
                Ok(recovery)
            }
            Ok(()) => Ok(recovery),
        }
    }
}
