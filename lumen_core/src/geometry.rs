// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window geometry reconciliation.
//!
//! Everything in this module is pure: callers supply the measured sizes and
//! rectangles, and the [`GeometryReconciler`] answers whether a notification
//! is due. It owns the [`GeometryState`] that remembers what was last
//! reported.
//!
//! Three independent checks live here:
//!
//! - **Resize debouncing.** The drawable size is polled every frame. A raw
//!   size change is held back for up to [`RESIZE_DEBOUNCE_FRAMES`] frames
//!   because the content-rect event that usually follows carries the
//!   authoritative size; reacting to both would report two inconsistent
//!   resizes per rotation.
//! - **Keyboard inference.** The occluded area between the content rectangle
//!   and the visible frame is split into four edge bands; the largest band
//!   that is at least 100 dp in both dimensions is taken to be the keyboard.
//! - **Orientation.** The host rotation index maps onto [`Orientation`] and
//!   is reported only when it changes.

use kurbo::{Insets, Rect};

/// Number of polled frames a raw resize may be deferred.
pub const RESIZE_DEBOUNCE_FRAMES: u32 = 5;

/// Minimum keyboard extent in density-independent units.
pub const MIN_KEYBOARD_DP: f64 = 100.0;

/// An integer rectangle in physical pixels, edges exclusive on the right and
/// bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl PixelRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent; negative when the edges are inverted. Saturates at
    /// the `i32` range.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Vertical extent; negative when the edges are inverted. Saturates at
    /// the `i32` range.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Signed area, computed in 64 bits.
    #[must_use]
    pub const fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Returns `true` when either extent is zero or negative.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Converts to a floating-point [`Rect`].
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            f64::from(self.left),
            f64::from(self.top),
            f64::from(self.right),
            f64::from(self.bottom),
        )
    }
}

/// A drawable size in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl PixelSize {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// The window edge an occluded band is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Band {
    /// Between the content and visible left edges.
    Left,
    /// Between the visible and content right edges.
    Right,
    /// Between the content and visible top edges.
    Top,
    /// Between the visible and content bottom edges.
    Bottom,
}

/// Splits the area outside `visible` into four bands, each spanning the full
/// opposite dimension of `content`.
#[must_use]
pub fn occluded_bands(content: PixelRect, visible: PixelRect) -> [(Band, PixelRect); 4] {
    [
        (
            Band::Left,
            PixelRect::new(content.left, content.top, visible.left, content.bottom),
        ),
        (
            Band::Right,
            PixelRect::new(visible.right, content.top, content.right, content.bottom),
        ),
        (
            Band::Top,
            PixelRect::new(content.left, content.top, content.right, visible.top),
        ),
        (
            Band::Bottom,
            PixelRect::new(content.left, visible.bottom, content.right, content.bottom),
        ),
    ]
}

/// Picks the band most likely to be a soft keyboard.
///
/// A band qualifies when both its width and height reach
/// [`MIN_KEYBOARD_DP`] scaled by `scale`. The qualifying band with the
/// largest positive area wins; ties keep the earlier band in
/// [`occluded_bands`] order. Returns `None` when nothing qualifies.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the threshold is a small pixel count; truncation matches integer pixel comparison"
)]
pub fn select_keyboard_band(
    content: PixelRect,
    visible: PixelRect,
    scale: f64,
) -> Option<(Band, PixelRect)> {
    let minimum = (MIN_KEYBOARD_DP * scale) as i32;
    let mut best: Option<(Band, PixelRect)> = None;
    for (band, rect) in occluded_bands(content, visible) {
        if rect.width() < minimum || rect.height() < minimum || rect.area() <= 0 {
            continue;
        }
        if best.is_none_or(|(_, current)| rect.area() > current.area()) {
            best = Some((band, rect));
        }
    }
    best
}

/// Computes chrome insets from the visible frame when the host cannot report
/// them directly.
///
/// An empty visible frame yields zero insets.
#[must_use]
pub fn fallback_chrome_insets(visible: PixelRect, drawable: PixelSize) -> Insets {
    if visible.is_empty() {
        return Insets::ZERO;
    }
    Insets {
        x0: f64::from(visible.left),
        y0: f64::from(visible.top),
        x1: f64::from(drawable.width.saturating_sub(visible.right)),
        y1: f64::from(drawable.height.saturating_sub(visible.bottom)),
    }
}

/// Interface orientation derived from the host rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Rotation could not be determined.
    #[default]
    Unknown,
    /// Upright portrait.
    Portrait,
    /// Portrait rotated 180 degrees.
    PortraitUpsideDown,
    /// Landscape, rotated 270 degrees from natural.
    LandscapeLeft,
    /// Landscape, rotated 90 degrees from natural.
    LandscapeRight,
}

impl Orientation {
    /// Maps a host rotation index (0, 1, 2, 3 quarter turns) to an
    /// orientation.
    #[must_use]
    pub const fn from_rotation(rotation: Option<i32>) -> Self {
        match rotation {
            Some(0) => Self::Portrait,
            Some(1) => Self::LandscapeRight,
            Some(2) => Self::PortraitUpsideDown,
            Some(3) => Self::LandscapeLeft,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of one resize poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeDecision {
    /// The measured size equals the known size.
    Unchanged,
    /// The size changed but the notification is held back.
    Deferred {
        /// Polls left before the change is applied regardless.
        remaining: u32,
    },
    /// The new size should be applied and reported.
    Apply(PixelSize),
}

/// Frame-count debouncer for raw drawable size changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeDebouncer {
    remaining: u32,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self {
            remaining: RESIZE_DEBOUNCE_FRAMES,
        }
    }
}

impl ResizeDebouncer {
    /// Polls left before a pending change is applied.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Compares `actual` against `known` and decides what to do.
    ///
    /// A forced check (from a content-rect change) or an exhausted counter
    /// applies the change and resets the counter; otherwise the counter is
    /// decremented.
    pub fn observe(&mut self, known: PixelSize, actual: PixelSize, force: bool) -> ResizeDecision {
        if known == actual {
            return ResizeDecision::Unchanged;
        }
        if force || self.remaining == 0 {
            self.remaining = RESIZE_DEBOUNCE_FRAMES;
            ResizeDecision::Apply(actual)
        } else {
            self.remaining -= 1;
            ResizeDecision::Deferred {
                remaining: self.remaining,
            }
        }
    }
}

/// A keyboard visibility change to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardChange {
    /// Whether a keyboard now occludes part of the window.
    pub visible: bool,
    /// The occluded band, or [`PixelRect::ZERO`] when hidden.
    pub frame: PixelRect,
}

/// Geometry remembered between reconciliation passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GeometryState {
    /// Content rectangle most recently applied from the rendezvous.
    pub content_rect: PixelRect,
    /// Visible frame from the last keyboard computation.
    pub visible_frame: PixelRect,
    /// Last reported keyboard rectangle.
    pub keyboard_frame: PixelRect,
    /// Last reported keyboard visibility.
    pub keyboard_visible: bool,
    /// Last reported interface orientation.
    pub orientation: Orientation,
}

/// Owner of [`GeometryState`]; decides when geometry notifications fire.
#[derive(Clone, Debug, Default)]
pub struct GeometryReconciler {
    state: GeometryState,
    debounce: ResizeDebouncer,
}

impl GeometryReconciler {
    /// Creates a reconciler that considers `orientation` already reported.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            state: GeometryState {
                orientation,
                ..GeometryState::default()
            },
            debounce: ResizeDebouncer::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GeometryState {
        &self.state
    }

    /// Polls left on the resize debounce counter.
    #[must_use]
    pub fn resize_debounce(&self) -> u32 {
        self.debounce.remaining()
    }

    /// Records the content rectangle handed over by the rendezvous.
    pub fn apply_content_rect(&mut self, rect: PixelRect) {
        self.state.content_rect = rect;
    }

    /// Runs one resize poll. See [`ResizeDebouncer::observe`].
    pub fn check_resize(&mut self, known: PixelSize, actual: PixelSize, force: bool) -> ResizeDecision {
        self.debounce.observe(known, actual, force)
    }

    /// Stores `current` and returns it if it differs from the last report.
    pub fn update_orientation(&mut self, current: Orientation) -> Option<Orientation> {
        if self.state.orientation == current {
            return None;
        }
        self.state.orientation = current;
        Some(current)
    }

    /// Recomputes keyboard visibility against the applied content rectangle.
    ///
    /// Returns a change only when the visibility flag or the keyboard
    /// rectangle differs from the last report.
    pub fn update_keyboard(&mut self, visible: PixelRect, scale: f64) -> Option<KeyboardChange> {
        self.state.visible_frame = visible;
        let (keyboard_visible, frame) =
            match select_keyboard_band(self.state.content_rect, visible, scale) {
                Some((_, rect)) => (true, rect),
                None => (false, PixelRect::ZERO),
            };
        if keyboard_visible == self.state.keyboard_visible && frame == self.state.keyboard_frame {
            return None;
        }
        self.state.keyboard_visible = keyboard_visible;
        self.state.keyboard_frame = frame;
        Some(KeyboardChange {
            visible: keyboard_visible,
            frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: PixelRect = PixelRect::new(0, 0, 800, 1200);

    #[test]
    fn extreme_edges_saturate() {
        let wide = PixelRect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(wide.width(), i32::MAX);
        assert_eq!(wide.height(), i32::MAX);
        assert!(!wide.is_empty());

        let inverted = PixelRect::new(i32::MAX, 0, i32::MIN, 10);
        assert_eq!(inverted.width(), i32::MIN);
        assert!(inverted.is_empty());
    }

    #[test]
    fn bottom_keyboard_band_is_selected() {
        let visible = PixelRect::new(0, 0, 800, 900);
        let (band, rect) = select_keyboard_band(CONTENT, visible, 1.0).unwrap();
        assert_eq!(band, Band::Bottom);
        assert_eq!(rect, PixelRect::new(0, 900, 800, 1200));
        assert_eq!(rect.area(), 240_000);
    }

    #[test]
    fn band_selection_is_idempotent() {
        let visible = PixelRect::new(0, 0, 800, 900);
        let first = select_keyboard_band(CONTENT, visible, 2.0);
        let second = select_keyboard_band(CONTENT, visible, 2.0);
        assert_eq!(first, second);
    }

    #[test]
    fn fully_visible_content_has_no_keyboard() {
        assert_eq!(select_keyboard_band(CONTENT, CONTENT, 1.0), None);
    }

    #[test]
    fn thin_bands_do_not_qualify() {
        // 60px status-bar-like band at the top, below the 100dp threshold.
        let visible = PixelRect::new(0, 60, 800, 1200);
        assert_eq!(select_keyboard_band(CONTENT, visible, 1.0), None);
    }

    #[test]
    fn threshold_scales_with_density() {
        // 150px is enough at 1x but not at 2x (200px minimum).
        let visible = PixelRect::new(0, 0, 800, 1050);
        assert!(select_keyboard_band(CONTENT, visible, 1.0).is_some());
        assert!(select_keyboard_band(CONTENT, visible, 2.0).is_none());
    }

    #[test]
    fn largest_band_wins() {
        // Side keyboard of 300px plus a 200px bottom strip.
        let visible = PixelRect::new(0, 0, 500, 1000);
        let (band, rect) = select_keyboard_band(CONTENT, visible, 1.0).unwrap();
        assert_eq!(band, Band::Right);
        assert_eq!(rect.area(), 300 * 1200);
    }

    #[test]
    fn unforced_resize_waits_out_the_counter() {
        let mut debounce = ResizeDebouncer::default();
        let known = PixelSize::new(800, 1200);
        let actual = PixelSize::new(1200, 800);
        for expected in (0..RESIZE_DEBOUNCE_FRAMES).rev() {
            assert_eq!(
                debounce.observe(known, actual, false),
                ResizeDecision::Deferred {
                    remaining: expected
                }
            );
        }
        assert_eq!(debounce.remaining(), 0);
        assert_eq!(
            debounce.observe(known, actual, false),
            ResizeDecision::Apply(actual)
        );
        assert_eq!(debounce.remaining(), RESIZE_DEBOUNCE_FRAMES);
    }

    #[test]
    fn forced_resize_applies_immediately_and_resets() {
        let mut debounce = ResizeDebouncer::default();
        let known = PixelSize::new(800, 1200);
        let actual = PixelSize::new(1200, 800);
        let _ = debounce.observe(known, actual, false);
        let _ = debounce.observe(known, actual, false);
        assert_eq!(debounce.remaining(), 3);
        assert_eq!(
            debounce.observe(known, actual, true),
            ResizeDecision::Apply(actual)
        );
        assert_eq!(debounce.remaining(), RESIZE_DEBOUNCE_FRAMES);
    }

    #[test]
    fn unchanged_size_leaves_counter_alone() {
        let mut debounce = ResizeDebouncer::default();
        let size = PixelSize::new(10, 10);
        assert_eq!(debounce.observe(size, size, true), ResizeDecision::Unchanged);
        assert_eq!(debounce.remaining(), RESIZE_DEBOUNCE_FRAMES);
    }

    #[test]
    fn rotation_mapping() {
        assert_eq!(Orientation::from_rotation(Some(0)), Orientation::Portrait);
        assert_eq!(
            Orientation::from_rotation(Some(1)),
            Orientation::LandscapeRight
        );
        assert_eq!(
            Orientation::from_rotation(Some(2)),
            Orientation::PortraitUpsideDown
        );
        assert_eq!(
            Orientation::from_rotation(Some(3)),
            Orientation::LandscapeLeft
        );
        assert_eq!(Orientation::from_rotation(Some(4)), Orientation::Unknown);
        assert_eq!(Orientation::from_rotation(None), Orientation::Unknown);
    }

    #[test]
    fn orientation_reported_only_on_change() {
        let mut reconciler = GeometryReconciler::new(Orientation::Portrait);
        assert_eq!(reconciler.update_orientation(Orientation::Portrait), None);
        assert_eq!(
            reconciler.update_orientation(Orientation::LandscapeLeft),
            Some(Orientation::LandscapeLeft)
        );
        assert_eq!(reconciler.update_orientation(Orientation::LandscapeLeft), None);
    }

    #[test]
    fn keyboard_change_reported_once() {
        let mut reconciler = GeometryReconciler::default();
        reconciler.apply_content_rect(CONTENT);
        let visible = PixelRect::new(0, 0, 800, 900);

        let change = reconciler.update_keyboard(visible, 1.0).unwrap();
        assert!(change.visible);
        assert_eq!(change.frame, PixelRect::new(0, 900, 800, 1200));
        assert_eq!(reconciler.update_keyboard(visible, 1.0), None);

        let hidden = reconciler.update_keyboard(CONTENT, 1.0).unwrap();
        assert!(!hidden.visible);
        assert_eq!(hidden.frame, PixelRect::ZERO);
        assert!(!reconciler.state().keyboard_visible);
    }

    #[test]
    fn keyboard_resize_is_a_change() {
        let mut reconciler = GeometryReconciler::default();
        reconciler.apply_content_rect(CONTENT);
        let _ = reconciler.update_keyboard(PixelRect::new(0, 0, 800, 900), 1.0);
        let change = reconciler
            .update_keyboard(PixelRect::new(0, 0, 800, 700), 1.0)
            .unwrap();
        assert!(change.visible);
        assert_eq!(change.frame.height(), 500);
    }

    #[test]
    fn fallback_insets_from_visible_frame() {
        let insets = fallback_chrome_insets(
            PixelRect::new(0, 48, 800, 1100),
            PixelSize::new(800, 1200),
        );
        assert_eq!(insets.y0, 48.0);
        assert_eq!(insets.y1, 100.0);
        assert_eq!(insets.x0, 0.0);
        assert_eq!(insets.x1, 0.0);
        assert_eq!(
            fallback_chrome_insets(PixelRect::ZERO, PixelSize::new(800, 1200)),
            Insets::ZERO
        );
    }
}
