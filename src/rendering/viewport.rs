//! Pan/zoom viewport transform.
//!
//! Maps model coordinates (layout space) to view coordinates (screen space):
//!
//! ```text
//! view  = model * scale + translate
//! model = (view - translate) / scale
//! ```
//!
//! Scale is always clamped to `[min_scale, max_scale]`; translation is
//! unbounded.

use crate::services::Bounds;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A point in model or view space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Limits for the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Smallest allowed scale.
    pub min_scale: f64,
    /// Largest allowed scale.
    pub max_scale: f64,
    /// Scale change of one zoom step.
    pub zoom_step: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_step: 0.1,
        }
    }
}

impl ViewportConfig {
    fn is_valid(&self) -> bool {
        self.min_scale.is_finite()
            && self.max_scale.is_finite()
            && self.zoom_step.is_finite()
            && self.min_scale > 0.0
            && self.min_scale <= 1.0
            && self.max_scale >= 1.0
    }
}

/// Pan/zoom state.
///
/// # Example
///
/// ```rust
/// use famgraph::rendering::{Point, ViewportController};
///
/// let mut viewport = ViewportController::default();
/// viewport.zoom(1.0);
/// viewport.pan(10.0, -5.0);
///
/// let view = viewport.to_view(Point::new(3.0, 4.0));
/// assert_eq!(view, Point::new(16.0, 3.0));
/// assert_eq!(viewport.to_model(view), Point::new(3.0, 4.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    config: ViewportConfig,
    scale: f64,
    translate_x: f64,
    translate_y: f64,
    revision: u64,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl ViewportController {
    /// Creates a viewport at scale 1 with no translation.
    ///
    /// Invalid limits (non-positive, non-finite, or excluding 1) fall back to
    /// the defaults.
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        let config = if config.is_valid() {
            config
        } else {
            warn!(?config, "Invalid viewport limits, using defaults");
            ViewportConfig::default()
        };
        Self {
            config,
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            revision: 0,
        }
    }

    /// Returns the viewport limits.
    #[must_use]
    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Current scale.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Current translation as `(x, y)`.
    #[must_use]
    pub const fn translate(&self) -> (f64, f64) {
        (self.translate_x, self.translate_y)
    }

    /// Counter bumped on every state change; a new value means re-render.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    const fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.config.min_scale, self.config.max_scale)
    }

    /// Changes the scale by `delta`, clamped to the limits.
    ///
    /// Non-finite deltas are ignored.
    pub fn zoom(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.scale = self.clamp_scale(self.scale + delta);
        self.touch();
    }

    /// Zooms in by one configured step.
    pub fn zoom_in(&mut self) {
        self.zoom(self.config.zoom_step);
    }

    /// Zooms out by one configured step.
    pub fn zoom_out(&mut self) {
        self.zoom(-self.config.zoom_step);
    }

    /// Zooms while keeping the model point under `anchor` (view space) fixed.
    pub fn zoom_at(&mut self, delta: f64, anchor: Point) {
        if !delta.is_finite() {
            return;
        }
        let pinned = self.to_model(anchor);
        self.scale = self.clamp_scale(self.scale + delta);
        self.translate_x = pinned.x.mul_add(-self.scale, anchor.x);
        self.translate_y = pinned.y.mul_add(-self.scale, anchor.y);
        self.touch();
    }

    /// Moves the view by `(dx, dy)` in view units.
    ///
    /// Non-finite offsets are ignored.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.translate_x += dx;
        self.translate_y += dy;
        self.touch();
    }

    /// Restores scale 1 and zero translation.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.translate_x = 0.0;
        self.translate_y = 0.0;
        self.touch();
    }

    /// Places the model origin at the center of a view of the given size.
    pub fn center_origin(&mut self, view_width: f64, view_height: f64) {
        self.translate_x = view_width / 2.0;
        self.translate_y = view_height / 2.0;
        self.touch();
    }

    /// Chooses scale and translation so `bounds` fits the view with `padding`
    /// on every side.
    ///
    /// The scale is clamped, so very large layouts may still overflow. A
    /// zero-area box keeps scale 1 and is centered.
    pub fn fit(&mut self, bounds: &Bounds, view_width: f64, view_height: f64, padding: f64) {
        let avail_w = 2.0f64.mul_add(-padding, view_width).max(1.0);
        let avail_h = 2.0f64.mul_add(-padding, view_height).max(1.0);

        let fit_x = (bounds.width() > 0.0).then(|| avail_w / bounds.width());
        let fit_y = (bounds.height() > 0.0).then(|| avail_h / bounds.height());
        let scale = match (fit_x, fit_y) {
            (Some(x), Some(y)) => x.min(y),
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => 1.0,
        };
        self.scale = self.clamp_scale(scale);

        let (cx, cy) = bounds.center();
        self.translate_x = cx.mul_add(-self.scale, view_width / 2.0);
        self.translate_y = cy.mul_add(-self.scale, view_height / 2.0);
        self.touch();
    }

    /// Maps a model point to view space (scale, then translate).
    #[must_use]
    pub fn to_view(&self, model: Point) -> Point {
        Point {
            x: model.x.mul_add(self.scale, self.translate_x),
            y: model.y.mul_add(self.scale, self.translate_y),
        }
    }

    /// Maps a view point back to model space; the inverse of [`Self::to_view`].
    #[must_use]
    pub fn to_model(&self, view: Point) -> Point {
        Point {
            x: (view.x - self.translate_x) / self.scale,
            y: (view.y - self.translate_y) / self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const EPS: f64 = 1e-9;

    #[test_case(10.0, 5.0 ; "zoom in clamps to max")]
    #[test_case(-10.0, 0.1 ; "zoom out clamps to min")]
    #[test_case(0.5, 1.5 ; "within limits")]
    fn test_zoom_clamps(delta: f64, expected: f64) {
        let mut viewport = ViewportController::default();
        viewport.zoom(delta);
        assert!((viewport.scale() - expected).abs() < EPS);
    }

    #[test]
    fn test_pan_is_unclamped() {
        let mut viewport = ViewportController::default();
        viewport.pan(1e9, -1e9);
        assert_eq!(viewport.translate(), (1e9, -1e9));
    }

    #[test]
    fn test_reset() {
        let mut viewport = ViewportController::default();
        viewport.zoom(2.0);
        viewport.pan(5.0, 5.0);
        viewport.reset();
        assert!((viewport.scale() - 1.0).abs() < EPS);
        assert_eq!(viewport.translate(), (0.0, 0.0));
    }

    #[test]
    fn test_to_model_inverts_to_view() {
        let mut viewport = ViewportController::default();
        viewport.zoom(0.75);
        viewport.pan(-30.0, 12.5);
        let p = Point::new(123.4, -56.7);
        let back = viewport.to_model(viewport.to_view(p));
        assert!((back.x - p.x).abs() < EPS);
        assert!((back.y - p.y).abs() < EPS);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut viewport = ViewportController::default();
        viewport.pan(40.0, 20.0);
        let anchor = Point::new(200.0, 100.0);
        let before = viewport.to_model(anchor);
        viewport.zoom_at(1.0, anchor);
        let after = viewport.to_model(anchor);
        assert!((before.x - after.x).abs() < EPS);
        assert!((before.y - after.y).abs() < EPS);
        assert!((viewport.scale() - 2.0).abs() < EPS);
    }

    #[test]
    fn test_fit_centers_bounds() {
        let mut viewport = ViewportController::default();
        let bounds = Bounds {
            min_x: -100.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 300.0,
        };
        viewport.fit(&bounds, 800.0, 600.0, 0.0);
        assert!((viewport.scale() - 2.0).abs() < EPS);
        let center = viewport.to_view(Point::new(0.0, 150.0));
        assert!((center.x - 400.0).abs() < EPS);
        assert!((center.y - 300.0).abs() < EPS);
    }

    #[test]
    fn test_revision_and_non_finite_input() {
        let mut viewport = ViewportController::default();
        viewport.zoom(f64::NAN);
        viewport.pan(f64::INFINITY, 0.0);
        assert_eq!(viewport.revision(), 0);
        viewport.zoom_in();
        viewport.zoom_out();
        assert_eq!(viewport.revision(), 2);
        assert!((viewport.scale() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let viewport = ViewportController::new(ViewportConfig {
            min_scale: 3.0,
            max_scale: 2.0,
            zoom_step: 0.1,
        });
        assert_eq!(*viewport.config(), ViewportConfig::default());
    }
}
