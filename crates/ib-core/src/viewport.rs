//! Viewport transform: screen ↔ world conversion and pointer-anchored zoom.
//!
//! `screen = world * scale + pan`. Continuous gestures (wheel, background
//! drag) update a *target* transform on every event; the *committed*
//! transform that rendering reads follows it at most once per throttle
//! interval, latest value wins. Ending a gesture commits unconditionally.

use crate::model::Point;

/// `{pan_x, pan_y, scale}`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    pub pan_x: f32,
    pub pan_y: f32,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: scrolling up (negative delta) zooms in. A zero or
    /// non-finite delta (horizontal-only trackpad scroll) is no zoom at all.
    pub fn from_wheel(delta_y: f32) -> Option<Self> {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return None;
        }
        Some(if delta_y < 0.0 { Self::In } else { Self::Out })
    }
}

impl ViewTransform {
    pub fn screen_to_world(&self, sx: f32, sy: f32) -> Point {
        Point::new((sx - self.pan_x) / self.scale, (sy - self.pan_y) / self.scale)
    }

    pub fn world_to_screen(&self, wx: f32, wy: f32) -> Point {
        Point::new(wx * self.scale + self.pan_x, wy * self.scale + self.pan_y)
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Scale by `step` (in) or `1/step` (out) keeping the world point under
    /// `anchor` fixed. Returns `false` and leaves the transform untouched
    /// when the new scale would leave `[min, max]`.
    pub fn zoom_at(&mut self, anchor: Point, direction: ZoomDirection, step: f32, min: f32, max: f32) -> bool {
        let next = match direction {
            ZoomDirection::In => self.scale * step,
            ZoomDirection::Out => self.scale / step,
        };
        if !next.is_finite() || next < min || next > max {
            return false;
        }
        let world = self.screen_to_world(anchor.x, anchor.y);
        self.scale = next;
        self.pan_x = anchor.x - world.x * next;
        self.pan_y = anchor.y - world.y * next;
        true
    }

    /// `[a, b, c, d, e, f]` affine mapping world to screen, the layout
    /// Canvas2D `setTransform` and `kurbo::Affine::new` both take.
    pub fn as_affine(&self) -> [f64; 6] {
        let s = self.scale as f64;
        [s, 0.0, 0.0, s, self.pan_x as f64, self.pan_y as f64]
    }
}

// ─── Throttled controller ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ViewportController {
    target: ViewTransform,
    committed: ViewTransform,
    last_commit_ms: Option<f64>,
    throttle_ms: f64,
    min_scale: f32,
    max_scale: f32,
    zoom_step: f32,
}

impl ViewportController {
    pub fn new(throttle_ms: f64, min_scale: f32, max_scale: f32, zoom_step: f32) -> Self {
        Self {
            target: ViewTransform::default(),
            committed: ViewTransform::default(),
            last_commit_ms: None,
            throttle_ms,
            min_scale,
            max_scale,
            zoom_step,
        }
    }

    pub fn from_config(config: &crate::config::CanvasConfig) -> Self {
        Self::new(
            config.viewport_throttle_ms,
            config.min_scale,
            config.max_scale,
            config.zoom_step,
        )
    }

    /// The transform rendering should use.
    pub fn committed(&self) -> ViewTransform {
        self.committed
    }

    /// The latest transform, including updates not yet committed. Input
    /// conversion uses this so pointer math never lags the gesture.
    pub fn target(&self) -> ViewTransform {
        self.target
    }

    pub fn has_pending(&self) -> bool {
        self.target != self.committed
    }

    pub fn screen_to_world(&self, sx: f32, sy: f32) -> Point {
        self.target.screen_to_world(sx, sy)
    }

    pub fn world_to_screen(&self, wx: f32, wy: f32) -> Point {
        self.target.world_to_screen(wx, wy)
    }

    /// Continuous pan step. Returns `true` if the committed view changed.
    pub fn pan(&mut self, dx: f32, dy: f32, now_ms: f64) -> bool {
        self.target.pan(dx, dy);
        self.flush(now_ms)
    }

    /// Continuous zoom step. Returns `None` when rejected by the scale
    /// bounds, otherwise whether the committed view changed.
    pub fn zoom(&mut self, anchor: Point, direction: ZoomDirection, now_ms: f64) -> Option<bool> {
        if !self
            .target
            .zoom_at(anchor, direction, self.zoom_step, self.min_scale, self.max_scale)
        {
            log::debug!("viewport: zoom {direction:?} rejected at scale {}", self.target.scale);
            return None;
        }
        Some(self.flush(now_ms))
    }

    /// Commit the target if the throttle interval has elapsed.
    pub fn flush(&mut self, now_ms: f64) -> bool {
        if !self.has_pending() {
            return false;
        }
        let due = self
            .last_commit_ms
            .is_none_or(|last| now_ms - last >= self.throttle_ms);
        if due {
            self.commit(now_ms);
        }
        due
    }

    /// Gesture end: the final value is always applied.
    pub fn end_gesture(&mut self, now_ms: f64) -> bool {
        if !self.has_pending() {
            return false;
        }
        self.commit(now_ms);
        true
    }

    /// Discrete view change (keyboard zoom, reset). Applied immediately.
    pub fn set(&mut self, view: ViewTransform, now_ms: f64) {
        self.target = view;
        self.commit(now_ms);
    }

    pub fn reset(&mut self, now_ms: f64) {
        self.set(ViewTransform::default(), now_ms);
    }

    /// Zoom about the center of a `width × height` screen, committed at once.
    pub fn zoom_centered(&mut self, width: f32, height: f32, direction: ZoomDirection, now_ms: f64) -> bool {
        let anchor = Point::new(width / 2.0, height / 2.0);
        let mut view = self.target;
        if !view.zoom_at(anchor, direction, self.zoom_step, self.min_scale, self.max_scale) {
            return false;
        }
        self.set(view, now_ms);
        true
    }

    fn commit(&mut self, now_ms: f64) {
        self.committed = self.target;
        self.last_commit_ms = Some(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ViewportController {
        ViewportController::new(16.0, 0.1, 5.0, 1.1)
    }

    #[test]
    fn screen_world_roundtrip() {
        let view = ViewTransform {
            pan_x: 30.0,
            pan_y: -12.0,
            scale: 2.0,
        };
        let w = view.screen_to_world(130.0, 88.0);
        assert_eq!(w, Point::new(50.0, 50.0));
        assert_eq!(view.world_to_screen(w.x, w.y), Point::new(130.0, 88.0));
    }

    #[test]
    fn flat_wheel_delta_is_not_a_zoom() {
        assert_eq!(ZoomDirection::from_wheel(0.0), None);
        assert_eq!(ZoomDirection::from_wheel(-0.0), None);
        assert_eq!(ZoomDirection::from_wheel(f32::NAN), None);
        assert_eq!(ZoomDirection::from_wheel(-3.0), Some(ZoomDirection::In));
        assert_eq!(ZoomDirection::from_wheel(3.0), Some(ZoomDirection::Out));
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut view = ViewTransform::default();
        let anchor = Point::new(200.0, 150.0);
        let before = view.screen_to_world(anchor.x, anchor.y);
        assert!(view.zoom_at(anchor, ZoomDirection::In, 1.1, 0.1, 5.0));
        let after = view.screen_to_world(anchor.x, anchor.y);
        assert!((before.x - after.x).abs() < 1e-3 && (before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn zoom_out_of_bounds_is_rejected_unchanged() {
        let mut view = ViewTransform {
            pan_x: 5.0,
            pan_y: 5.0,
            scale: 4.8,
        };
        let before = view;
        assert!(!view.zoom_at(Point::new(0.0, 0.0), ZoomDirection::In, 1.1, 0.1, 5.0));
        assert_eq!(view, before);
    }

    #[test]
    fn continuous_pan_is_throttled_but_never_lost() {
        let mut vp = controller();
        assert!(vp.pan(10.0, 0.0, 0.0));
        assert!(!vp.pan(10.0, 0.0, 5.0));
        assert!(!vp.pan(10.0, 0.0, 10.0));
        assert_eq!(vp.committed().pan_x, 10.0);
        assert_eq!(vp.target().pan_x, 30.0);
        assert!(vp.flush(16.0));
        assert_eq!(vp.committed().pan_x, 30.0);
    }

    #[test]
    fn gesture_end_commits_unthrottled() {
        let mut vp = controller();
        vp.pan(1.0, 1.0, 0.0);
        vp.pan(4.0, 4.0, 1.0);
        assert!(vp.end_gesture(2.0));
        assert_eq!(vp.committed(), vp.target());
        assert!(!vp.end_gesture(3.0));
    }

    #[test]
    fn rejected_zoom_reports_none() {
        let mut vp = ViewportController::new(16.0, 0.1, 1.05, 1.1);
        assert_eq!(vp.zoom(Point::new(0.0, 0.0), ZoomDirection::In, 0.0), None);
        assert_eq!(vp.target().scale, 1.0);
    }
}
