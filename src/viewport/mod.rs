//! View ↔ scene coordinate mapping
//!
//! The viewport shows a window of the scene scaled by `scale` view units
//! per scene unit, with `origin` the scene point at the view's top-left.

use crate::scene::{Point, Rect};

/// Zoom buttons
pub const ZOOM_IN: f64 = 1.2;
pub const ZOOM_OUT: f64 = 0.8;
/// Mouse wheel step
pub const WHEEL_STEP: f64 = 1.1;

const MIN_SCALE: f64 = 0.01;
const MAX_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// View size in view units
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub origin: Point,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            origin: Point::new(0.0, 0.0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn view_to_scene(&self, vx: f64, vy: f64) -> Point {
        Point::new(self.origin.x + vx / self.scale, self.origin.y + vy / self.scale)
    }

    pub fn scene_to_view(&self, p: Point) -> (f64, f64) {
        ((p.x - self.origin.x) * self.scale, (p.y - self.origin.y) * self.scale)
    }

    /// The scene rectangle currently visible
    pub fn visible_scene(&self) -> Rect {
        Rect {
            x: self.origin.x,
            y: self.origin.y,
            width: self.width / self.scale,
            height: self.height / self.scale,
        }
    }

    /// Scale by `factor`, keeping the scene point under `anchor` (view coords) fixed
    pub fn zoom_at(&mut self, factor: f64, anchor: (f64, f64)) {
        let fixed = self.view_to_scene(anchor.0, anchor.1);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.origin = Point::new(fixed.x - anchor.0 / self.scale, fixed.y - anchor.1 / self.scale);
    }

    /// Scale around the view center
    pub fn zoom(&mut self, factor: f64) {
        self.zoom_at(factor, (self.width / 2.0, self.height / 2.0));
    }

    /// Shift the visible window by a view-space delta
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.origin = Point::new(self.origin.x - dx / self.scale, self.origin.y - dy / self.scale);
    }

    /// Fit `bounds` inside the view keeping aspect ratio, centered
    pub fn fit(&mut self, bounds: Rect) {
        if !self.is_valid() || bounds.width <= 0.0 || bounds.height <= 0.0 {
            return;
        }
        self.scale = (self.width / bounds.width)
            .min(self.height / bounds.height)
            .clamp(MIN_SCALE, MAX_SCALE);
        let visible_w = self.width / self.scale;
        let visible_h = self.height / self.scale;
        self.origin = Point::new(
            bounds.x - (visible_w - bounds.width) / 2.0,
            bounds.y - (visible_h - bounds.height) / 2.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let mut view = Viewport::new(500.0, 500.0);
        view.fit(Rect { x: 0.0, y: 0.0, width: 1000.0, height: 800.0 });
        assert!(approx(view.scale, 0.5));
        // horizontally tight, vertically centered
        assert!(approx(view.origin.x, 0.0));
        assert!(approx(view.origin.y, -100.0));
        let corner = view.view_to_scene(500.0, 450.0);
        assert!(approx(corner.x, 1000.0) && approx(corner.y, 800.0));
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut view = Viewport::new(200.0, 100.0);
        let before = view.view_to_scene(50.0, 25.0);
        view.zoom_at(ZOOM_IN, (50.0, 25.0));
        let after = view.view_to_scene(50.0, 25.0);
        assert!(approx(before.x, after.x) && approx(before.y, after.y));
        assert!(approx(view.scale, 1.2));
    }

    #[test]
    fn test_roundtrip_mapping() {
        let mut view = Viewport::new(300.0, 200.0);
        view.zoom(WHEEL_STEP);
        view.pan(13.0, -7.0);
        let p = Point::new(123.0, 45.0);
        let (vx, vy) = view.scene_to_view(p);
        let back = view.view_to_scene(vx, vy);
        assert!(approx(back.x, p.x) && approx(back.y, p.y));
    }

    #[test]
    fn test_fit_ignores_empty_view() {
        let mut view = Viewport::new(0.0, 0.0);
        view.fit(Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 });
        assert!(approx(view.scale, 1.0));
    }
}
