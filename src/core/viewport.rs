//! Viewport state: the pan/zoom transform between screen and image space.
//!
//! The transform is `screen = image * scale + offset`. All zoom operations
//! preserve the image point under their anchor, so the pixel under the
//! cursor stays put while zooming.

use crate::core::{
    config::ViewerConfig,
    point::{PixelRect, Point},
};
use serde::{Deserialize, Serialize};

/// The view window onto the base image plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen position of the image origin, in screen pixels
    pub offset: Point,
    /// Screen pixels per image pixel
    pub scale: f64,
    /// Size of the render surface, in screen pixels
    pub size: Point,
    pub min_scale: f64,
    pub max_scale: f64,
    initial_scale: f64,
    image_size: Point,
}

impl Viewport {
    pub fn new(image_width: u32, image_height: u32, size: Point, config: &ViewerConfig) -> Self {
        let initial_scale = config.initial_scale.clamp(config.min_scale, config.max_scale);
        Self {
            offset: Point::default(),
            scale: initial_scale,
            size,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            initial_scale,
            image_size: Point::new(image_width as f64, image_height as f64),
        }
    }

    pub fn image_size(&self) -> Point {
        self.image_size
    }

    /// Translate the view by a screen-space delta. Non-finite deltas are
    /// ignored so a bad input event can never corrupt the transform.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            log::warn!("ignoring non-finite pan delta ({dx}, {dy})");
            return;
        }
        self.offset.x += dx;
        self.offset.y += dy;
    }

    /// Zoom so that the image point currently under `anchor` (screen
    /// coordinates) remains under it at the new scale. The target scale is
    /// clamped to `[min_scale, max_scale]` before the offset is derived, so
    /// the anchor invariant holds even when the request is clamped.
    pub fn zoom_at(&mut self, target_scale: f64, anchor: Point) {
        if !target_scale.is_finite() || !anchor.is_finite() {
            log::warn!("ignoring non-finite zoom request");
            return;
        }
        let image_point = self.screen_to_image(anchor);
        let new_scale = target_scale.clamp(self.min_scale, self.max_scale);
        self.scale = new_scale;
        self.offset = Point::new(
            anchor.x - image_point.x * new_scale,
            anchor.y - image_point.y * new_scale,
        );
    }

    /// Apply an interpolated animation frame. The scale is clamped;
    /// non-finite frames are dropped.
    pub fn set_transform(&mut self, scale: f64, offset: Point) {
        if !scale.is_finite() || !offset.is_finite() {
            return;
        }
        self.scale = scale.clamp(self.min_scale, self.max_scale);
        self.offset = offset;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if !width.is_finite() || !height.is_finite() {
            return;
        }
        self.size = Point::new(width.max(0.0), height.max(0.0));
    }

    /// Return to the initial scale with the image origin at the screen origin.
    pub fn reset(&mut self) {
        self.scale = self.initial_scale;
        self.offset = Point::default();
    }

    pub fn screen_to_image(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    pub fn image_to_screen(&self, image: Point) -> Point {
        Point::new(
            image.x * self.scale + self.offset.x,
            image.y * self.scale + self.offset.y,
        )
    }

    /// The part of the image plane currently on screen, in image pixels,
    /// clamped to the image bounds. Empty when the view is entirely off the
    /// image.
    pub fn visible_region(&self) -> PixelRect {
        let top_left = self.screen_to_image(Point::default());
        let bottom_right = self.screen_to_image(self.size);
        PixelRect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
            .clamp_to(self.image_size.x, self.image_size.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_viewport() -> Viewport {
        Viewport::new(
            42208,
            9870,
            Point::new(1600.0, 900.0),
            &ViewerConfig::default(),
        )
    }

    #[test]
    fn zoom_preserves_anchor_image_point() {
        let mut vp = test_viewport();
        vp.pan(-300.0, -120.0);

        let anchor = Point::new(800.0, 450.0);
        let before = vp.screen_to_image(anchor);
        vp.zoom_at(0.37, anchor);
        let after = vp.screen_to_image(anchor);

        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn zoom_preserves_anchor_even_when_clamped() {
        let mut vp = test_viewport();
        let anchor = Point::new(123.0, 456.0);
        let before = vp.screen_to_image(anchor);

        vp.zoom_at(99.0, anchor);
        assert_eq!(vp.scale, vp.max_scale);
        let after = vp.screen_to_image(anchor);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);

        vp.zoom_at(0.0001, anchor);
        assert_eq!(vp.scale, vp.min_scale);
        let after = vp.screen_to_image(anchor);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn repeated_zoom_cycles_accumulate_no_drift() {
        let mut vp = test_viewport();
        let anchor = Point::new(640.0, 360.0);
        let before = vp.screen_to_image(anchor);

        for _ in 0..1000 {
            vp.zoom_at(vp.scale * 1.1, anchor);
            vp.zoom_at(vp.scale / 1.1, anchor);
        }

        let after = vp.screen_to_image(anchor);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let mut vp = test_viewport();
        let snapshot = vp.clone();

        vp.pan(f64::NAN, 10.0);
        vp.pan(f64::INFINITY, f64::NEG_INFINITY);
        vp.zoom_at(f64::NAN, Point::new(10.0, 10.0));
        vp.zoom_at(1.0, Point::new(f64::NAN, 0.0));

        assert_eq!(vp, snapshot);
        assert!(vp.scale.is_finite());
        assert!(vp.offset.is_finite());
    }

    #[test]
    fn visible_region_is_clamped_to_image() {
        let mut vp = test_viewport();
        // Pan far past the top-left corner
        vp.pan(5000.0, 5000.0);
        let region = vp.visible_region();
        assert!(region.left >= 0.0);
        assert!(region.top >= 0.0);

        // Pan far past the bottom-right corner
        vp.reset();
        vp.pan(-1e9, -1e9);
        let region = vp.visible_region();
        assert!(region.right <= 42208.0);
        assert!(region.bottom <= 9870.0);
        assert!(region.is_empty());
    }

    #[test]
    fn transforms_round_trip() {
        let mut vp = test_viewport();
        vp.pan(37.0, -91.0);
        vp.zoom_at(0.42, Point::new(100.0, 100.0));

        let image = Point::new(21000.0, 4800.0);
        let screen = vp.image_to_screen(image);
        let back = vp.screen_to_image(screen);
        assert!((image.x - back.x).abs() < 1e-9);
        assert!((image.y - back.y).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_initial_transform() {
        let mut vp = test_viewport();
        vp.pan(500.0, 500.0);
        vp.zoom_at(1.7, Point::new(10.0, 10.0));
        vp.reset();
        assert_eq!(vp.scale, 0.2);
        assert_eq!(vp.offset, Point::default());
    }
}
