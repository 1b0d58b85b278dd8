//! Animated zoom transitions.
//!
//! A [`ZoomAnimation`] interpolates the viewport transform from one
//! `(scale, offset)` pair to another. The viewer holds at most one; a new
//! request replaces the old mid-flight, so the latest request always wins
//! and there is no animation queue.

use crate::core::point::Point;
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Easing functions for animated transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// One sampled animation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub scale: f64,
    pub offset: Point,
    pub finished: bool,
}

/// In-flight interpolation of the viewport transform
#[derive(Debug, Clone)]
pub struct ZoomAnimation {
    start_time: Instant,
    duration: Duration,
    easing: Easing,
    from_scale: f64,
    from_offset: Point,
    to_scale: f64,
    to_offset: Point,
}

impl ZoomAnimation {
    pub fn new(
        from_scale: f64,
        from_offset: Point,
        to_scale: f64,
        to_offset: Point,
        duration: Duration,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            duration,
            easing: Easing::default(),
            from_scale,
            from_offset,
            to_scale,
            to_offset,
        }
    }

    pub fn target_scale(&self) -> f64 {
        self.to_scale
    }

    /// Sample the transform at `now`. Once progress reaches 1.0 the frame
    /// reports `finished` and holds the exact target values.
    pub fn sample(&self, now: Instant) -> AnimationFrame {
        let elapsed = now.duration_since(self.start_time).as_secs_f64();
        let total = self.duration.as_secs_f64();
        let t = if total <= 0.0 {
            1.0
        } else {
            (elapsed / total).clamp(0.0, 1.0)
        };
        if t >= 1.0 {
            return AnimationFrame {
                scale: self.to_scale,
                offset: self.to_offset,
                finished: true,
            };
        }
        let eased = self.easing.apply(t);
        AnimationFrame {
            scale: lerp(self.from_scale, self.to_scale, eased),
            offset: Point::new(
                lerp(self.from_offset.x, self.to_offset.x, eased),
                lerp(self.from_offset.y, self.to_offset.y, eased),
            ),
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_exact() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(-0.5), 0.0);
            assert_eq!(easing.apply(1.5), 1.0);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let e = Easing::EaseInOut;
        assert!((e.apply(0.5) - 0.5).abs() < 1e-12);
        for i in 0..50 {
            let t = i as f64 / 100.0;
            let a = e.apply(t);
            let b = e.apply(1.0 - t);
            assert!((a + b - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn sample_interpolates_and_finishes() {
        let anim = ZoomAnimation::new(
            0.2,
            Point::new(0.0, 0.0),
            0.4,
            Point::new(-100.0, -50.0),
            Duration::from_millis(200),
        );

        let start = anim.sample(anim.start_time);
        assert_eq!(start.scale, 0.2);
        assert!(!start.finished);

        let mid = anim.sample(anim.start_time + Duration::from_millis(100));
        assert!(mid.scale > 0.2 && mid.scale < 0.4);
        assert!(mid.offset.x < 0.0 && mid.offset.x > -100.0);
        assert!(!mid.finished);

        let end = anim.sample(anim.start_time + Duration::from_millis(250));
        assert_eq!(end.scale, 0.4);
        assert_eq!(end.offset, Point::new(-100.0, -50.0));
        assert!(end.finished);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let anim = ZoomAnimation::new(
            0.2,
            Point::default(),
            1.0,
            Point::new(5.0, 5.0),
            Duration::ZERO,
        );
        let frame = anim.sample(anim.start_time);
        assert!(frame.finished);
        assert_eq!(frame.scale, 1.0);
    }
}
