//! Scale-driven resolution level selection.
//!
//! Selection is a pure step function over the pyramid's contiguous scale
//! ranges, so the same scale always maps to the same level and a monotonic
//! scale sweep never revisits a level.

use crate::pyramid::{LevelId, Pyramid};

#[derive(Debug, Clone, Copy)]
struct Band {
    lo: f64,
    hi: f64,
    id: LevelId,
}

/// Maps viewport scale to a pyramid level, with a preload band just below
/// each level boundary.
#[derive(Debug, Clone)]
pub struct LevelSelector {
    bands: Vec<Band>,
    preload_fraction: f64,
}

impl LevelSelector {
    pub fn new(pyramid: &Pyramid, preload_fraction: f64) -> Self {
        let bands = pyramid
            .levels()
            .iter()
            .map(|level| Band {
                lo: level.scale_range.0,
                hi: level.scale_range.1,
                id: level.id,
            })
            .collect();
        Self {
            bands,
            preload_fraction: preload_fraction.clamp(0.0, 1.0),
        }
    }

    /// The level serving `scale`. Ranges are half-open `[lo, hi)`; scales
    /// outside the pyramid's bounds clamp to the first or last level.
    pub fn select_level(&self, scale: f64) -> LevelId {
        let first = &self.bands[0];
        if scale < first.hi {
            return first.id;
        }
        for band in &self.bands[1..] {
            if scale < band.hi {
                return band.id;
            }
        }
        self.bands[self.bands.len() - 1].id
    }

    /// The next level up, when `scale` sits inside the preload band below
    /// its boundary. `None` when no boundary is near or at the top level.
    pub fn preload_level(&self, scale: f64) -> Option<LevelId> {
        let current = self.select_level(scale);
        let index = self.bands.iter().position(|band| band.id == current)?;
        let next = self.bands.get(index + 1)?;
        let boundary = self.bands[index].hi;
        let band_start = boundary * (1.0 - self.preload_fraction);
        (scale >= band_start && scale < boundary).then_some(next.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> LevelSelector {
        LevelSelector::new(&Pyramid::andromeda(), 0.25)
    }

    #[test]
    fn selection_follows_the_boundaries() {
        let sel = selector();
        assert_eq!(sel.select_level(0.05), LevelId(0));
        assert_eq!(sel.select_level(0.19), LevelId(0));
        assert_eq!(sel.select_level(0.2), LevelId(1));
        assert_eq!(sel.select_level(0.49), LevelId(1));
        assert_eq!(sel.select_level(0.5), LevelId(2));
        assert_eq!(sel.select_level(3.0), LevelId(2));
    }

    #[test]
    fn selection_clamps_outside_pyramid_bounds() {
        let sel = selector();
        assert_eq!(sel.select_level(0.001), LevelId(0));
        assert_eq!(sel.select_level(10.0), LevelId(2));
    }

    #[test]
    fn selection_is_idempotent_and_monotonic() {
        let sel = selector();
        let mut last = sel.select_level(0.01);
        let mut scale = 0.01;
        while scale <= 3.0 {
            let level = sel.select_level(scale);
            assert_eq!(level, sel.select_level(scale));
            assert!(level >= last, "level regressed at scale {scale}");
            last = level;
            scale += 0.005;
        }
    }

    #[test]
    fn preload_kicks_in_just_below_each_boundary() {
        let sel = selector();
        // Below the band: nothing to preload.
        assert_eq!(sel.preload_level(0.10), None);
        // 0.15 is inside the 25% band below the 0.2 boundary.
        assert_eq!(sel.preload_level(0.15), Some(LevelId(1)));
        assert_eq!(sel.preload_level(0.199), Some(LevelId(1)));
        // Past the boundary the next level is current, not a preload.
        assert_eq!(sel.preload_level(0.2), None);
        // Same shape at the 0.5 boundary.
        assert_eq!(sel.preload_level(0.30), None);
        assert_eq!(sel.preload_level(0.40), Some(LevelId(2)));
        // Top level has nothing above it.
        assert_eq!(sel.preload_level(2.9), None);
    }
}
