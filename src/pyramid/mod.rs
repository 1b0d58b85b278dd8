//! The image pyramid: an ordered set of pre-rendered resolution levels of
//! the same image, each serving a contiguous scale range.

pub mod selector;

use crate::{Result, ViewerError};
use serde::{Deserialize, Serialize};
use std::fmt;

const RANGE_EPSILON: f64 = 1e-9;

/// Identifier of a pyramid level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub u8);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Immutable descriptor of one resolution level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidLevel {
    pub id: LevelId,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Raster file for this level, relative to the source root
    pub source: String,
    /// Half-open scale range `[lo, hi)` this level serves; the last level's
    /// upper bound is inclusive
    pub scale_range: (f64, f64),
}

/// Validated, ordered collection of [`PyramidLevel`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pyramid {
    levels: Vec<PyramidLevel>,
}

impl Pyramid {
    /// Build a pyramid, validating the level set. Misconfiguration is fatal:
    /// levels must be non-empty, have non-zero dimensions, unique ids,
    /// contiguous scale ranges, and strictly increasing resolution.
    pub fn new(levels: Vec<PyramidLevel>) -> Result<Self> {
        if levels.is_empty() {
            return Err(ViewerError::Pyramid("pyramid has no levels".into()));
        }

        for level in &levels {
            if level.pixel_width == 0 || level.pixel_height == 0 {
                return Err(ViewerError::Pyramid(format!(
                    "level {} has zero dimensions ({}x{})",
                    level.id, level.pixel_width, level.pixel_height
                )));
            }
            let (lo, hi) = level.scale_range;
            if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
                return Err(ViewerError::Pyramid(format!(
                    "level {} has an invalid scale range [{lo}, {hi})",
                    level.id
                )));
            }
        }

        for pair in levels.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.id == next.id {
                return Err(ViewerError::Pyramid(format!(
                    "duplicate level id {}",
                    prev.id
                )));
            }
            if (prev.scale_range.1 - next.scale_range.0).abs() > RANGE_EPSILON {
                return Err(ViewerError::Pyramid(format!(
                    "scale ranges of {} and {} are not contiguous ({} vs {})",
                    prev.id, next.id, prev.scale_range.1, next.scale_range.0
                )));
            }
            if next.pixel_width <= prev.pixel_width || next.pixel_height <= prev.pixel_height {
                return Err(ViewerError::Pyramid(format!(
                    "resolution must increase with the scale range: {} is {}x{} but {} is {}x{}",
                    prev.id,
                    prev.pixel_width,
                    prev.pixel_height,
                    next.id,
                    next.pixel_width,
                    next.pixel_height
                )));
            }
        }

        Ok(Self { levels })
    }

    /// Three-level Hubble M31 mosaic preset
    pub fn andromeda() -> Self {
        // Known-valid level set, constructed directly.
        Self {
            levels: vec![
                PyramidLevel {
                    id: LevelId(0),
                    pixel_width: 5276,
                    pixel_height: 1234,
                    source: "Hubble_M31Mosaic_2025_5276x1234_STScI-01JGY92V0Z2HJTVH605N4WH9XQ.jpg"
                        .into(),
                    scale_range: (0.01, 0.2),
                },
                PyramidLevel {
                    id: LevelId(1),
                    pixel_width: 10552,
                    pixel_height: 2468,
                    source: "Hubble_M31Mosaic_2025_10552x2468_STScI-01JGY92V0Z2HJTVH605N4WH9XQ.jpg"
                        .into(),
                    scale_range: (0.2, 0.5),
                },
                PyramidLevel {
                    id: LevelId(2),
                    pixel_width: 42208,
                    pixel_height: 9870,
                    source: "Hubble_M31Mosaic_2025_42208x9870_STScI-01JGY8MZB6RAYKZ1V4CHGN37Q6.jpg"
                        .into(),
                    scale_range: (0.5, 3.0),
                },
            ],
        }
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// Look up a level by id. An unknown id is a configuration error.
    pub fn level(&self, id: LevelId) -> Result<&PyramidLevel> {
        self.levels
            .iter()
            .find(|level| level.id == id)
            .ok_or_else(|| ViewerError::Pyramid(format!("unknown level id {id}")))
    }

    /// The finest level, which defines the base image plane that all tile
    /// geometry is expressed in.
    pub fn base_level(&self) -> &PyramidLevel {
        // Validation guarantees a non-empty, resolution-ordered level list.
        &self.levels[self.levels.len() - 1]
    }

    pub fn base_width(&self) -> u32 {
        self.base_level().pixel_width
    }

    pub fn base_height(&self) -> u32 {
        self.base_level().pixel_height
    }

    /// The scale interval covered by the pyramid as a whole
    pub fn scale_bounds(&self) -> (f64, f64) {
        (
            self.levels[0].scale_range.0,
            self.levels[self.levels.len() - 1].scale_range.1,
        )
    }

    /// Fixed preference order for cross-level fallback: declaration order,
    /// skipping the selected level.
    pub fn fallback_order(&self, selected: LevelId) -> impl Iterator<Item = LevelId> + '_ {
        self.levels
            .iter()
            .map(|level| level.id)
            .filter(move |id| *id != selected)
    }
}
