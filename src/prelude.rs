//! Convenient re-exports for common gigatile functionality

pub use crate::core::{
    config::{LoaderConfig, ViewerConfig},
    point::{PixelRect, Point},
    viewport::Viewport,
};

pub use crate::animation::{AnimationFrame, Easing, ZoomAnimation};
pub use crate::debounce::ReplanDebouncer;
pub use crate::markers::{MarkerOverlay, StarMarker};
pub use crate::pyramid::{selector::LevelSelector, LevelId, Pyramid, PyramidLevel};
pub use crate::render::{compose_frame, DrawCommand, PixelSource};
pub use crate::tiles::{
    cache::TileCache,
    loader::TileLoader,
    planner::TilePlanner,
    source::{MosaicSource, TilePixels, TileSource},
    types::{adaptive_tile_size, Tile, TileId, TilePriority},
    TileKey,
};
pub use crate::viewer::Viewer;
pub use crate::{Result, ViewerError};

// Commonly used std/external types
pub use instant::Instant;
pub use std::sync::Arc;
pub use std::time::Duration;

// Fast hash collections used throughout the crate
pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
