//! # Gigatile
//!
//! A tile-based deep-zoom engine for gigapixel astronomical images.
//!
//! Gigatile lets a host application pan and zoom smoothly across images far
//! too large to decode at once (the canonical dataset is Hubble's
//! 42208x9870 M31 mosaic). Each frame it plans the tile set covering the
//! current viewport, decodes tiles on a bounded worker pool, and keeps
//! results cached across resolution levels so a lower-fidelity fallback is
//! always available while the sharp tiles load.
//!
//! The crate is renderer-agnostic: [`render::compose_frame`] produces a flat
//! list of screen-space [`render::DrawCommand`]s that any 2D compositor can
//! consume.

pub mod animation;
pub mod core;
pub mod debounce;
pub mod markers;
pub mod prelude;
pub mod pyramid;
pub mod render;
pub mod tiles;
pub mod viewer;

// Re-export the public API at the crate root
pub use crate::core::{
    config::{LoaderConfig, ViewerConfig},
    point::{PixelRect, Point},
    viewport::Viewport,
};
pub use crate::markers::{MarkerOverlay, StarMarker};
pub use crate::pyramid::{selector::LevelSelector, LevelId, Pyramid, PyramidLevel};
pub use crate::render::{compose_frame, DrawCommand, PixelSource};
pub use crate::tiles::{
    cache::TileCache,
    loader::TileLoader,
    planner::TilePlanner,
    source::{MosaicSource, TilePixels, TileSource},
    types::{Tile, TileId, TilePriority},
    TileKey,
};
pub use crate::viewer::Viewer;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("pyramid configuration error: {0}")]
    Pyramid(String),

    #[error("tile decode failed: {0}")]
    Decode(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("marker data error: {0}")]
    MarkerData(#[from] serde_json::Error),
}
