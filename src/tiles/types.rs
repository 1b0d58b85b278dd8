//! Tile identity, geometry and priority.
//!
//! All tile geometry is expressed in base-image pixels regardless of which
//! pyramid level decodes it. Coarser levels scale the region down at decode
//! time, which is what lets a cached tile from another level stand in for
//! the same `TileId`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid identity of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub col: u32,
    pub row: u32,
    /// Tile edge length in base-image pixels at planning time
    pub tile_size: u32,
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.col, self.row, self.tile_size)
    }
}

/// Load priority; `Immediate` tiles are visible, `High` tiles are in the
/// buffer ring. Ordering puts `Immediate` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TilePriority {
    Immediate,
    High,
}

/// A planned tile: identity plus base-plane geometry and ordering keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Top-left corner in base-image pixels
    pub pixel_x: u32,
    pub pixel_y: u32,
    /// Actual extent in base-image pixels; edge tiles are smaller than
    /// `id.tile_size`
    pub width: u32,
    pub height: u32,
    pub priority: TilePriority,
    /// Distance from the visible-region center, in tile units
    pub distance: f64,
}

/// Tile size for a given scale. Coarse views use large tiles so a full
/// screen stays at a handful of decodes; deep zooms use small tiles so a
/// single decode stays cheap.
pub fn adaptive_tile_size(scale: f64) -> u32 {
    if scale <= 0.2 {
        2048
    } else if scale <= 0.5 {
        1024
    } else if scale <= 1.0 {
        768
    } else {
        512
    }
}
