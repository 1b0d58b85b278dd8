//! Tile planning, decoding, loading and caching.

pub mod cache;
pub mod loader;
pub mod planner;
pub mod source;
pub mod types;

use crate::pyramid::LevelId;
use crate::tiles::types::TileId;

/// Cache/loader key: a tile at a particular pyramid level
pub type TileKey = (LevelId, TileId);
