//! Viewport-to-tile-grid planning.
//!
//! A plan is the ordered list of tiles the renderer needs for the current
//! viewport: the visible range (padded slightly so edge tiles are not
//! missed) plus a buffer ring, sorted by priority and then by distance from
//! the view center so the most useful tiles decode first.

use crate::core::{config::ViewerConfig, viewport::Viewport};
use crate::prelude::HashMap;
use crate::tiles::types::{adaptive_tile_size, Tile, TileId, TilePriority};
use std::cmp::Ordering;
use std::sync::Arc;

/// Rounded viewport fingerprint; nearby viewports share a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PlanKey {
    offset_x: i64,
    offset_y: i64,
    scale_millis: i64,
    width: u32,
    height: u32,
}

impl PlanKey {
    fn of(viewport: &Viewport) -> Self {
        Self {
            offset_x: (viewport.offset.x / 10.0).round() as i64,
            offset_y: (viewport.offset.y / 10.0).round() as i64,
            scale_millis: (viewport.scale * 1000.0).round() as i64,
            width: viewport.size.x.round() as u32,
            height: viewport.size.y.round() as u32,
        }
    }
}

/// Plans tile sets for viewports over a fixed base image plane
#[derive(Debug)]
pub struct TilePlanner {
    image_width: u32,
    image_height: u32,
    buffer_tiles: i64,
    padding_fraction: f64,
    max_tiles: usize,
    plan_cache: HashMap<PlanKey, Arc<Vec<Tile>>>,
    plan_cache_limit: usize,
    size_memo: HashMap<i64, u32>,
}

impl TilePlanner {
    pub fn new(image_width: u32, image_height: u32, config: &ViewerConfig) -> Self {
        Self {
            image_width,
            image_height,
            buffer_tiles: config.buffer_tiles as i64,
            padding_fraction: config.padding_fraction,
            max_tiles: config.max_tiles_per_plan,
            plan_cache: HashMap::default(),
            plan_cache_limit: config.plan_cache_limit,
            size_memo: HashMap::default(),
        }
    }

    /// Adaptive tile size, bucketed by the scale rounded to one decimal.
    /// The bucketing keeps the grid stable across small scale changes, so
    /// tiles cached just below a level boundary still match the grid just
    /// above it.
    pub fn tile_size_for(&mut self, scale: f64) -> u32 {
        let key = (scale * 10.0).round() as i64;
        if let Some(size) = self.size_memo.get(&key) {
            return *size;
        }
        let size = adaptive_tile_size(key as f64 / 10.0);
        self.size_memo.insert(key, size);
        size
    }

    /// Plan the tile set for a viewport. Plans are cached by a rounded
    /// viewport fingerprint; the cache is cleared wholesale once it grows
    /// past the configured limit.
    pub fn plan(&mut self, viewport: &Viewport) -> Arc<Vec<Tile>> {
        let key = PlanKey::of(viewport);
        if let Some(plan) = self.plan_cache.get(&key) {
            return plan.clone();
        }

        let plan = Arc::new(self.build(viewport));
        if self.plan_cache.len() >= self.plan_cache_limit {
            self.plan_cache.clear();
        }
        self.plan_cache.insert(key, plan.clone());
        plan
    }

    fn build(&mut self, viewport: &Viewport) -> Vec<Tile> {
        let tile_size = self.tile_size_for(viewport.scale);
        let ts = tile_size as f64;
        let image_w = self.image_width as f64;
        let image_h = self.image_height as f64;

        let padded = viewport
            .visible_region()
            .expand(ts * self.padding_fraction)
            .clamp_to(image_w, image_h);
        if padded.is_empty() {
            return Vec::new();
        }

        // Visible tile index range, exclusive on the high side.
        let first_col = (padded.left / ts).floor() as i64;
        let last_col = (padded.right / ts).ceil() as i64;
        let first_row = (padded.top / ts).floor() as i64;
        let last_row = (padded.bottom / ts).ceil() as i64;

        let max_col = (image_w / ts).ceil() as i64;
        let max_row = (image_h / ts).ceil() as i64;

        let start_col = (first_col - self.buffer_tiles).max(0);
        let end_col = (last_col + self.buffer_tiles).min(max_col);
        let start_row = (first_row - self.buffer_tiles).max(0);
        let end_row = (last_row + self.buffer_tiles).min(max_row);

        let center_col = (first_col + last_col) as f64 / 2.0;
        let center_row = (first_row + last_row) as f64 / 2.0;

        let mut tiles = Vec::with_capacity(((end_col - start_col) * (end_row - start_row)) as usize);
        for row in start_row..end_row {
            for col in start_col..end_col {
                let pixel_x = (col as u64 * tile_size as u64) as u32;
                let pixel_y = (row as u64 * tile_size as u64) as u32;
                let visible = col >= first_col && col < last_col && row >= first_row && row < last_row;
                let dc = col as f64 + 0.5 - center_col;
                let dr = row as f64 + 0.5 - center_row;
                tiles.push(Tile {
                    id: TileId {
                        col: col as u32,
                        row: row as u32,
                        tile_size,
                    },
                    pixel_x,
                    pixel_y,
                    width: tile_size.min(self.image_width - pixel_x),
                    height: tile_size.min(self.image_height - pixel_y),
                    priority: if visible {
                        TilePriority::Immediate
                    } else {
                        TilePriority::High
                    },
                    distance: (dc * dc + dr * dr).sqrt(),
                });
            }
        }

        tiles.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then(
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(Ordering::Equal),
            )
        });
        if tiles.len() > self.max_tiles {
            log::debug!(
                "plan truncated from {} to {} tiles",
                tiles.len(),
                self.max_tiles
            );
            tiles.truncate(self.max_tiles);
        }
        tiles
    }
}
