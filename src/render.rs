//! Render surface contract.
//!
//! The engine never draws. Each frame it emits a flat list of screen-space
//! [`DrawCommand`]s; the host compositor executes them in order. Where the
//! primary tile is not cached yet, the command carries a cross-level
//! fallback at reduced opacity, or a near-transparent placeholder so the
//! surface is never blank.

use crate::core::{config::ViewerConfig, point::Point, viewport::Viewport};
use crate::pyramid::{LevelId, Pyramid};
use crate::tiles::cache::TileCache;
use crate::tiles::source::TilePixels;
use crate::tiles::types::Tile;
use std::sync::Arc;

/// What to paint inside a draw command's rectangle
#[derive(Debug, Clone)]
pub enum PixelSource {
    Tile(Arc<TilePixels>),
    Placeholder,
}

/// One rectangle to paint, in screen coordinates
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub source: PixelSource,
    pub opacity: f32,
}

/// Build the draw list for a planned tile set.
pub fn compose_frame(
    plan: &[Tile],
    viewport: &Viewport,
    selected: LevelId,
    cache: &TileCache,
    pyramid: &Pyramid,
    config: &ViewerConfig,
) -> Vec<DrawCommand> {
    let scale = viewport.scale;
    plan.iter()
        .map(|tile| {
            let origin =
                viewport.image_to_screen(Point::new(tile.pixel_x as f64, tile.pixel_y as f64));
            let (source, opacity) = if let Some(pixels) = cache.get(&(selected, tile.id)) {
                (PixelSource::Tile(pixels), 1.0)
            } else if let Some((_, pixels)) = cache.fallback(tile.id, selected, pyramid) {
                (PixelSource::Tile(pixels), config.fallback_opacity)
            } else {
                (PixelSource::Placeholder, config.placeholder_opacity)
            };
            DrawCommand {
                x: origin.x,
                y: origin.y,
                width: tile.width as f64 * scale,
                height: tile.height as f64 * scale,
                source,
                opacity,
            }
        })
        .collect()
}
