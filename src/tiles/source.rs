//! Tile pixel sources.
//!
//! A [`TileSource`] turns a planned tile into RGBA pixels. The built-in
//! [`MosaicSource`] decodes per-level raster files with the `image` crate,
//! cropping the tile's base-plane region scaled by the level's resolution
//! ratio.

use crate::pyramid::{LevelId, Pyramid, PyramidLevel};
use crate::tiles::types::Tile;
use crate::{Result, ViewerError};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Decoded RGBA8 tile pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePixels {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes
    pub data: Vec<u8>,
}

impl TilePixels {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            data,
        }
    }
}

/// Anything that can decode tile pixels. Implementations are called from
/// worker threads and must be safe to share.
pub trait TileSource: Send + Sync {
    fn decode_tile(&self, level: &PyramidLevel, tile: &Tile) -> Result<TilePixels>;
}

/// Decodes tiles from one raster file per pyramid level.
///
/// Level images are opened lazily and kept in a small LRU so a burst of
/// tiles against the same level decodes the file once.
pub struct MosaicSource {
    root: PathBuf,
    base_width: u32,
    base_height: u32,
    images: Mutex<LruCache<LevelId, Arc<DynamicImage>>>,
}

impl MosaicSource {
    pub fn new(root: impl Into<PathBuf>, pyramid: &Pyramid) -> Self {
        let capacity =
            NonZeroUsize::new(pyramid.levels().len()).unwrap_or(NonZeroUsize::MIN);
        Self {
            root: root.into(),
            base_width: pyramid.base_width(),
            base_height: pyramid.base_height(),
            images: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn level_image(&self, level: &PyramidLevel) -> Result<Arc<DynamicImage>> {
        let mut images = self
            .images
            .lock()
            .map_err(|_| ViewerError::Decode("level image cache poisoned".into()))?;
        if let Some(image) = images.get(&level.id) {
            return Ok(image.clone());
        }

        let path = self.root.join(&level.source);
        log::debug!("opening level {} source {}", level.id, path.display());
        let image = Arc::new(image::open(&path)?);
        if image.width() != level.pixel_width || image.height() != level.pixel_height {
            return Err(ViewerError::Decode(format!(
                "level {} source is {}x{}, descriptor says {}x{}",
                level.id,
                image.width(),
                image.height(),
                level.pixel_width,
                level.pixel_height
            )));
        }
        images.put(level.id, image.clone());
        Ok(image)
    }
}

impl TileSource for MosaicSource {
    fn decode_tile(&self, level: &PyramidLevel, tile: &Tile) -> Result<TilePixels> {
        let image = self.level_image(level)?;

        // Tile geometry is in base-plane pixels; map it onto this level.
        let rx = level.pixel_width as f64 / self.base_width as f64;
        let ry = level.pixel_height as f64 / self.base_height as f64;
        let sx = ((tile.pixel_x as f64 * rx).floor() as u32).min(level.pixel_width - 1);
        let sy = ((tile.pixel_y as f64 * ry).floor() as u32).min(level.pixel_height - 1);
        let sw = ((tile.width as f64 * rx).ceil() as u32)
            .clamp(1, level.pixel_width - sx);
        let sh = ((tile.height as f64 * ry).ceil() as u32)
            .clamp(1, level.pixel_height - sy);

        let region = image.crop_imm(sx, sy, sw, sh);
        let pixels = if region.width() == tile.width && region.height() == tile.height {
            region.to_rgba8()
        } else {
            region
                .resize_exact(tile.width, tile.height, FilterType::Triangle)
                .to_rgba8()
        };
        Ok(TilePixels::new(tile.width, tile.height, pixels.into_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::types::{TileId, TilePriority};

    #[test]
    fn tile_pixels_dimensions() {
        let pixels = TilePixels::new(2, 3, vec![0; 24]);
        assert_eq!(pixels.data.len(), 24);
    }

    #[test]
    fn missing_source_file_is_an_io_style_error() {
        let pyramid = Pyramid::andromeda();
        let source = MosaicSource::new("/nonexistent", &pyramid);
        let level = pyramid.base_level();
        let tile = Tile {
            id: TileId {
                col: 0,
                row: 0,
                tile_size: 512,
            },
            pixel_x: 0,
            pixel_y: 0,
            width: 512,
            height: 512,
            priority: TilePriority::Immediate,
            distance: 0.0,
        };
        assert!(source.decode_tile(level, &tile).is_err());
    }
}
