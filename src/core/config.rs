//! Viewer configuration with tuning presets.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for a [`crate::Viewer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Lower bound for the viewport scale
    pub min_scale: f64,
    /// Upper bound for the viewport scale
    pub max_scale: f64,
    /// Scale applied on creation and on `reset`
    pub initial_scale: f64,
    /// Extra ring of tiles planned around the visible range
    pub buffer_tiles: u32,
    /// Padding applied to the visible region, as a fraction of the tile size
    pub padding_fraction: f64,
    /// Plan-cache entries kept before the cache is cleared wholesale
    pub plan_cache_limit: usize,
    /// Hard cap on tiles in a single plan; excess is truncated after the
    /// priority/distance sort so the nearest tiles survive
    pub max_tiles_per_plan: usize,
    /// Soft capacity of the decoded-tile cache
    pub cache_capacity: usize,
    /// Fraction of a level boundary below which the next level is preloaded
    pub preload_band_fraction: f64,
    /// Replan delay while a drag is in progress
    pub drag_debounce: Duration,
    /// Replan delay once input has settled
    pub settle_debounce: Duration,
    /// Duration of animated zooms
    pub zoom_animation: Duration,
    /// Opacity for cross-level fallback tiles
    pub fallback_opacity: f32,
    /// Opacity for the placeholder drawn where nothing is cached yet
    pub placeholder_opacity: f32,
    /// Loader tuning
    pub loader: LoaderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.01,
            max_scale: 3.0,
            initial_scale: 0.2,
            buffer_tiles: 2,
            padding_fraction: 0.05,
            plan_cache_limit: 10,
            max_tiles_per_plan: 2048,
            cache_capacity: 200,
            preload_band_fraction: 0.25,
            drag_debounce: Duration::from_millis(50),
            settle_debounce: Duration::from_millis(100),
            zoom_animation: Duration::from_millis(200),
            fallback_opacity: 0.7,
            placeholder_opacity: 0.02,
            loader: LoaderConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Conservative settings for constrained hosts
    pub fn low_resource() -> Self {
        Self {
            buffer_tiles: 1,
            cache_capacity: 60,
            max_tiles_per_plan: 512,
            loader: LoaderConfig {
                max_concurrent: 4,
                ..LoaderConfig::default()
            },
            ..Self::default()
        }
    }

    /// Small, deterministic settings for tests
    pub fn for_testing() -> Self {
        Self {
            buffer_tiles: 1,
            cache_capacity: 16,
            max_tiles_per_plan: 256,
            drag_debounce: Duration::ZERO,
            settle_debounce: Duration::ZERO,
            zoom_animation: Duration::from_millis(10),
            loader: LoaderConfig {
                max_concurrent: 2,
                sweep_interval: Duration::from_millis(5),
            },
            ..Self::default()
        }
    }
}

/// Tuning for the background tile loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Number of decode worker threads
    pub max_concurrent: usize,
    /// Interval between reconciliation sweeps
    pub sweep_interval: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 12,
            sweep_interval: Duration::from_millis(100),
        }
    }
}
