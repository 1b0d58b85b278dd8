//! The viewer: owns every subsystem and drives the per-tick pipeline.
//!
//! A tick is one cooperative step: advance the zoom animation, run the
//! debounced replan (level selection, tile planning, cache protection,
//! load scheduling, preload), drain finished decodes into the cache, and
//! run the periodic reconciliation sweep that re-requests anything the
//! event-driven path dropped.

use crate::animation::ZoomAnimation;
use crate::core::{config::ViewerConfig, point::Point, viewport::Viewport};
use crate::debounce::ReplanDebouncer;
use crate::markers::{MarkerOverlay, StarMarker};
use crate::pyramid::{selector::LevelSelector, LevelId, Pyramid};
use crate::render::{compose_frame, DrawCommand};
use crate::tiles::{
    cache::TileCache,
    loader::TileLoader,
    planner::TilePlanner,
    source::TileSource,
    types::{Tile, TilePriority},
};
use crate::Result;
use instant::Instant;
use std::sync::Arc;

const ZOOM_STEP: f64 = 1.5;

pub struct Viewer {
    config: ViewerConfig,
    viewport: Viewport,
    pyramid: Pyramid,
    selector: LevelSelector,
    planner: TilePlanner,
    cache: TileCache,
    loader: Option<TileLoader>,
    overlay: MarkerOverlay,
    animation: Option<ZoomAnimation>,
    debounce: ReplanDebouncer,
    current_plan: Arc<Vec<Tile>>,
    current_level: LevelId,
    last_sweep: Instant,
}

impl Viewer {
    /// Build a viewer over a pyramid and a tile source. The pyramid is
    /// re-validated so misconfiguration fails here rather than mid-session.
    pub fn new(
        pyramid: Pyramid,
        source: Arc<dyn TileSource>,
        surface_size: Point,
        config: ViewerConfig,
    ) -> Result<Self> {
        let pyramid = Pyramid::new(pyramid.levels().to_vec()).map_err(|err| {
            log::error!("rejecting pyramid: {err}");
            err
        })?;

        let viewport = Viewport::new(
            pyramid.base_width(),
            pyramid.base_height(),
            surface_size,
            &config,
        );
        let selector = LevelSelector::new(&pyramid, config.preload_band_fraction);
        let planner = TilePlanner::new(pyramid.base_width(), pyramid.base_height(), &config);
        let cache = TileCache::new(config.cache_capacity);
        let loader = TileLoader::new(source, &config.loader);
        let current_level = selector.select_level(viewport.scale);
        let debounce = ReplanDebouncer::new(config.drag_debounce, config.settle_debounce);

        let mut viewer = Self {
            config,
            viewport,
            pyramid,
            selector,
            planner,
            cache,
            loader: Some(loader),
            overlay: MarkerOverlay::empty(),
            animation: None,
            debounce,
            current_plan: Arc::new(Vec::new()),
            current_level,
            last_sweep: Instant::now(),
        };
        viewer.replan();
        Ok(viewer)
    }

    pub fn set_overlay(&mut self, overlay: MarkerOverlay) {
        self.overlay = overlay;
    }

    // --- input operations -------------------------------------------------

    /// Drag the view by a screen-space delta. Cancels any running zoom
    /// animation; direct input always wins.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.animation = None;
        self.viewport.pan(dx, dy);
        self.debounce.note_change(Instant::now(), true);
    }

    /// Direct zoom (mouse wheel), no animation.
    pub fn zoom_at(&mut self, target_scale: f64, anchor: Point) {
        self.animation = None;
        self.viewport.zoom_at(target_scale, anchor);
        self.debounce.note_change(Instant::now(), false);
    }

    /// Animated zoom toward `anchor`. Replaces any animation already in
    /// flight; the latest request wins.
    pub fn animate_zoom_to(&mut self, target_scale: f64, anchor: Point) {
        if !target_scale.is_finite() || !anchor.is_finite() {
            log::warn!("ignoring non-finite animated zoom request");
            return;
        }
        let target = target_scale.clamp(self.viewport.min_scale, self.viewport.max_scale);
        let image_point = self.viewport.screen_to_image(anchor);
        let to_offset = Point::new(
            anchor.x - image_point.x * target,
            anchor.y - image_point.y * target,
        );
        self.animation = Some(ZoomAnimation::new(
            self.viewport.scale,
            self.viewport.offset,
            target,
            to_offset,
            self.config.zoom_animation,
        ));
    }

    pub fn zoom_in(&mut self) {
        let center = self.viewport.size.multiply(0.5);
        self.animate_zoom_to(self.viewport.scale * ZOOM_STEP, center);
    }

    pub fn zoom_out(&mut self) {
        let center = self.viewport.size.multiply(0.5);
        self.animate_zoom_to(self.viewport.scale / ZOOM_STEP, center);
    }

    /// Animate back to the initial scale and origin.
    pub fn reset(&mut self) {
        let target = self
            .config
            .initial_scale
            .clamp(self.viewport.min_scale, self.viewport.max_scale);
        self.animation = Some(ZoomAnimation::new(
            self.viewport.scale,
            self.viewport.offset,
            target,
            Point::default(),
            self.config.zoom_animation,
        ));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
        self.debounce.force();
    }

    // --- the tick pipeline ------------------------------------------------

    /// One cooperative step. Returns the number of tiles that finished
    /// loading during this tick.
    pub fn tick(&mut self) -> usize {
        let now = Instant::now();

        if let Some(frame) = self.animation.as_ref().map(|anim| anim.sample(now)) {
            self.viewport.set_transform(frame.scale, frame.offset);
            if frame.finished {
                self.animation = None;
            }
            self.debounce.note_change(now, false);
        }

        if self.debounce.take_ready(now) {
            self.replan();
        }

        let mut completed = 0;
        if let Some(loader) = &self.loader {
            completed = loader.drain_completed(&mut self.cache);

            if now.duration_since(self.last_sweep) >= self.config.loader.sweep_interval {
                self.last_sweep = now;
                if let Ok(level) = self.pyramid.level(self.current_level) {
                    loader.reconcile(&self.current_plan, level, &self.cache);
                }
            }
        }
        completed
    }

    /// Recompute the plan for the current viewport and schedule loads.
    /// A disposed viewer stays inert.
    pub fn replan(&mut self) {
        if self.loader.is_none() {
            return;
        }
        let scale = self.viewport.scale;
        let level_id = self.selector.select_level(scale);
        if level_id != self.current_level {
            log::debug!(
                "level switch {} -> {} at scale {scale:.3}",
                self.current_level,
                level_id
            );
        }
        self.current_level = level_id;

        let plan = self.planner.plan(&self.viewport);
        self.cache
            .protect(plan.iter().map(|tile| (level_id, tile.id)));

        if let Some(loader) = &self.loader {
            if let Ok(level) = self.pyramid.level(level_id) {
                loader.ensure_loaded(&plan, level, &self.cache);
            }
            if let Some(preload_id) = self.selector.preload_level(scale) {
                if let Ok(level) = self.pyramid.level(preload_id) {
                    let visible: Vec<Tile> = plan
                        .iter()
                        .filter(|tile| tile.priority == TilePriority::Immediate)
                        .cloned()
                        .collect();
                    log::debug!("preloading {} tiles for {}", visible.len(), preload_id);
                    loader.enqueue_preload(&visible, level, &self.cache);
                }
            }
        }

        self.current_plan = plan;
    }

    // --- outputs ----------------------------------------------------------

    /// Draw commands for the render surface.
    pub fn frame(&self) -> Vec<DrawCommand> {
        compose_frame(
            &self.current_plan,
            &self.viewport,
            self.current_level,
            &self.cache,
            &self.pyramid,
            &self.config,
        )
    }

    pub fn visible_markers(&self) -> Vec<&StarMarker> {
        self.overlay.visible(&self.viewport)
    }

    pub fn hit_test(&self, screen_point: Point) -> Option<&StarMarker> {
        self.overlay.hit_test(screen_point, &self.viewport)
    }

    // --- introspection ----------------------------------------------------

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selected_level(&self) -> LevelId {
        self.current_level
    }

    pub fn plan(&self) -> &[Tile] {
        &self.current_plan
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn overlay(&self) -> &MarkerOverlay {
        &self.overlay
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.loader.as_ref().map_or(0, TileLoader::in_flight)
    }

    /// Tear down the loader and drop all cached state. The viewer is inert
    /// afterwards; no background work survives.
    pub fn dispose(&mut self) {
        if let Some(mut loader) = self.loader.take() {
            loader.dispose();
        }
        self.cache.clear();
        self.animation = None;
        self.current_plan = Arc::new(Vec::new());
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::PyramidLevel;
    use crate::tiles::source::TilePixels;
    use std::time::Duration;

    struct SyntheticSource;

    impl TileSource for SyntheticSource {
        fn decode_tile(&self, level: &PyramidLevel, tile: &Tile) -> Result<TilePixels> {
            Ok(TilePixels::new(1, 1, vec![level.id.0, tile.id.col as u8, 0, 255]))
        }
    }

    fn viewer() -> Viewer {
        Viewer::new(
            Pyramid::andromeda(),
            Arc::new(SyntheticSource),
            Point::new(800.0, 600.0),
            ViewerConfig::for_testing(),
        )
        .unwrap()
    }

    fn pump_until(viewer: &mut Viewer, predicate: impl Fn(&Viewer) -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !predicate(viewer) {
            assert!(
                std::time::Instant::now() < deadline,
                "pipeline did not settle in time"
            );
            viewer.tick();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn construction_plans_immediately() {
        let viewer = viewer();
        assert!(!viewer.plan().is_empty());
        // Initial scale 0.2 sits in the second level's range.
        assert_eq!(viewer.selected_level(), LevelId(1));
    }

    #[test]
    fn planned_tiles_arrive_in_the_cache() {
        let mut viewer = viewer();
        let planned = viewer.plan().len();
        pump_until(&mut viewer, |v| v.cache().len() >= planned.min(16));
        assert!(viewer
            .frame()
            .iter()
            .any(|cmd| matches!(cmd.source, crate::render::PixelSource::Tile(_))));
    }

    #[test]
    fn direct_zoom_across_a_boundary_switches_levels() {
        let mut viewer = viewer();
        viewer.zoom_at(0.6, Point::new(400.0, 300.0));
        pump_until(&mut viewer, |v| v.selected_level() == LevelId(2));
        assert_eq!(viewer.selected_level(), LevelId(2));
    }

    #[test]
    fn newer_animated_zoom_supersedes_the_old_one() {
        let mut viewer = viewer();
        viewer.animate_zoom_to(1.8, Point::new(400.0, 300.0));
        assert!(viewer.is_animating());
        viewer.animate_zoom_to(0.25, Point::new(400.0, 300.0));

        pump_until(&mut viewer, |v| !v.is_animating());
        assert!((viewer.viewport().scale - 0.25).abs() < 1e-9);
    }

    #[test]
    fn direct_input_cancels_the_animation() {
        let mut viewer = viewer();
        viewer.zoom_in();
        assert!(viewer.is_animating());
        viewer.pan(10.0, 10.0);
        assert!(!viewer.is_animating());
    }

    #[test]
    fn reset_returns_to_the_initial_transform() {
        let mut viewer = viewer();
        viewer.zoom_at(1.4, Point::new(200.0, 200.0));
        viewer.pan(-500.0, 80.0);
        viewer.reset();
        pump_until(&mut viewer, |v| !v.is_animating());
        assert!((viewer.viewport().scale - 0.2).abs() < 1e-9);
        assert_eq!(viewer.viewport().offset, Point::default());
    }

    #[test]
    fn markers_are_reachable_through_the_viewer() {
        let mut viewer = viewer();
        viewer.set_overlay(MarkerOverlay::andromeda());
        viewer.zoom_at(0.2, Point::new(0.0, 0.0));
        // The core marker sits at (21100, 4930); bring it on screen.
        viewer.pan(-21100.0 * 0.2 + 400.0, -4930.0 * 0.2 + 300.0);
        let hit = viewer.hit_test(Point::new(400.0, 300.0));
        assert!(hit.is_some_and(|marker| marker.id == "m31-core"));
    }

    #[test]
    fn dispose_makes_the_viewer_inert() {
        let mut viewer = viewer();
        pump_until(&mut viewer, |v| v.cache().len() > 0);
        viewer.dispose();

        assert_eq!(viewer.cache().len(), 0);
        assert_eq!(viewer.in_flight(), 0);
        assert!(viewer.plan().is_empty());
        // Ticking after dispose is a no-op, not a panic.
        viewer.tick();
    }
}
