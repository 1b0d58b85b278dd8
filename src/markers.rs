//! Star marker overlay: catalog ingestion, visibility culling and
//! hit-testing in image space.
//!
//! Raw catalog records are normalized at the boundary: anything missing a
//! position or a name is rejected with a warning and never becomes a
//! partially-formed marker.

use crate::core::{point::Point, viewport::Viewport};
use crate::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Screen-pixel margin added to the visible region when culling, so
/// markers slide in smoothly instead of popping at the edge.
const CULL_MARGIN_PX: f64 = 100.0;

/// Minimum hit-test radius in screen pixels.
const MIN_HIT_RADIUS_PX: f64 = 30.0;

/// A raw catalog record as it appears in the JSON dataset. Everything is
/// optional here; normalization decides what survives.
#[derive(Debug, Deserialize)]
struct RawStarRecord {
    id: Option<String>,
    name: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    #[serde(rename = "type")]
    classification: Option<String>,
    magnitude: Option<f64>,
    #[serde(rename = "spectralClass")]
    spectral_class: Option<String>,
    distance: Option<String>,
    temperature: Option<String>,
    mass: Option<String>,
    description: Option<String>,
}

/// A validated star marker, positioned in base-image pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarMarker {
    pub id: String,
    pub name: String,
    pub position: Point,
    pub classification: String,
    pub magnitude: f64,
    pub spectral_class: Option<String>,
    pub distance: Option<String>,
    pub temperature: Option<String>,
    pub mass: Option<String>,
    pub description: Option<String>,
}

impl StarMarker {
    /// Marker radius in screen pixels: brighter stars draw larger, and the
    /// radius shrinks with the square root of the scale so markers stay
    /// legible without dominating deep zooms.
    pub fn radius(&self, scale: f64) -> f64 {
        base_radius(self.magnitude, scale)
    }
}

fn base_radius(magnitude: f64, scale: f64) -> f64 {
    let brightness = ((10.0 - magnitude) * 1.5).clamp(3.0, 12.0);
    (brightness / scale.max(1e-6).sqrt()).clamp(4.0, 20.0)
}

/// An overlay of star markers over the image plane
#[derive(Debug, Clone, Default)]
pub struct MarkerOverlay {
    markers: Vec<StarMarker>,
}

impl MarkerOverlay {
    pub fn new(markers: Vec<StarMarker>) -> Self {
        Self { markers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a raw JSON catalog, normalizing records at the boundary.
    /// Records without coordinates or a name are skipped with a warning;
    /// a malformed document is an error.
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<RawStarRecord> = serde_json::from_str(raw)?;
        let mut markers = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let (Some(x), Some(y), Some(name)) = (record.x, record.y, record.name) else {
                log::warn!("skipping star record {index}: missing position or name");
                continue;
            };
            if !x.is_finite() || !y.is_finite() {
                log::warn!("skipping star record {index} ({name}): non-finite position");
                continue;
            }
            markers.push(StarMarker {
                id: record.id.unwrap_or_else(|| format!("star-{index}")),
                name,
                position: Point::new(x, y),
                classification: record.classification.unwrap_or_else(|| "star".into()),
                magnitude: record.magnitude.unwrap_or(10.0),
                spectral_class: record.spectral_class,
                distance: record.distance,
                temperature: record.temperature,
                mass: record.mass,
                description: record.description,
            });
        }
        log::debug!("loaded {} star markers", markers.len());
        Ok(Self { markers })
    }

    /// The built-in Andromeda catalog
    pub fn andromeda() -> Self {
        ANDROMEDA.clone()
    }

    pub fn markers(&self) -> &[StarMarker] {
        &self.markers
    }

    /// Markers inside the visible region, with a screen-pixel margin.
    pub fn visible<'a>(&'a self, viewport: &Viewport) -> Vec<&'a StarMarker> {
        let margin = CULL_MARGIN_PX / viewport.scale;
        let region = viewport.visible_region().expand(margin);
        self.markers
            .iter()
            .filter(|marker| region.contains(&marker.position))
            .collect()
    }

    pub fn screen_position(&self, marker: &StarMarker, viewport: &Viewport) -> Point {
        viewport.image_to_screen(marker.position)
    }

    /// The nearest marker within the hit threshold of a screen point, or
    /// `None`. The threshold adapts to the marker's drawn radius but never
    /// shrinks below a finger-sized minimum.
    pub fn hit_test<'a>(
        &'a self,
        screen_point: Point,
        viewport: &Viewport,
    ) -> Option<&'a StarMarker> {
        let image_point = viewport.screen_to_image(screen_point);
        let scale = viewport.scale.max(1e-6);

        let mut best: Option<(&StarMarker, f64)> = None;
        for marker in &self.markers {
            let threshold_screen = (marker.radius(scale) * 4.0).max(MIN_HIT_RADIUS_PX);
            let threshold_image = threshold_screen / scale;
            let distance = marker.position.distance_to(&image_point);
            if distance <= threshold_image
                && best.map_or(true, |(_, best_distance)| distance < best_distance)
            {
                best = Some((marker, distance));
            }
        }
        best.map(|(marker, _)| marker)
    }
}

static ANDROMEDA: Lazy<MarkerOverlay> = Lazy::new(|| {
    match MarkerOverlay::from_json(ANDROMEDA_CATALOG) {
        Ok(overlay) => overlay,
        Err(err) => {
            log::error!("embedded catalog failed to parse: {err}");
            MarkerOverlay::empty()
        }
    }
});

/// Notable objects on the 42208x9870 M31 mosaic plane.
const ANDROMEDA_CATALOG: &str = r#"[
  {
    "id": "m32",
    "name": "Messier 32",
    "x": 26350, "y": 8210,
    "type": "galaxy",
    "magnitude": 8.1,
    "distance": "2.49 million ly",
    "description": "Compact elliptical companion of the Andromeda Galaxy."
  },
  {
    "id": "ngc-206",
    "name": "NGC 206",
    "x": 12480, "y": 6150,
    "type": "star cloud",
    "magnitude": 11.9,
    "description": "The brightest star cloud in Andromeda, a vast stellar nursery."
  },
  {
    "id": "m31-core",
    "name": "Andromeda Core",
    "x": 21100, "y": 4930,
    "type": "galactic nucleus",
    "magnitude": 3.4,
    "description": "The dense central bulge of M31, hosting a supermassive black hole."
  },
  {
    "id": "g1",
    "name": "Mayall II (G1)",
    "x": 4850, "y": 8900,
    "type": "globular cluster",
    "magnitude": 13.7,
    "mass": "7.5 million solar masses",
    "description": "The most luminous globular cluster in the Local Group."
  },
  {
    "id": "g76",
    "name": "G76",
    "x": 14120, "y": 7480,
    "type": "globular cluster",
    "magnitude": 14.2,
    "description": "A bright globular cluster in Andromeda's southwestern disk."
  },
  {
    "id": "af-and",
    "name": "AF Andromedae",
    "x": 18740, "y": 3620,
    "type": "luminous blue variable",
    "magnitude": 15.2,
    "temperature": "18,000 K",
    "description": "One of the brightest known luminous blue variables in M31."
  },
  {
    "id": "m31-v1",
    "name": "M31-V1",
    "x": 24060, "y": 2980,
    "type": "cepheid variable",
    "magnitude": 18.5,
    "description": "Hubble's famous Cepheid, the star that settled the island-universe debate."
  },
  {
    "id": "ngc-224-om",
    "name": "Outer Dust Lane",
    "x": 31500, "y": 3400,
    "type": "dust lane",
    "magnitude": 12.0,
    "description": "A prominent dark dust lane tracing the northeastern spiral arm."
  }
]"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ViewerConfig;

    fn viewport_at(scale: f64) -> Viewport {
        let mut config = ViewerConfig::default();
        config.initial_scale = scale;
        Viewport::new(42208, 9870, Point::new(1600.0, 900.0), &config)
    }

    #[test]
    fn embedded_catalog_parses() {
        let overlay = MarkerOverlay::andromeda();
        assert!(!overlay.markers().is_empty());
        assert!(overlay.markers().iter().all(|m| !m.name.is_empty()));
    }

    #[test]
    fn records_without_position_or_name_are_rejected() {
        let raw = r#"[
            {"id": "ok", "name": "Kept", "x": 10.0, "y": 20.0, "magnitude": 5.0},
            {"id": "no-pos", "name": "Dropped"},
            {"x": 5.0, "y": 5.0, "magnitude": 3.0},
            {"id": "half-pos", "name": "AlsoDropped", "x": 12.0}
        ]"#;
        let overlay = MarkerOverlay::from_json(raw).unwrap();
        assert_eq!(overlay.markers().len(), 1);
        assert_eq!(overlay.markers()[0].name, "Kept");
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(MarkerOverlay::from_json("{not json").is_err());
    }

    #[test]
    fn culling_keeps_markers_near_the_view() {
        let overlay = MarkerOverlay::new(vec![
            StarMarker {
                id: "in".into(),
                name: "Inside".into(),
                position: Point::new(1000.0, 1000.0),
                classification: "star".into(),
                magnitude: 5.0,
                spectral_class: None,
                distance: None,
                temperature: None,
                mass: None,
                description: None,
            },
            StarMarker {
                id: "out".into(),
                name: "FarAway".into(),
                position: Point::new(40000.0, 9000.0),
                classification: "star".into(),
                magnitude: 5.0,
                spectral_class: None,
                distance: None,
                temperature: None,
                mass: None,
                description: None,
            },
        ]);

        let vp = viewport_at(0.2); // sees 8000x4500 image pixels from origin
        let visible = overlay.visible(&vp);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Inside");
    }

    #[test]
    fn radius_shrinks_with_scale_and_stays_clamped() {
        let overlay = MarkerOverlay::andromeda();
        let marker = &overlay.markers()[0];
        let coarse = marker.radius(0.05);
        let deep = marker.radius(3.0);
        assert!(coarse >= deep);
        assert!((4.0..=20.0).contains(&coarse));
        assert!((4.0..=20.0).contains(&deep));
    }

    #[test]
    fn hit_test_finds_the_nearest_marker_within_threshold() {
        let overlay = MarkerOverlay::andromeda();
        let vp = viewport_at(0.2);

        let target = &overlay.markers()[0];
        let screen = overlay.screen_position(target, &vp);

        // Dead-on hit.
        let hit = overlay.hit_test(screen, &vp).unwrap();
        assert_eq!(hit.id, target.id);

        // A few pixels off still hits.
        let near = Point::new(screen.x + 10.0, screen.y - 8.0);
        assert!(overlay.hit_test(near, &vp).is_some());

        // Far away misses.
        let far = Point::new(screen.x + 500.0, screen.y + 500.0);
        let miss = overlay.hit_test(far, &vp);
        assert!(miss.is_none() || miss.unwrap().id != target.id);
    }

    #[test]
    fn hit_threshold_grows_when_zoomed_out() {
        let overlay = MarkerOverlay::andromeda();
        let target = &overlay.markers()[0];

        // At a tiny scale, 30 screen px cover a large image distance.
        let vp = viewport_at(0.01);
        let screen = overlay.screen_position(target, &vp);
        let off_by_25px = Point::new(screen.x + 25.0, screen.y);
        assert!(overlay.hit_test(off_by_25px, &vp).is_some());
    }
}
