use super::constraint::{Constraint, Coord};
use super::result::GeometryFeature;
use geo::{coord, BoundingRect, Geometry, Rect};
use serde::Serialize;
use std::f64::consts::PI;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            west: rect.min().x,
            south: rect.min().y,
            east: rect.max().x,
            north: rect.max().y,
        }
    }
}

/// Grows a rectangle over points and geometries.
#[derive(Debug, Clone, Default)]
pub struct BoundsAccumulator {
    rect: Option<Rect<f64>>,
}

impl BoundsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_point(&mut self, (lon, lat): Coord) {
        let point = coord! { x: lon, y: lat };
        self.extend_rect(Rect::new(point, point));
    }

    pub fn extend_rect(&mut self, other: Rect<f64>) {
        self.rect = Some(match self.rect {
            None => other,
            Some(rect) => Rect::new(
                coord! {
                    x: rect.min().x.min(other.min().x),
                    y: rect.min().y.min(other.min().y),
                },
                coord! {
                    x: rect.max().x.max(other.max().x),
                    y: rect.max().y.max(other.max().y),
                },
            ),
        });
    }

    /// Extends by the bounds of a GeoJSON geometry. Returns false when the
    /// geometry could not be converted or is empty.
    pub fn extend_geometry(&mut self, geometry: &geojson::Geometry) -> bool {
        let converted = match Geometry::<f64>::try_from(geometry.clone()) {
            Ok(g) => g,
            Err(e) => {
                log::warn!("Skipping feature with unsupported geometry: {}", e);
                return false;
            }
        };
        match converted.bounding_rect() {
            Some(rect) => {
                self.extend_rect(rect);
                true
            }
            None => {
                log::warn!("Skipping feature with empty geometry");
                false
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_none()
    }

    pub fn finish(self) -> Option<BoundingBox> {
        self.rect.map(BoundingBox::from)
    }
}

/// The region covering every resolved constraint and every result feature,
/// or `None` when there is nothing to show.
pub fn compute_bounds(constraints: &[Constraint], features: Option<&[GeometryFeature]>) -> Option<BoundingBox> {
    let mut bounds = BoundsAccumulator::new();
    for coordinates in constraints.iter().filter_map(|c| c.coordinates) {
        bounds.extend_point(coordinates);
    }
    for feature in features.unwrap_or_default() {
        bounds.extend_geometry(&feature.geometry);
    }
    bounds.finish()
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Pixels kept free on each side, horizontally and vertically.
    pub padding: (f64, f64),
    pub max_zoom: u8,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: (50.0, 50.0),
            max_zoom: 15,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coord,
    pub zoom: u8,
}

/// Center and integer Web Mercator zoom showing `bounds` inside a map of
/// `size` pixels.
pub fn fit_viewport(bounds: &BoundingBox, size: (f64, f64), options: &FitOptions) -> Viewport {
    let (west, north) = project((bounds.west, bounds.north));
    let (east, south) = project((bounds.east, bounds.south));
    let span_x = (east - west).abs();
    let span_y = (south - north).abs();

    let avail_x = (size.0 - 2.0 * options.padding.0).max(1.0);
    let avail_y = (size.1 - 2.0 * options.padding.1).max(1.0);

    let mut zoom = f64::from(options.max_zoom);
    if span_x > 0.0 {
        zoom = zoom.min((avail_x / (span_x * TILE_SIZE)).log2());
    }
    if span_y > 0.0 {
        zoom = zoom.min((avail_y / (span_y * TILE_SIZE)).log2());
    }
    let zoom = zoom.floor().clamp(0.0, f64::from(options.max_zoom)) as u8;

    Viewport {
        center: unproject(((west + east) / 2.0, (north + south) / 2.0)),
        zoom,
    }
}

/// Longitude/latitude to unit Web Mercator coordinates, y growing south.
fn project((lon, lat): Coord) -> (f64, f64) {
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lon + 180.0) / 360.0;
    let y = (1.0 - (phi.tan() + 1.0 / phi.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn unproject((x, y): (f64, f64)) -> Coord {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}
