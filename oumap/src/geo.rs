//! Viewport math for fitting the map to the visible markers.
//!
//! Uses the spherical Mercator projection with 256 px tiles, the same model the web map
//! renders with, so a computed center and zoom frame the markers the way the page would.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Latitude limit of the spherical Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;
pub const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pixel position at a zoom level, origin at the top-left of the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[inline]
fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a coordinate to world pixels at `zoom`.
pub fn project(position: LatLng, zoom: f64) -> Point {
    let size = world_size(zoom);
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (position.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    Point { x, y }
}

/// Inverse of [`project`].
pub fn unproject(point: Point, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = point.x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * point.y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLng { lat, lng }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_point(position: LatLng) -> Self {
        Self {
            south: position.lat,
            west: position.lng,
            north: position.lat,
            east: position.lng,
        }
    }

    /// Smallest bounds containing every point, `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_point(first), |mut bounds, point| {
            bounds.extend(point);
            bounds
        }))
    }

    pub fn extend(&mut self, position: LatLng) {
        self.south = self.south.min(position.lat);
        self.north = self.north.max(position.lat);
        self.west = self.west.min(position.lng);
        self.east = self.east.max(position.lng);
    }

    /// Grow each side by `ratio` of the current height/width.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_pad = (self.north - self.south) * ratio;
        let lng_pad = (self.east - self.west) * ratio;
        Self {
            south: self.south - lat_pad,
            west: self.west - lng_pad,
            north: self.north + lat_pad,
            east: self.east + lng_pad,
        }
    }

    pub fn contains(&self, position: LatLng) -> bool {
        position.lat >= self.south && position.lat <= self.north && position.lng >= self.west && position.lng <= self.east
    }

    /// Center in projected space, so it lies where the map would draw the middle.
    pub fn center(&self) -> LatLng {
        let south_west = project(LatLng::new(self.south, self.west), 0.0);
        let north_east = project(LatLng::new(self.north, self.east), 0.0);
        unproject(
            Point {
                x: (south_west.x + north_east.x) / 2.0,
                y: (south_west.y + north_east.y) / 2.0,
            },
            0.0,
        )
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }
}

/// Size of the map container in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Largest integer zoom at which `bounds` fits inside `viewport`, capped at `max_zoom`.
pub fn fit_zoom(bounds: &Bounds, viewport: Viewport, max_zoom: u8) -> u8 {
    if bounds.is_point() {
        return max_zoom;
    }
    let south_west = project(LatLng::new(bounds.south, bounds.west), 0.0);
    let north_east = project(LatLng::new(bounds.north, bounds.east), 0.0);
    let width = (north_east.x - south_west.x).abs();
    let height = (south_west.y - north_east.y).abs();

    let scale_x = if width > 0.0 { f64::from(viewport.width) / width } else { f64::INFINITY };
    let scale_y = if height > 0.0 { f64::from(viewport.height) / height } else { f64::INFINITY };
    let scale = scale_x.min(scale_y);
    if !scale.is_finite() || scale <= 1.0 {
        return 0;
    }

    let zoom = scale.log2().floor();
    if zoom >= f64::from(max_zoom) { max_zoom } else { zoom as u8 }
}

/// Center and zoom framing the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub bounds: Bounds,
    pub center: LatLng,
    pub zoom: u8,
}

impl MapView {
    pub fn fit(bounds: Bounds, viewport: Viewport, max_zoom: u8, padding: f64) -> Self {
        let padded = if padding > 0.0 { bounds.pad(padding) } else { bounds };
        Self {
            bounds: padded,
            center: padded.center(),
            zoom: fit_zoom(&padded, viewport, max_zoom),
        }
    }
}
