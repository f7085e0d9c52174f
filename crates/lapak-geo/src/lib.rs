//! Geospatial primitives for the lapak marketplace.
//!
//! The backend has stored listing positions in three incompatible encodings
//! over its lifetime: WKT text (`POINT(lon lat)`), hex-encoded binary
//! geometry, and GeoJSON-shaped coordinate objects. This crate classifies a
//! raw location value into a [`RawLocation`] variant once, then decodes it
//! into a normalized [`Coordinate`] or a typed [`DecodeError`], never a
//! panic. Everything here is pure and synchronous.

mod error;
mod haversine;
mod location;
mod wkb;
mod wkt;

pub use error::DecodeError;
pub use haversine::{haversine_distance_meters, EARTH_RADIUS_M};
pub use location::{decode_value, GeoPoint, RawLocation};

use serde::{Deserialize, Serialize};

/// A geographic coordinate in display order: latitude first, longitude second.
///
/// Every storage encoding puts longitude first; the decoders perform the axis
/// swap exactly once, when constructing this type. Immutable value type with
/// no identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, nominally in [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, nominally in [-180, 180].
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both axes are finite and inside the WGS84 value range.
    ///
    /// The decoders only require finiteness (the backend has been observed to
    /// hand back slightly out-of-range values for manually entered listings);
    /// query validation uses this stricter check.
    #[must_use]
    pub fn is_in_bounds(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}
