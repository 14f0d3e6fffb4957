use serde::{Deserialize, Serialize};

/// Mean Earth radius (meters), IUGG.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

pub const LAT_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LNG_RANGE: (f64, f64) = (-180.0, 180.0);

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
}

/// Geographic position in degrees, latitude first.
///
/// This is the axis order used everywhere inside the workspace. Providers that
/// speak longitude-first get a [`LngLat`] at the boundary.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Validated constructor. NaN fails both range checks.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !(LAT_RANGE.0..=LAT_RANGE.1).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !(LNG_RANGE.0..=LNG_RANGE.1).contains(&lng) {
            return Err(CoordinateError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn to_lng_lat(self) -> LngLat {
        LngLat {
            lng: self.lng,
            lat: self.lat,
        }
    }
}

/// Longitude-first pair, as spoken by GeoJSON and OSRM.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn to_lat_lng(self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        LngLat { lng: v[0], lat: v[1] }
    }
}

/// Great-circle distance on a sphere of [`MEAN_EARTH_RADIUS_M`].
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    2.0 * MEAN_EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Sum of consecutive segment lengths.
pub fn path_length_m(path: &[LatLng]) -> f64 {
    path.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}
