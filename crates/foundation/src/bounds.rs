use serde::{Deserialize, Serialize};

use crate::math::LatLng;

/// Largest zoom a fitted viewport is allowed to reach (street level).
pub const MAX_FIT_ZOOM: f64 = 18.0;

/// Geographic bounding box in degrees (south-west / north-east corners).
///
/// Does not handle boxes crossing the antimeridian; route extents are small.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        GeoBounds {
            south_west,
            north_east,
        }
    }

    /// Smallest box containing every point; `None` for an empty slice.
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = GeoBounds::new(*first, *first);
        for p in rest {
            b.extend(*p);
        }
        Some(b)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) * 0.5,
            lng: (self.south_west.lng + self.north_east.lng) * 0.5,
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&p.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&p.lng)
    }

    /// Web-mercator zoom at which the box spans at most `tiles` 256px tiles in
    /// its larger dimension. Degenerate boxes (single point) get [`MAX_FIT_ZOOM`].
    pub fn fit_zoom(&self, tiles: f64) -> f64 {
        let lng_span = (self.north_east.lng - self.south_west.lng).abs();
        let lat_span = (self.north_east.lat - self.south_west.lat).abs();
        let span = lng_span.max(lat_span);
        if span <= f64::EPSILON {
            return MAX_FIT_ZOOM;
        }
        (360.0 * tiles / span).log2().floor().clamp(0.0, MAX_FIT_ZOOM)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoBounds, MAX_FIT_ZOOM};
    use crate::math::LatLng;

    fn p(lat: f64, lng: f64) -> LatLng {
        LatLng { lat, lng }
    }

    #[test]
    fn from_points_covers_all() {
        let b = GeoBounds::from_points(&[p(1.0, 5.0), p(-2.0, 3.0), p(0.5, 7.0)]).unwrap();
        assert_eq!(b.south_west, p(-2.0, 3.0));
        assert_eq!(b.north_east, p(1.0, 7.0));
        assert_eq!(b.center(), p(-0.5, 5.0));
        assert!(b.contains(p(0.0, 4.0)));
        assert!(!b.contains(p(2.0, 4.0)));
    }

    #[test]
    fn empty_has_no_bounds() {
        assert!(GeoBounds::from_points(&[]).is_none());
    }

    #[test]
    fn fit_zoom_shrinks_with_span() {
        let small = GeoBounds::new(p(0.0, 0.0), p(0.01, 0.01));
        let large = GeoBounds::new(p(0.0, 0.0), p(10.0, 10.0));
        assert!(small.fit_zoom(3.0) > large.fit_zoom(3.0));
        assert_eq!(GeoBounds::new(p(1.0, 1.0), p(1.0, 1.0)).fit_zoom(3.0), MAX_FIT_ZOOM);
    }
}
