use std::sync::Arc;
use std::time::Duration;

use foundation::bounds::GeoBounds;
use foundation::math::{LatLng, path_length_m};
use serde::Serialize;
use tracing::{debug, warn};

use crate::providers::{DEFAULT_LOOKUP_TIMEOUT, RoutingService, with_timeout};

/// Path connecting a route's waypoints, latitude first.
///
/// Derived and never persisted. Empty means "no geometry": fewer than two
/// waypoints or the routing service could not produce one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedGeometry {
    path: Vec<LatLng>,
}

impl ResolvedGeometry {
    pub fn new(path: Vec<LatLng>) -> Self {
        Self { path }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(&self.path)
    }

    pub fn length_m(&self) -> f64 {
        path_length_m(&self.path)
    }
}

/// Turns an ordered waypoint sequence into a drawable path via an external
/// routing service.
///
/// Never fails: transport errors, timeouts, malformed answers and "no route"
/// all yield an empty geometry and a `warn!`. No retries.
#[derive(Clone)]
pub struct GeometryResolver {
    service: Arc<dyn RoutingService>,
    timeout: Duration,
}

impl GeometryResolver {
    pub fn new(service: Arc<dyn RoutingService>) -> Self {
        Self {
            service,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve(&self, points: &[LatLng]) -> ResolvedGeometry {
        if points.len() < 2 {
            return ResolvedGeometry::empty();
        }

        let coords = points.iter().map(|p| p.to_lng_lat()).collect();
        match with_timeout(self.timeout, self.service.route(coords)).await {
            Ok(Some(vertices)) if !vertices.is_empty() => {
                ResolvedGeometry::new(vertices.into_iter().map(|v| v.to_lat_lng()).collect())
            }
            Ok(_) => {
                warn!(waypoints = points.len(), "routing service returned no route");
                ResolvedGeometry::empty()
            }
            Err(err) => {
                warn!(waypoints = points.len(), "route resolution failed: {err}");
                ResolvedGeometry::empty()
            }
        }
    }
}

/// Single-slot memo of the last successful resolution.
///
/// Keyed by the ordered coordinate sequence compared by value, so re-rendering
/// an unchanged route costs no external call. Empty results are not kept:
/// the next render with the same input asks the service again.
#[derive(Debug, Default)]
pub struct GeometryCache {
    last: Option<(Vec<LatLng>, ResolvedGeometry)>,
    hits: u64,
    misses: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(
        &mut self,
        resolver: &GeometryResolver,
        points: &[LatLng],
    ) -> ResolvedGeometry {
        if let Some((key, geometry)) = &self.last
            && key.as_slice() == points
        {
            self.hits += 1;
            debug!(waypoints = points.len(), "geometry cache hit");
            return geometry.clone();
        }

        self.misses += 1;
        let geometry = resolver.resolve(points).await;
        self.last = if geometry.is_empty() {
            None
        } else {
            Some((points.to_vec(), geometry.clone()))
        };
        geometry
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
