use serde::Serialize;

use crate::deep_link::{TravelMode, directions_url};
use crate::geometry::{GeometryCache, GeometryResolver, ResolvedGeometry};
use crate::markers::Marker;
use crate::record::RouteRecord;
use crate::surface::{FIT_TILES, FOCUS_ZOOM, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewConfig {
    pub default_viewport: Viewport,
    pub travel_mode: Option<TravelMode>,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            default_viewport: Viewport::default(),
            travel_mode: None,
        }
    }
}

/// What a read-only route map shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSnapshot {
    pub markers: Vec<Marker>,
    pub geometry: ResolvedGeometry,
    pub viewport: Viewport,
    /// Length of the resolved path; absent without geometry.
    pub length_m: Option<f64>,
    pub deep_link: Option<String>,
}

/// Read-only counterpart of the edit surface for persisted routes.
///
/// Owns a [`GeometryCache`], so rendering the same stops again does not hit
/// the routing service.
#[derive(Debug, Default)]
pub struct RouteOverview {
    config: OverviewConfig,
    cache: GeometryCache,
}

impl RouteOverview {
    pub fn new(config: OverviewConfig) -> Self {
        Self {
            config,
            cache: GeometryCache::new(),
        }
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub async fn render(
        &mut self,
        resolver: &GeometryResolver,
        record: &RouteRecord,
    ) -> OverviewSnapshot {
        let stops = record.stops();
        let Some(start) = stops.start else {
            return OverviewSnapshot {
                markers: Vec::new(),
                geometry: ResolvedGeometry::empty(),
                viewport: self.config.default_viewport,
                length_m: None,
                deep_link: None,
            };
        };

        let geometry = self.cache.resolve(resolver, &stops.ordered_points()).await;
        let viewport = match geometry.bounds() {
            Some(bounds) => Viewport::fit(bounds, FIT_TILES),
            None => Viewport::new(start.position(), FOCUS_ZOOM),
        };
        let length_m = (!geometry.is_empty()).then(|| geometry.length_m());

        OverviewSnapshot {
            markers: stops.markers(),
            viewport,
            length_m,
            deep_link: directions_url(&stops, self.config.travel_mode).map(String::from),
            geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use foundation::ids::RouteId;
    use foundation::math::LatLng;

    use super::{OverviewConfig, RouteOverview};
    use crate::geometry::GeometryResolver;
    use crate::markers::MarkerRole;
    use crate::providers::stubs::StubRouter;
    use crate::record::{RouteDetails, RouteRecord};
    use crate::surface::{FOCUS_ZOOM, Viewport};
    use crate::waypoint::Waypoint;

    fn record(
        start: Option<(f64, f64)>,
        interests: &[(f64, f64)],
        end: Option<(f64, f64)>,
    ) -> RouteRecord {
        let wp = |(lat, lng): (f64, f64)| Waypoint::new(lat, lng).unwrap();
        RouteRecord {
            id: RouteId(1),
            details: RouteDetails {
                name: "Orla".to_string(),
                description: None,
            },
            publisher_id: Some("u1".to_string()),
            start: start.map(wp),
            end: end.map(wp),
            interest_points: interests.iter().copied().map(wp).collect(),
        }
    }

    #[tokio::test]
    async fn full_route_renders_markers_geometry_and_link() {
        let stub = Arc::new(StubRouter::default());
        let resolver = GeometryResolver::new(stub.clone());
        let mut overview = RouteOverview::new(OverviewConfig::default());
        let rec = record(Some((0.0, 0.0)), &[(0.5, 0.5)], Some((1.0, 1.0)));

        let snap = overview.render(&resolver, &rec).await;

        let roles: Vec<MarkerRole> = snap.markers.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MarkerRole::Start, MarkerRole::Interest, MarkerRole::End]);
        assert_eq!(snap.geometry.path().len(), 3);
        assert_eq!(snap.viewport.center, LatLng { lat: 0.5, lng: 0.5 });
        assert!(snap.length_m.unwrap() > 0.0);
        assert!(snap.deep_link.unwrap().contains("destination=1%2C1"));
    }

    #[tokio::test]
    async fn no_explicit_end_means_no_end_marker() {
        let stub = Arc::new(StubRouter::default());
        let resolver = GeometryResolver::new(stub);
        let mut overview = RouteOverview::default();
        let rec = record(Some((0.0, 0.0)), &[(0.5, 0.5), (0.7, 0.7)], None);

        let snap = overview.render(&resolver, &rec).await;
        assert_eq!(snap.markers.first().map(|m| m.role), Some(MarkerRole::Start));
        assert_eq!(snap.markers.last().map(|m| m.role), Some(MarkerRole::Interest));
        assert_eq!(snap.geometry.path().len(), 3);
    }

    #[tokio::test]
    async fn no_start_renders_neutral_map() {
        let stub = Arc::new(StubRouter::default());
        let resolver = GeometryResolver::new(stub.clone());
        let mut overview = RouteOverview::default();
        let rec = record(None, &[(0.5, 0.5)], Some((1.0, 1.0)));

        let snap = overview.render(&resolver, &rec).await;
        assert!(snap.markers.is_empty());
        assert!(snap.geometry.is_empty());
        assert_eq!(snap.viewport, Viewport::default());
        assert_eq!(snap.deep_link, None);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_resolution_keeps_markers_and_centers_on_start() {
        let stub = Arc::new(StubRouter::returning(Ok(None)));
        let resolver = GeometryResolver::new(stub);
        let mut overview = RouteOverview::default();
        let rec = record(Some((2.0, 3.0)), &[], Some((1.0, 1.0)));

        let snap = overview.render(&resolver, &rec).await;
        assert_eq!(snap.markers.len(), 2);
        assert!(snap.geometry.is_empty());
        assert_eq!(snap.length_m, None);
        assert_eq!(
            snap.viewport,
            Viewport::new(LatLng { lat: 2.0, lng: 3.0 }, FOCUS_ZOOM)
        );
    }

    #[tokio::test]
    async fn rerender_of_same_route_is_a_cache_hit() {
        let stub = Arc::new(StubRouter::default());
        let resolver = GeometryResolver::new(stub.clone());
        let mut overview = RouteOverview::default();
        let rec = record(Some((0.0, 0.0)), &[], Some((1.0, 1.0)));

        overview.render(&resolver, &rec).await;
        overview.render(&resolver, &rec.clone()).await;
        assert_eq!(stub.call_count(), 1);
        assert_eq!(overview.cache().hits(), 1);
    }
}
