//! Interactive edit map: turns map clicks and place-search selections into
//! [`PointChosen`] events. It never decides where a point goes in the draft;
//! the caller dispatches through its [`crate::EditMode`].

use std::sync::Arc;
use std::time::Duration;

use foundation::bounds::GeoBounds;
use foundation::math::LatLng;
use runtime::event_bus::{Event, EventBus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::ResolvedGeometry;
use crate::markers::Marker;
use crate::providers::{
    DEFAULT_LOOKUP_TIMEOUT, Geocoder, PlaceCandidate, PlaceSearch, SearchQuery, with_timeout,
};
use crate::stops::Stops;
use crate::waypoint::{Waypoint, WaypointError, coordinate_label};

/// Brasília; neutral center when there is nothing to show.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: -15.7801,
    lng: -47.9292,
};
pub const DEFAULT_ZOOM: f64 = 4.0;
pub const FOCUS_ZOOM: f64 = 15.0;
/// Tiles a fitted route may span across the map's larger dimension.
pub const FIT_TILES: f64 = 3.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn fit(bounds: GeoBounds, tiles: f64) -> Self {
        Self {
            center: bounds.center(),
            zoom: bounds.fit_zoom(tiles),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER, DEFAULT_ZOOM)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChosenFrom {
    Click,
    Search,
}

/// The surface's only output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointChosen {
    pub waypoint: Waypoint,
    pub from: ChosenFrom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub default_viewport: Viewport,
    pub focus_zoom: f64,
    pub search_region: Option<String>,
    pub search_limit: usize,
    pub lookup_timeout: Duration,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            default_viewport: Viewport::default(),
            focus_zoom: FOCUS_ZOOM,
            search_region: None,
            search_limit: 5,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

/// Provider half of the surface, cloneable so lookups can run detached from
/// whatever lock guards the surface itself.
#[derive(Clone)]
pub struct SurfaceLookups {
    geocoder: Arc<dyn Geocoder>,
    search: Arc<dyn PlaceSearch>,
    region: Option<String>,
    limit: usize,
    timeout: Duration,
}

impl SurfaceLookups {
    /// Best-effort place label for a clicked position.
    ///
    /// `None` when the geocoder fails, times out or has no name; the point
    /// keeps its coordinate label in that case.
    pub async fn label_for(&self, at: LatLng) -> Option<String> {
        match with_timeout(self.timeout, self.geocoder.reverse(at)).await {
            Ok(Some(label)) if !label.trim().is_empty() => Some(label),
            Ok(_) => {
                debug!(lat = at.lat, lng = at.lng, "geocoder has no label");
                None
            }
            Err(err) => {
                warn!(lat = at.lat, lng = at.lng, "reverse geocoding failed: {err}");
                None
            }
        }
    }

    /// Candidates for a free-text query. Failures yield no candidates.
    pub async fn search(&self, text: &str) -> Vec<PlaceCandidate> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let query = SearchQuery {
            text: text.to_string(),
            region: self.region.clone(),
            limit: self.limit,
        };
        match with_timeout(self.timeout, self.search.search(query)).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(query = text, "place search failed: {err}");
                Vec::new()
            }
        }
    }
}

pub struct MapEditSurface {
    lookups: SurfaceLookups,
    config: SurfaceConfig,
    viewport: Viewport,
    events: EventBus<PointChosen>,
}

impl MapEditSurface {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        search: Arc<dyn PlaceSearch>,
        config: SurfaceConfig,
    ) -> Self {
        let lookups = SurfaceLookups {
            geocoder,
            search,
            region: config.search_region.clone(),
            limit: config.search_limit,
            timeout: config.lookup_timeout,
        };
        Self {
            lookups,
            viewport: config.default_viewport,
            config,
            events: EventBus::new(),
        }
    }

    pub fn lookups(&self) -> &SurfaceLookups {
        &self.lookups
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Map click. The point is usable right away with a coordinate label;
    /// the geocoded name arrives later via [`SurfaceLookups::label_for`].
    pub fn click(&mut self, lat: f64, lng: f64) -> Result<PointChosen, WaypointError> {
        let waypoint = Waypoint::new(lat, lng)?;
        let label = coordinate_label(waypoint.position());
        Ok(self.choose(waypoint.with_label(label), ChosenFrom::Click))
    }

    /// Search-box selection: label and coordinates come from the provider.
    pub fn select(&mut self, candidate: PlaceCandidate) -> Result<PointChosen, WaypointError> {
        let position = candidate.position;
        let waypoint = Waypoint::new(position.lat, position.lng)?;
        let label = if candidate.label.trim().is_empty() {
            coordinate_label(position)
        } else {
            candidate.label
        };
        Ok(self.choose(waypoint.with_label(label), ChosenFrom::Search))
    }

    fn choose(&mut self, waypoint: Waypoint, from: ChosenFrom) -> PointChosen {
        self.focus(waypoint.position());
        let chosen = PointChosen { waypoint, from };
        self.events.emit(chosen.clone());
        chosen
    }

    /// Fly to `at` at the focus zoom. Cosmetic.
    pub fn focus(&mut self, at: LatLng) {
        self.viewport = Viewport::new(at, self.config.focus_zoom);
    }

    /// Fit the viewport to a freshly resolved path; empty paths leave it alone.
    pub fn fit_geometry(&mut self, geometry: &ResolvedGeometry) {
        if let Some(bounds) = geometry.bounds() {
            self.viewport = Viewport::fit(bounds, FIT_TILES);
        }
    }

    pub fn markers(&self, stops: &Stops<'_>) -> Vec<Marker> {
        stops.markers()
    }

    pub fn drain_events(&mut self) -> Vec<Event<PointChosen>> {
        self.events.drain()
    }
}
