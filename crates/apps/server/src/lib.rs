//! RotaTur HTTP API: route authoring sessions, browsing and overviews.

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod nominatim;
pub mod osrm;
pub mod sessions;
pub mod supabase;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::Router;
use dashmap::DashMap;
use foundation::ids::RouteId;
use routes::gateway::PersistenceGateway;
use routes::{
    Geocoder, GeometryResolver, OverviewConfig, PlaceSearch, RouteOverview, RoutingService,
    SurfaceConfig,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::sessions::SessionTable;

/// Idle time after which an unsaved draft is discarded.
pub const DEFAULT_DRAFT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct Settings {
    pub surface: SurfaceConfig,
    pub overview: OverviewConfig,
    pub draft_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            overview: OverviewConfig::default(),
            draft_ttl: DEFAULT_DRAFT_TTL,
        }
    }
}

/// Shared handler state. Collaborators are built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub geocoder: Arc<dyn Geocoder>,
    pub search: Arc<dyn PlaceSearch>,
    pub resolver: Arc<GeometryResolver>,
    pub sessions: Arc<SessionTable>,
    pub settings: Arc<Settings>,
    overviews: Arc<DashMap<RouteId, Arc<tokio::sync::Mutex<RouteOverview>>>>,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        geocoder: Arc<dyn Geocoder>,
        search: Arc<dyn PlaceSearch>,
        routing: Arc<dyn RoutingService>,
        settings: Settings,
    ) -> Self {
        let resolver = GeometryResolver::new(routing).with_timeout(settings.surface.lookup_timeout);
        Self {
            gateway,
            geocoder,
            search,
            resolver: Arc::new(resolver),
            sessions: Arc::new(SessionTable::new(settings.draft_ttl)),
            settings: Arc::new(settings),
            overviews: Arc::new(DashMap::new()),
        }
    }

    /// Per-route renderer, so repeated overviews of an unchanged route reuse
    /// the resolved geometry.
    pub fn overview_for(&self, id: RouteId) -> Arc<tokio::sync::Mutex<RouteOverview>> {
        let entry = self.overviews.entry(id).or_insert_with(|| {
            Arc::new(tokio::sync::Mutex::new(RouteOverview::new(
                self.settings.overview.clone(),
            )))
        });
        Arc::clone(entry.value())
    }

    pub fn forget_overview(&self, id: RouteId) {
        self.overviews.remove(&id);
    }
}

pub fn app(state: AppState) -> Router {
    // The page layer is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use foundation::math::{LatLng, LngLat};
    use routes::{
        BoxFuture, Geocoder, PlaceCandidate, PlaceSearch, ProviderError, RoutingService,
        SearchQuery,
    };
    use url::Url;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    pub async fn serve_stub(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    /// Routes straight through the requested coordinates.
    #[derive(Default)]
    pub struct EchoRouter {
        pub calls: AtomicUsize,
    }

    impl EchoRouter {
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RoutingService for EchoRouter {
        fn route(
            &self,
            coords: Vec<LngLat>,
        ) -> BoxFuture<'_, Result<Option<Vec<LngLat>>, ProviderError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(Some(coords)) })
        }
    }

    /// Names every position the same and finds one fixed place.
    pub struct FixedPlaces {
        pub label: String,
        pub place: PlaceCandidate,
    }

    impl Default for FixedPlaces {
        fn default() -> Self {
            Self {
                label: "Praça do Ferreira".to_string(),
                place: PlaceCandidate {
                    position: LatLng {
                        lat: -3.7275,
                        lng: -38.5275,
                    },
                    label: "Theatro José de Alencar".to_string(),
                },
            }
        }
    }

    impl Geocoder for FixedPlaces {
        fn reverse(&self, _at: LatLng) -> BoxFuture<'_, Result<Option<String>, ProviderError>> {
            Box::pin(async move { Ok(Some(self.label.clone())) })
        }
    }

    impl PlaceSearch for FixedPlaces {
        fn search(
            &self,
            query: SearchQuery,
        ) -> BoxFuture<'_, Result<Vec<PlaceCandidate>, ProviderError>> {
            Box::pin(async move {
                let hits = if query.text.to_lowercase().contains("theatro") {
                    vec![self.place.clone()]
                } else {
                    Vec::new()
                };
                Ok(hits)
            })
        }
    }
}
