//! External lookup collaborators: routing, reverse geocoding, place search.
//!
//! Implementations live at the edge (HTTP adapters in the server app, stubs in
//! tests). Methods return boxed futures so the traits stay dyn-compatible and
//! can be shared as `Arc<dyn ...>`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use foundation::math::{LatLng, LngLat};
use serde::{Deserialize, Serialize};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default bound on every external lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider answered with status {0}")]
    Status(u16),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
}

/// Computes a path through an ordered list of coordinates.
///
/// Speaks the provider's axis order: input and output are longitude first.
/// `Ok(None)` means the provider found no route.
pub trait RoutingService: Send + Sync {
    fn route(
        &self,
        coords: Vec<LngLat>,
    ) -> BoxFuture<'_, Result<Option<Vec<LngLat>>, ProviderError>>;
}

/// Reverse geocoding: position to a free-text place label.
pub trait Geocoder: Send + Sync {
    fn reverse(&self, at: LatLng) -> BoxFuture<'_, Result<Option<String>, ProviderError>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    /// Comma-separated ISO country codes restricting results, e.g. `"br"`.
    pub region: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub position: LatLng,
    pub label: String,
}

/// Forward search: free text to candidate places.
pub trait PlaceSearch: Send + Sync {
    fn search(
        &self,
        query: SearchQuery,
    ) -> BoxFuture<'_, Result<Vec<PlaceCandidate>, ProviderError>>;
}

/// Bounds `fut` by `limit`.
pub async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

#[cfg(test)]
pub(crate) mod stubs {
    //! Recording stubs shared by the crate's tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use foundation::math::{LatLng, LngLat};

    use super::{
        BoxFuture, Geocoder, PlaceCandidate, PlaceSearch, ProviderError, RoutingService,
        SearchQuery,
    };

    /// Echoes the requested coordinates back as the path, or a canned answer.
    #[derive(Default)]
    pub struct StubRouter {
        pub calls: Mutex<Vec<Vec<LngLat>>>,
        pub answer: Mutex<Option<Result<Option<Vec<LngLat>>, ProviderError>>>,
        pub delay: Option<Duration>,
    }

    impl StubRouter {
        pub fn returning(answer: Result<Option<Vec<LngLat>>, ProviderError>) -> Self {
            Self {
                answer: Mutex::new(Some(answer)),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl RoutingService for StubRouter {
        fn route(
            &self,
            coords: Vec<LngLat>,
        ) -> BoxFuture<'_, Result<Option<Vec<LngLat>>, ProviderError>> {
            self.calls.lock().unwrap().push(coords.clone());
            let answer = self.answer.lock().unwrap().clone();
            let delay = self.delay;
            Box::pin(async move {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                answer.unwrap_or(Ok(Some(coords)))
            })
        }
    }

    pub struct StubGeocoder {
        pub answer: Result<Option<String>, ProviderError>,
        pub calls: AtomicUsize,
    }

    impl StubGeocoder {
        pub fn new(answer: Result<Option<String>, ProviderError>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Geocoder for StubGeocoder {
        fn reverse(&self, _at: LatLng) -> BoxFuture<'_, Result<Option<String>, ProviderError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self.answer.clone();
            Box::pin(async move { answer })
        }
    }

    pub struct StubSearch {
        pub answer: Result<Vec<PlaceCandidate>, ProviderError>,
        pub queries: Mutex<Vec<SearchQuery>>,
    }

    impl StubSearch {
        pub fn new(answer: Result<Vec<PlaceCandidate>, ProviderError>) -> Self {
            Self {
                answer,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl PlaceSearch for StubSearch {
        fn search(
            &self,
            query: SearchQuery,
        ) -> BoxFuture<'_, Result<Vec<PlaceCandidate>, ProviderError>> {
            self.queries.lock().unwrap().push(query);
            let answer = self.answer.clone();
            Box::pin(async move { answer })
        }
    }
}
