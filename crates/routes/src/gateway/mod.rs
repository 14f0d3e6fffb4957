//! Boundary to the backend's table, auth and storage services.
//!
//! The backend is an external collaborator. Everything crossing this boundary
//! is a typed row ([`rows`]) validated on the way in; nothing untyped reaches
//! the rest of the crate.

pub mod memory;
pub mod rows;

use foundation::ids::RouteId;

use crate::providers::BoxFuture;
use crate::record::{RouteRecord, RouteSummary, RouteWrite};
use crate::roles::Principal;
use crate::waypoint::Waypoint;

pub use memory::InMemoryGateway;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("route {0} not found")]
    NotFound(RouteId),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("unexpected backend data: {0}")]
    InvalidShape(String),
}

/// Read, write and authenticate capabilities over the backend.
///
/// Constructed once at startup and shared as `Arc<dyn PersistenceGateway>`.
/// Failures are never retried here; callers surface them.
pub trait PersistenceGateway: Send + Sync {
    fn authenticate<'a>(&'a self, access_token: &'a str)
    -> BoxFuture<'a, Result<Principal, GatewayError>>;

    /// Inserts the route row, then its interest points in visit order.
    fn save_route(&self, route: RouteWrite) -> BoxFuture<'_, Result<RouteId, GatewayError>>;

    /// Rewrites the route row and replaces its interest points.
    fn update_route(
        &self,
        id: RouteId,
        route: RouteWrite,
    ) -> BoxFuture<'_, Result<(), GatewayError>>;

    fn load_route(&self, id: RouteId) -> BoxFuture<'_, Result<RouteRecord, GatewayError>>;

    /// Interest points of `route_id` ordered by stored position.
    fn list_interest_points(
        &self,
        route_id: RouteId,
    ) -> BoxFuture<'_, Result<Vec<Waypoint>, GatewayError>>;

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<RouteSummary>, GatewayError>>;

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), GatewayError>>;
}
