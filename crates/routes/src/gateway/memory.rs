use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use foundation::ids::RouteId;
use tokio::sync::RwLock;

use super::rows::{
    InterestPointRow, NewInterestPointRow, NewRouteRow, RouteRow, interest_waypoints,
};
use super::{GatewayError, PersistenceGateway};
use crate::providers::BoxFuture;
use crate::record::{RouteRecord, RouteSummary, RouteWrite};
use crate::roles::Principal;
use crate::waypoint::Waypoint;

#[derive(Debug, Default)]
struct Tables {
    routes: BTreeMap<i64, RouteRow>,
    interest_points: Vec<InterestPointRow>,
    next_route_id: i64,
    next_point_id: i64,
    sessions: HashMap<String, Principal>,
}

impl Tables {
    fn insert_points(&mut self, rows: Vec<NewInterestPointRow>) {
        for row in rows {
            self.next_point_id += 1;
            self.interest_points.push(InterestPointRow {
                id: self.next_point_id,
                route_id: row.route_id,
                position: row.position,
                label: row.label,
                lat: row.lat,
                lng: row.lng,
            });
        }
    }

    fn points_of(&self, route_id: i64) -> Vec<InterestPointRow> {
        self.interest_points
            .iter()
            .filter(|p| p.route_id == route_id)
            .cloned()
            .collect()
    }
}

fn stored(id: i64, row: NewRouteRow) -> RouteRow {
    RouteRow {
        id,
        name: row.name,
        description: row.description,
        publisher_id: Some(row.publisher_id),
        start_lat: Some(row.start_lat),
        start_lng: Some(row.start_lng),
        start_label: row.start_label,
        end_lat: row.end_lat,
        end_lng: row.end_lng,
        end_label: row.end_label,
    }
}

/// Process-local backend holding the same rows the remote tables would.
///
/// Used when no backend is configured and as the test double for handlers.
/// Access tokens are registered up front with [`InMemoryGateway::with_session`].
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tables: RwLock<Tables>,
    reject_writes: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, access_token: impl Into<String>, principal: Principal) -> Self {
        self.tables
            .get_mut()
            .sessions
            .insert(access_token.into(), principal);
        self
    }

    /// Makes every subsequent write fail with [`GatewayError::Rejected`].
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), GatewayError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(GatewayError::Rejected("writes are disabled".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn route_count(&self) -> usize {
        self.tables.read().await.routes.len()
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn authenticate<'a>(
        &'a self,
        access_token: &'a str,
    ) -> BoxFuture<'a, Result<Principal, GatewayError>> {
        Box::pin(async move {
            self.tables
                .read()
                .await
                .sessions
                .get(access_token)
                .cloned()
                .ok_or(GatewayError::Unauthorized)
        })
    }

    fn save_route(&self, route: RouteWrite) -> BoxFuture<'_, Result<RouteId, GatewayError>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut t = self.tables.write().await;
            t.next_route_id += 1;
            let id = t.next_route_id;
            t.routes.insert(id, stored(id, NewRouteRow::from_write(&route)));
            t.insert_points(NewInterestPointRow::from_write(RouteId(id), &route));
            Ok(RouteId(id))
        })
    }

    fn update_route(
        &self,
        id: RouteId,
        route: RouteWrite,
    ) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut t = self.tables.write().await;
            if !t.routes.contains_key(&id.0) {
                return Err(GatewayError::NotFound(id));
            }
            t.routes.insert(id.0, stored(id.0, NewRouteRow::from_write(&route)));
            t.interest_points.retain(|p| p.route_id != id.0);
            t.insert_points(NewInterestPointRow::from_write(id, &route));
            Ok(())
        })
    }

    fn load_route(&self, id: RouteId) -> BoxFuture<'_, Result<RouteRecord, GatewayError>> {
        Box::pin(async move {
            let t = self.tables.read().await;
            let row = t.routes.get(&id.0).cloned().ok_or(GatewayError::NotFound(id))?;
            row.into_record(t.points_of(id.0))
        })
    }

    fn list_interest_points(
        &self,
        route_id: RouteId,
    ) -> BoxFuture<'_, Result<Vec<Waypoint>, GatewayError>> {
        Box::pin(async move {
            let t = self.tables.read().await;
            interest_waypoints(route_id.0, t.points_of(route_id.0))
        })
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<RouteSummary>, GatewayError>> {
        Box::pin(async move {
            let t = self.tables.read().await;
            Ok(t.routes.values().map(RouteRow::summary).collect())
        })
    }

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut t = self.tables.write().await;
            if t.routes.remove(&id.0).is_none() {
                return Err(GatewayError::NotFound(id));
            }
            t.interest_points.retain(|p| p.route_id != id.0);
            Ok(())
        })
    }
}
