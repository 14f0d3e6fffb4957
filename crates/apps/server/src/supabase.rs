//! [`PersistenceGateway`] over a Supabase project (PostgREST tables + GoTrue auth).
//!
//! Table calls carry the configured project key; callers are authenticated
//! separately through `/auth/v1/user` and their role read from `profiles`.

use bytes::Bytes;
use foundation::ids::RouteId;
use futures_util::future::try_join;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use routes::gateway::rows::{
    decode, interest_waypoints, InterestPointRow, NewInterestPointRow, NewRouteRow, ProfileRow,
    RouteRow,
};
use routes::gateway::{GatewayError, PersistenceGateway};
use routes::{BoxFuture, Principal, RouteRecord, RouteSummary, RouteWrite, Waypoint};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::fetch::endpoint;

const ROUTES: &str = "routes";
const INTEREST_POINTS: &str = "interest_points";
const PROFILES: &str = "profiles";

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

pub struct SupabaseGateway {
    client: reqwest::Client,
    base: Url,
    api_key: String,
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

impl SupabaseGateway {
    pub fn new(client: reqwest::Client, base: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base,
            api_key: api_key.into(),
        }
    }

    /// `/rest/v1/{table}` with PostgREST filters such as `("id", "eq.7")`.
    pub fn table_url(&self, table: &str, filters: &[(&str, String)]) -> Url {
        let mut url = endpoint(&self.base, &format!("rest/v1/{table}"));
        if !filters.is_empty() {
            let mut q = url.query_pairs_mut();
            for (key, value) in filters {
                q.append_pair(key, value);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    fn table(&self, method: Method, table: &str, filters: &[(&str, String)]) -> RequestBuilder {
        self.request(method, self.table_url(table, filters), &self.api_key)
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, GatewayError> {
        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        let body: Bytes = resp.bytes().await.map_err(transport)?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }
        if !status.is_success() {
            let detail = String::from_utf8_lossy(&body);
            return Err(GatewayError::Rejected(format!("{status}: {detail}")));
        }
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::InvalidShape(e.to_string()))?;
        decode(value)
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let req = self
            .table(Method::POST, table, &[])
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        self.send(req).await
    }

    async fn fetch_route_row(&self, id: RouteId) -> Result<RouteRow, GatewayError> {
        let rows: Vec<RouteRow> = self
            .send(self.table(Method::GET, ROUTES, &[("id", format!("eq.{id}"))]))
            .await?;
        rows.into_iter().next().ok_or(GatewayError::NotFound(id))
    }

    async fn fetch_point_rows(&self, id: RouteId) -> Result<Vec<InterestPointRow>, GatewayError> {
        let filters = [
            ("route_id", format!("eq.{id}")),
            ("order", "position.asc".to_string()),
        ];
        self.send(self.table(Method::GET, INTEREST_POINTS, &filters))
            .await
    }

    async fn insert_points(
        &self,
        id: RouteId,
        route: &RouteWrite,
    ) -> Result<Vec<InterestPointRow>, GatewayError> {
        let rows = NewInterestPointRow::from_write(id, route);
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.insert(INTEREST_POINTS, &rows).await
    }

    async fn delete_point_rows(&self, rows: &[InterestPointRow]) -> Result<(), GatewayError> {
        if rows.is_empty() {
            return Ok(());
        }
        let ids = rows
            .iter()
            .map(|row| row.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let _: Vec<InterestPointRow> = self
            .send(self.table(
                Method::DELETE,
                INTEREST_POINTS,
                &[("id", format!("in.({ids})"))],
            ))
            .await?;
        Ok(())
    }

    async fn patch_route<B: Serialize>(&self, id: RouteId, body: &B) -> Result<(), GatewayError> {
        let req = self
            .table(Method::PATCH, ROUTES, &[("id", format!("eq.{id}"))])
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        let updated: Vec<RouteRow> = self.send(req).await?;
        if updated.is_empty() {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }

    /// Writes the new stop list before dropping the old one, so a rejected
    /// insert leaves the stored stops in place.
    async fn swap_points(
        &self,
        id: RouteId,
        route: &RouteWrite,
        old: &[InterestPointRow],
    ) -> Result<(), GatewayError> {
        let inserted = self.insert_points(id, route).await?;
        if let Err(err) = self.delete_point_rows(old).await {
            if let Err(cleanup) = self.delete_point_rows(&inserted).await {
                warn!(route = %id, "new interest points left behind: {cleanup}");
            }
            return Err(err);
        }
        Ok(())
    }

    async fn delete_points(&self, id: RouteId) -> Result<(), GatewayError> {
        let _: Vec<InterestPointRow> = self
            .send(self.table(
                Method::DELETE,
                INTEREST_POINTS,
                &[("route_id", format!("eq.{id}"))],
            ))
            .await?;
        Ok(())
    }

    async fn whoami(&self, access_token: &str) -> Result<Principal, GatewayError> {
        let url = endpoint(&self.base, "auth/v1/user");
        let user: AuthUser = self
            .send(self.request(Method::GET, url, access_token))
            .await?;

        let profiles: Vec<ProfileRow> = self
            .send(self.request(
                Method::GET,
                self.table_url(PROFILES, &[("id", format!("eq.{}", user.id))]),
                access_token,
            ))
            .await?;
        let profile = profiles.into_iter().next().ok_or_else(|| {
            GatewayError::InvalidShape(format!("user {} has no profile", user.id))
        })?;
        Ok(Principal {
            user_id: user.id,
            role: profile.role,
        })
    }

    async fn create(&self, route: RouteWrite) -> Result<RouteId, GatewayError> {
        let created: Vec<RouteRow> = self
            .insert(ROUTES, &NewRouteRow::from_write(&route))
            .await?;
        let id = created
            .first()
            .map(|row| RouteId(row.id))
            .ok_or_else(|| GatewayError::InvalidShape("insert returned no route".into()))?;

        if let Err(err) = self.insert_points(id, &route).await {
            warn!(route = %id, "interest points rejected, removing route row: {err}");
            if let Err(cleanup) = self.remove(id).await {
                warn!(route = %id, "cleanup failed: {cleanup}");
            }
            return Err(err);
        }
        info!(route = %id, points = route.interest_points.len(), "route saved");
        Ok(id)
    }

    async fn replace(&self, id: RouteId, route: RouteWrite) -> Result<(), GatewayError> {
        let (previous, old_points) =
            try_join(self.fetch_route_row(id), self.fetch_point_rows(id)).await?;
        self.patch_route(id, &NewRouteRow::from_write(&route)).await?;

        if let Err(err) = self.swap_points(id, &route, &old_points).await {
            warn!(route = %id, "interest points rejected, restoring route row: {err}");
            if let Err(restore) = self.patch_route(id, &previous).await {
                warn!(route = %id, "restore failed: {restore}");
            }
            return Err(err);
        }
        info!(route = %id, points = route.interest_points.len(), "route updated");
        Ok(())
    }

    async fn fetch_record(&self, id: RouteId) -> Result<RouteRecord, GatewayError> {
        let (row, points) = try_join(self.fetch_route_row(id), self.fetch_point_rows(id)).await?;
        row.into_record(points)
    }

    async fn fetch_points(&self, id: RouteId) -> Result<Vec<Waypoint>, GatewayError> {
        interest_waypoints(id.0, self.fetch_point_rows(id).await?)
    }

    async fn fetch_summaries(&self) -> Result<Vec<RouteSummary>, GatewayError> {
        let filters = [("order", "id.asc".to_string())];
        let rows: Vec<RouteRow> = self.send(self.table(Method::GET, ROUTES, &filters)).await?;
        Ok(rows.iter().map(RouteRow::summary).collect())
    }

    async fn remove(&self, id: RouteId) -> Result<(), GatewayError> {
        self.delete_points(id).await?;
        let deleted: Vec<RouteRow> = self
            .send(self.table(Method::DELETE, ROUTES, &[("id", format!("eq.{id}"))]))
            .await?;
        if deleted.is_empty() {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }
}

impl PersistenceGateway for SupabaseGateway {
    fn authenticate<'a>(
        &'a self,
        access_token: &'a str,
    ) -> BoxFuture<'a, Result<Principal, GatewayError>> {
        Box::pin(self.whoami(access_token))
    }

    fn save_route(&self, route: RouteWrite) -> BoxFuture<'_, Result<RouteId, GatewayError>> {
        Box::pin(self.create(route))
    }

    fn update_route(
        &self,
        id: RouteId,
        route: RouteWrite,
    ) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(self.replace(id, route))
    }

    fn load_route(&self, id: RouteId) -> BoxFuture<'_, Result<RouteRecord, GatewayError>> {
        Box::pin(self.fetch_record(id))
    }

    fn list_interest_points(
        &self,
        route_id: RouteId,
    ) -> BoxFuture<'_, Result<Vec<Waypoint>, GatewayError>> {
        Box::pin(self.fetch_points(route_id))
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<RouteSummary>, GatewayError>> {
        Box::pin(self.fetch_summaries())
    }

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(self.remove(id))
    }
}
