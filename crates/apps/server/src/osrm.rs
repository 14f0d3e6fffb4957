//! Routing over an OSRM HTTP endpoint.

use foundation::math::LngLat;
use routes::{BoxFuture, ProviderError, RoutingService};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::fetch::{decode, endpoint, transport};

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    geometry: LineString,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

pub struct OsrmRouter {
    client: reqwest::Client,
    base: Url,
    profile: String,
}

impl OsrmRouter {
    pub fn new(client: reqwest::Client, base: Url, profile: impl Into<String>) -> Self {
        Self {
            client,
            base,
            profile: profile.into(),
        }
    }

    /// `{base}/route/v1/{profile}/{lng,lat;...}?overview=full&geometries=geojson`
    pub fn route_url(&self, coords: &[LngLat]) -> Url {
        let path = coords
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        let mut url = endpoint(&self.base, &format!("route/v1/{}/{path}", self.profile));
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        url
    }

    async fn fetch(&self, coords: Vec<LngLat>) -> Result<Option<Vec<LngLat>>, ProviderError> {
        let resp = self
            .client
            .get(self.route_url(&coords))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        // OSRM reports unroutable input as 400 with a JSON `code`.
        if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
            return Err(ProviderError::Status(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(transport)?;
        let parsed: RouteResponse = decode(&body)?;

        match parsed.code.as_str() {
            "Ok" => Ok(parsed
                .routes
                .into_iter()
                .next()
                .map(|r| r.geometry.coordinates.into_iter().map(LngLat::from).collect())),
            "NoRoute" | "NoSegment" => {
                debug!(code = %parsed.code, "no route between waypoints");
                Ok(None)
            }
            other => Err(ProviderError::Malformed(format!(
                "{other}: {}",
                parsed.message.unwrap_or_default()
            ))),
        }
    }
}

impl RoutingService for OsrmRouter {
    fn route(
        &self,
        coords: Vec<LngLat>,
    ) -> BoxFuture<'_, Result<Option<Vec<LngLat>>, ProviderError>> {
        Box::pin(self.fetch(coords))
    }
}
