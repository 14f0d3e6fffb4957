//! Reverse geocoding and place search against a Nominatim instance.

use foundation::math::LatLng;
use routes::{BoxFuture, Geocoder, PlaceCandidate, PlaceSearch, ProviderError, SearchQuery};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::fetch::{endpoint, get_json};

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    /// Set instead of a result when nothing is near the position.
    #[serde(default)]
    error: Option<String>,
}

/// Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

impl SearchHit {
    fn into_candidate(self) -> Result<PlaceCandidate, ProviderError> {
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| ProviderError::Malformed(format!("coordinate {s:?}: {e}")))
        };
        let position = LatLng::new(parse(&self.lat)?, parse(&self.lon)?)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(PlaceCandidate {
            position,
            label: self.display_name,
        })
    }
}

pub struct Nominatim {
    client: reqwest::Client,
    base: Url,
}

impl Nominatim {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn reverse_url(&self, at: LatLng) -> Url {
        let mut url = endpoint(&self.base, "reverse");
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &at.lat.to_string())
            .append_pair("lon", &at.lng.to_string());
        url
    }

    pub fn search_url(&self, query: &SearchQuery) -> Url {
        let mut url = endpoint(&self.base, "search");
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("format", "jsonv2")
                .append_pair("q", &query.text)
                .append_pair("limit", &query.limit.to_string());
            if let Some(region) = &query.region {
                q.append_pair("countrycodes", region);
            }
        }
        url
    }

    async fn fetch_label(&self, at: LatLng) -> Result<Option<String>, ProviderError> {
        let resp: ReverseResponse = get_json(&self.client, self.reverse_url(at)).await?;
        if resp.error.is_some() {
            return Ok(None);
        }
        Ok(resp.display_name.filter(|name| !name.trim().is_empty()))
    }

    async fn fetch_candidates(
        &self,
        query: SearchQuery,
    ) -> Result<Vec<PlaceCandidate>, ProviderError> {
        let hits: Vec<SearchHit> = get_json(&self.client, self.search_url(&query)).await?;
        let candidates = hits
            .into_iter()
            .filter_map(|hit| match hit.into_candidate() {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    warn!("skipping search hit: {err}");
                    None
                }
            })
            .take(query.limit)
            .collect();
        Ok(candidates)
    }
}

impl Geocoder for Nominatim {
    fn reverse(&self, at: LatLng) -> BoxFuture<'_, Result<Option<String>, ProviderError>> {
        Box::pin(self.fetch_label(at))
    }
}

impl PlaceSearch for Nominatim {
    fn search(
        &self,
        query: SearchQuery,
    ) -> BoxFuture<'_, Result<Vec<PlaceCandidate>, ProviderError>> {
        Box::pin(self.fetch_candidates(query))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use foundation::math::LatLng;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use routes::{
        Geocoder, MapEditSurface, PlaceSearch, ProviderError, SearchQuery, SurfaceConfig,
    };
    use serde_json::json;
    use url::Url;

    use super::Nominatim;
    use crate::test_support::serve_stub;

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    fn stub_app(seen: Seen) -> Router {
        let rev = seen.clone();
        Router::new()
            .route(
                "/reverse",
                get(move |Query(q): Query<HashMap<String, String>>| {
                    let rev = rev.clone();
                    async move {
                        let far_away = q.get("lat").map(String::as_str) == Some("0");
                        rev.lock().push(q);
                        if far_away {
                            Json(json!({ "error": "Unable to geocode" }))
                        } else {
                            Json(json!({ "display_name": "Praça da Sé, São Paulo" }))
                        }
                    }
                }),
            )
            .route(
                "/search",
                get(move |Query(q): Query<HashMap<String, String>>| {
                    let seen = seen.clone();
                    async move {
                        let broken = q.get("q").map(String::as_str) == Some("broken");
                        seen.lock().push(q);
                        if broken {
                            return Json(json!([
                                { "lat": "", "lon": "-38.5", "display_name": "Sem coordenada" },
                                { "lat": "95.0", "lon": "-38.5", "display_name": "Fora do mapa" },
                                {
                                "lat": "-3.7319",
                                "lon": "-38.5267",
                                "display_name": "Fortaleza"
                            }
                            ]));
                        }
                        Json(json!([
                            { "lat": "-23.5505", "lon": "-46.6333", "display_name": "São Paulo" },
                            {
                                "lat": "-22.9068",
                                "lon": "-43.1729",
                                "display_name": "Rio de Janeiro"
                            }
                        ]))
                    }
                }),
            )
    }

    #[tokio::test]
    async fn reverse_returns_display_name() {
        let seen = Seen::default();
        let base = serve_stub(stub_app(seen.clone())).await;
        let geo = Nominatim::new(reqwest::Client::new(), base);

        let label = geo.reverse(LatLng { lat: -23.55, lng: -46.63 }).await;
        assert_eq!(label, Ok(Some("Praça da Sé, São Paulo".to_string())));
        assert_eq!(geo.reverse(LatLng { lat: 0.0, lng: 0.0 }).await, Ok(None));

        let seen = seen.lock();
        assert_eq!(seen[0].get("format").map(String::as_str), Some("jsonv2"));
        assert_eq!(seen[0].get("lon").map(String::as_str), Some("-46.63"));
    }

    #[tokio::test]
    async fn search_sends_region_and_limit() {
        let seen = Seen::default();
        let base = serve_stub(stub_app(seen.clone())).await;
        let geo = Nominatim::new(reqwest::Client::new(), base);

        let found = geo
            .search(SearchQuery {
                text: "são paulo".to_string(),
                region: Some("br".to_string()),
                limit: 1,
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "São Paulo");
        assert_eq!(found[0].position, LatLng { lat: -23.5505, lng: -46.6333 });
        let seen = seen.lock();
        assert_eq!(seen[0].get("q").map(String::as_str), Some("são paulo"));
        assert_eq!(seen[0].get("countrycodes").map(String::as_str), Some("br"));
        assert_eq!(seen[0].get("limit").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn unusable_hits_are_skipped() {
        let base = serve_stub(stub_app(Seen::default())).await;
        let geo = Nominatim::new(reqwest::Client::new(), base);

        let found = geo
            .search(SearchQuery {
                text: "broken".to_string(),
                region: None,
                limit: 5,
            })
            .await
            .unwrap();

        let labels: Vec<&str> = found.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Fortaleza"]);
    }

    #[tokio::test]
    async fn unreachable_provider_degrades_to_coordinate_label() {
        // Nothing listens on the discard port.
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let geo = Arc::new(Nominatim::new(reqwest::Client::new(), base));
        assert!(matches!(
            geo.reverse(LatLng { lat: 1.0, lng: 1.0 }).await,
            Err(ProviderError::Transport(_))
        ));

        let surface = MapEditSurface::new(
            geo.clone(),
            geo,
            SurfaceConfig {
                lookup_timeout: Duration::from_secs(2),
                ..SurfaceConfig::default()
            },
        );
        let lookups = surface.lookups().clone();
        assert_eq!(lookups.label_for(LatLng { lat: 1.0, lng: 1.0 }).await, None);
        assert!(lookups.search("anything").await.is_empty());
    }

    #[test]
    fn bad_coordinates_are_malformed() {
        let hit = super::SearchHit {
            lat: "north".to_string(),
            lon: "1".to_string(),
            display_name: "x".to_string(),
        };
        assert!(matches!(hit.into_candidate(), Err(ProviderError::Malformed(_))));
    }
}
