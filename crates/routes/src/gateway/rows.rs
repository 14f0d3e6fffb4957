//! Backend table rows and their validation.
//!
//! Tables: `routes` (one row per route, start/end stored inline) and
//! `interest_points` (one row per stop, ordered by `position`). Role lookups
//! read `profiles`.

use foundation::ids::RouteId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::record::{RouteDetails, RouteRecord, RouteSummary, RouteWrite};
use crate::roles::Role;
use crate::waypoint::Waypoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publisher_id: Option<String>,
    #[serde(default)]
    pub start_lat: Option<f64>,
    #[serde(default)]
    pub start_lng: Option<f64>,
    #[serde(default)]
    pub start_label: Option<String>,
    #[serde(default)]
    pub end_lat: Option<f64>,
    #[serde(default)]
    pub end_lng: Option<f64>,
    #[serde(default)]
    pub end_label: Option<String>,
}

/// Insert/update body for `routes`; the backend assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRouteRow {
    pub name: String,
    pub description: Option<String>,
    pub publisher_id: String,
    pub start_lat: f64,
    pub start_lng: f64,
    pub start_label: Option<String>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    pub end_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestPointRow {
    pub id: i64,
    pub route_id: i64,
    pub position: i32,
    #[serde(default)]
    pub label: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInterestPointRow {
    pub route_id: i64,
    pub position: i32,
    pub label: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub role: Role,
}

/// Decodes an arbitrary backend payload into `T`, failing fast on shape errors.
pub fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::InvalidShape(e.to_string()))
}

fn stop(
    what: &str,
    lat: Option<f64>,
    lng: Option<f64>,
    label: Option<String>,
) -> Result<Option<Waypoint>, GatewayError> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let wp = Waypoint::new(lat, lng)
                .map_err(|e| GatewayError::InvalidShape(format!("{what}: {e}")))?;
            Ok(Some(match label {
                Some(l) => wp.with_label(l),
                None => wp,
            }))
        }
        _ => Err(GatewayError::InvalidShape(format!(
            "{what}: latitude and longitude must both be set"
        ))),
    }
}

impl RouteRow {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            id: RouteId(self.id),
            name: self.name.clone(),
            description: self.description.clone(),
            publisher_id: self.publisher_id.clone(),
        }
    }

    /// Validates the row and its points into a [`RouteRecord`].
    ///
    /// Points belonging to other routes are rejected; the rest are ordered by
    /// `position`.
    pub fn into_record(self, points: Vec<InterestPointRow>) -> Result<RouteRecord, GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidShape(format!(
                "route {}: empty name",
                self.id
            )));
        }
        let start = stop("start", self.start_lat, self.start_lng, self.start_label)?;
        let end = stop("end", self.end_lat, self.end_lng, self.end_label)?;
        let interest_points = interest_waypoints(self.id, points)?;

        Ok(RouteRecord {
            id: RouteId(self.id),
            details: RouteDetails {
                name: self.name,
                description: self.description,
            },
            publisher_id: self.publisher_id,
            start,
            end,
            interest_points,
        })
    }
}

/// Orders and validates the interest point rows of `route_id`.
pub fn interest_waypoints(
    route_id: i64,
    mut points: Vec<InterestPointRow>,
) -> Result<Vec<Waypoint>, GatewayError> {
    if let Some(stray) = points.iter().find(|p| p.route_id != route_id) {
        return Err(GatewayError::InvalidShape(format!(
            "interest point {} belongs to route {}, expected {route_id}",
            stray.id, stray.route_id
        )));
    }
    points.sort_by_key(|p| (p.position, p.id));
    points.into_iter().map(InterestPointRow::into_waypoint).collect()
}

impl InterestPointRow {
    pub fn into_waypoint(self) -> Result<Waypoint, GatewayError> {
        let wp = stop(
            &format!("interest point {}", self.id),
            Some(self.lat),
            Some(self.lng),
            self.label,
        )?
        .ok_or_else(|| GatewayError::InvalidShape("interest point without position".into()))?;
        Ok(wp.with_id(self.id))
    }
}

impl NewRouteRow {
    pub fn from_write(route: &RouteWrite) -> Self {
        Self {
            name: route.details.name.clone(),
            description: route.details.description.clone(),
            publisher_id: route.publisher_id.clone(),
            start_lat: route.start.lat(),
            start_lng: route.start.lng(),
            start_label: route.start.label().map(str::to_string),
            end_lat: route.end.as_ref().map(Waypoint::lat),
            end_lng: route.end.as_ref().map(Waypoint::lng),
            end_label: route
                .end
                .as_ref()
                .and_then(|e| e.label())
                .map(str::to_string),
        }
    }
}

impl NewInterestPointRow {
    /// One row per interest point; `position` is the 0-based visit order.
    pub fn from_write(route_id: RouteId, route: &RouteWrite) -> Vec<Self> {
        route
            .interest_points
            .iter()
            .enumerate()
            .map(|(i, p)| Self {
                route_id: route_id.0,
                position: i as i32,
                label: p.label().map(str::to_string),
                lat: p.lat(),
                lng: p.lng(),
            })
            .collect()
    }
}
