use foundation::ids::RouteId;
use serde::{Deserialize, Serialize};

use crate::draft::RouteDraft;
use crate::stops::Stops;
use crate::waypoint::Waypoint;

/// Author-supplied metadata saved alongside the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetails {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteWriteError {
    #[error("route name must not be empty")]
    EmptyName,
    #[error("route needs a start point")]
    MissingStart,
}

/// Everything the gateway needs to persist one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteWrite {
    pub details: RouteDetails,
    pub publisher_id: String,
    pub start: Waypoint,
    pub end: Option<Waypoint>,
    pub interest_points: Vec<Waypoint>,
}

impl RouteWrite {
    pub fn from_draft(
        details: RouteDetails,
        draft: &RouteDraft,
        publisher_id: impl Into<String>,
    ) -> Result<Self, RouteWriteError> {
        let name = details.name.trim();
        if name.is_empty() {
            return Err(RouteWriteError::EmptyName);
        }
        let start = draft.start().cloned().ok_or(RouteWriteError::MissingStart)?;
        Ok(Self {
            details: RouteDetails {
                name: name.to_string(),
                description: details
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
            },
            publisher_id: publisher_id.into(),
            start,
            end: draft.end().cloned(),
            interest_points: draft.interest_points().cloned().collect(),
        })
    }
}

/// A persisted route as read back from the backend.
///
/// Interest points carry their own backend identity and are ordered by their
/// stored position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: RouteId,
    #[serde(flatten)]
    pub details: RouteDetails,
    pub publisher_id: Option<String>,
    pub start: Option<Waypoint>,
    pub end: Option<Waypoint>,
    pub interest_points: Vec<Waypoint>,
}

impl RouteRecord {
    pub fn stops(&self) -> Stops<'_> {
        Stops::new(
            self.start.as_ref(),
            self.interest_points.iter().collect(),
            self.end.as_ref(),
        )
    }
}

/// Browse-list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub id: RouteId,
    pub name: String,
    pub description: Option<String>,
    pub publisher_id: Option<String>,
}
