use foundation::math::{CoordinateError, LatLng};
use serde::{Deserialize, Serialize};

/// A named geographic point used to build a route.
///
/// Immutable once built: edits replace the whole value. Equality means
/// "same place" and only looks at coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WaypointRepr", into = "WaypointRepr")]
pub struct Waypoint {
    position: LatLng,
    label: Option<String>,
    id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaypointError {
    #[error("invalid waypoint: {0}")]
    Coordinate(#[from] CoordinateError),
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, WaypointError> {
        Ok(Self::at(LatLng::new(lat, lng)?))
    }

    /// Wraps an already validated position.
    pub fn at(position: LatLng) -> Self {
        Self {
            position,
            label: None,
            id: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = if label.trim().is_empty() {
            None
        } else {
            Some(label)
        };
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn lat(&self) -> f64 {
        self.position.lat
    }

    pub fn lng(&self) -> f64 {
        self.position.lng
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// The label, or the caller's positional fallback ("Point #2", ...).
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(fallback)
    }

    pub fn same_place(&self, other: &Waypoint) -> bool {
        self.position == other.position
    }
}

impl PartialEq for Waypoint {
    fn eq(&self, other: &Self) -> bool {
        self.same_place(other)
    }
}

/// Label used when no geocoder or search provider named the place.
pub fn coordinate_label(at: LatLng) -> String {
    format!("{:.6}, {:.6}", at.lat, at.lng)
}

#[derive(Serialize, Deserialize)]
struct WaypointRepr {
    lat: f64,
    lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

impl TryFrom<WaypointRepr> for Waypoint {
    type Error = WaypointError;

    fn try_from(r: WaypointRepr) -> Result<Self, Self::Error> {
        let mut wp = Waypoint::new(r.lat, r.lng)?;
        if let Some(label) = r.label {
            wp = wp.with_label(label);
        }
        wp.id = r.id;
        Ok(wp)
    }
}

impl From<Waypoint> for WaypointRepr {
    fn from(w: Waypoint) -> Self {
        WaypointRepr {
            lat: w.position.lat,
            lng: w.position.lng,
            label: w.label,
            id: w.id,
        }
    }
}
