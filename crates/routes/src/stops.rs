use foundation::math::LatLng;

use crate::draft::Slot;
use crate::markers::{Marker, MarkerRole};
use crate::waypoint::Waypoint;

/// Borrowed, ordered view of a route's stops.
///
/// Both drafts and persisted records render through this, so marker tagging
/// and ordering stay identical on the edit and overview maps.
#[derive(Debug, Clone)]
pub struct Stops<'a> {
    pub start: Option<&'a Waypoint>,
    pub interest_points: Vec<&'a Waypoint>,
    pub end: Option<&'a Waypoint>,
}

impl<'a> Stops<'a> {
    pub fn new(
        start: Option<&'a Waypoint>,
        interest_points: Vec<&'a Waypoint>,
        end: Option<&'a Waypoint>,
    ) -> Self {
        Self {
            start,
            interest_points,
            end,
        }
    }

    /// Start, interest points in order, end. Absent slots are skipped.
    pub fn ordered(&self) -> Vec<&'a Waypoint> {
        self.start
            .into_iter()
            .chain(self.interest_points.iter().copied())
            .chain(self.end)
            .collect()
    }

    pub fn ordered_points(&self) -> Vec<LatLng> {
        self.ordered().into_iter().map(Waypoint::position).collect()
    }

    /// Markers in visit order: start, interests, end (only if explicit).
    pub fn markers(&self) -> Vec<Marker> {
        let mut out = Vec::with_capacity(self.interest_points.len() + 2);
        if let Some(start) = self.start {
            out.push(Marker::new(
                MarkerRole::Start,
                start,
                &Slot::Start.default_name(),
            ));
        }
        for (i, p) in self.interest_points.iter().enumerate() {
            out.push(Marker::new(
                MarkerRole::Interest,
                p,
                &Slot::Interest(i).default_name(),
            ));
        }
        if let Some(end) = self.end {
            out.push(Marker::new(MarkerRole::End, end, &Slot::End.default_name()));
        }
        out
    }
}
