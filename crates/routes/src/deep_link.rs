//! Hand-off to an external map application (Google Maps directions URL).

use foundation::math::LatLng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::stops::Stops;

pub const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl std::str::FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" => Ok(TravelMode::Driving),
            "walking" => Ok(TravelMode::Walking),
            "bicycling" => Ok(TravelMode::Bicycling),
            "transit" => Ok(TravelMode::Transit),
            other => Err(format!("unknown travel mode: {other}")),
        }
    }
}

fn pair(p: LatLng) -> String {
    format!("{},{}", p.lat, p.lng)
}

/// Directions link for `stops`: origin = start, destination = end or the
/// start again (round trip), waypoints = interest points joined by `|`.
///
/// `None` when there is no start point.
pub fn directions_url(stops: &Stops<'_>, mode: Option<TravelMode>) -> Option<Url> {
    let origin = stops.start?.position();
    let destination = stops.end.map(|e| e.position()).unwrap_or(origin);

    let mut url = Url::parse(DIRECTIONS_BASE).ok()?;
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("api", "1");
        q.append_pair("origin", &pair(origin));
        q.append_pair("destination", &pair(destination));
        if !stops.interest_points.is_empty() {
            let waypoints = stops
                .interest_points
                .iter()
                .map(|p| pair(p.position()))
                .collect::<Vec<_>>()
                .join("|");
            q.append_pair("waypoints", &waypoints);
        }
        if let Some(mode) = mode {
            q.append_pair("travelmode", mode.as_str());
        }
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{TravelMode, directions_url};
    use crate::draft::RouteDraft;
    use crate::waypoint::Waypoint;

    fn params(url: &url::Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn origin_destination_and_waypoints() {
        let mut d = RouteDraft::new();
        d.set_start(Waypoint::new(10.0, 20.0).unwrap());
        d.set_end(Waypoint::new(30.0, 40.0).unwrap());
        d.add_interest_point(Waypoint::new(15.0, 25.0).unwrap());

        let url = directions_url(&d.stops(), None).unwrap();
        let q = params(&url);
        assert_eq!(url.host_str(), Some("www.google.com"));
        assert_eq!(q["api"], "1");
        assert_eq!(q["origin"], "10,20");
        assert_eq!(q["destination"], "30,40");
        assert_eq!(q["waypoints"], "15,25");
        assert!(!q.contains_key("travelmode"));
    }

    #[test]
    fn missing_end_returns_to_origin() {
        let mut d = RouteDraft::new();
        d.set_start(Waypoint::new(10.0, 20.0).unwrap());
        let q = params(&directions_url(&d.stops(), None).unwrap());
        assert_eq!(q["origin"], "10,20");
        assert_eq!(q["destination"], "10,20");
        assert!(!q.contains_key("waypoints"));
    }

    #[test]
    fn waypoints_are_pipe_separated_in_order() {
        let mut d = RouteDraft::new();
        d.set_start(Waypoint::new(0.0, 0.0).unwrap());
        d.add_interest_point(Waypoint::new(1.5, 2.5).unwrap());
        d.add_interest_point(Waypoint::new(-3.25, 4.0).unwrap());
        let url = directions_url(&d.stops(), Some(TravelMode::Walking)).unwrap();
        let q = params(&url);
        assert_eq!(q["waypoints"], "1.5,2.5|-3.25,4");
        assert_eq!(q["travelmode"], "walking");
    }

    #[test]
    fn no_start_no_link() {
        let mut d = RouteDraft::new();
        d.set_end(Waypoint::new(1.0, 1.0).unwrap());
        assert!(directions_url(&d.stops(), None).is_none());
    }

    #[test]
    fn travel_mode_parsing() {
        assert_eq!("Driving".parse::<TravelMode>(), Ok(TravelMode::Driving));
        assert!("flying".parse::<TravelMode>().is_err());
    }
}
