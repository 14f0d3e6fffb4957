use foundation::math::LatLng;
use serde::Serialize;

use crate::waypoint::Waypoint;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    Start,
    End,
    Interest,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: [f32; 4],
    /// Draw order; higher wins on overlap.
    pub z_index: i32,
}

impl MarkerStyle {
    pub const fn new(color: [f32; 4], z_index: i32) -> Self {
        Self { color, z_index }
    }
}

impl MarkerRole {
    pub fn style(self) -> MarkerStyle {
        match self {
            MarkerRole::Start => MarkerStyle::new([0.13, 0.65, 0.30, 1.0], 3),
            MarkerRole::End => MarkerStyle::new([0.85, 0.18, 0.16, 1.0], 2),
            MarkerRole::Interest => MarkerStyle::new([0.16, 0.42, 0.86, 1.0], 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub role: MarkerRole,
    pub position: LatLng,
    pub label: String,
    pub style: MarkerStyle,
}

impl Marker {
    pub fn new(role: MarkerRole, point: &Waypoint, fallback: &str) -> Self {
        Self {
            role,
            position: point.position(),
            label: point.display_name(fallback).to_string(),
            style: role.style(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerRole;
    use crate::stops::Stops;
    use crate::waypoint::Waypoint;

    #[test]
    fn tags_start_interest_end() {
        let s = Waypoint::new(0.0, 0.0).unwrap();
        let a = Waypoint::new(0.2, 0.2).unwrap().with_label("Catedral");
        let b = Waypoint::new(0.4, 0.4).unwrap();
        let e = Waypoint::new(1.0, 1.0).unwrap();
        let markers = Stops::new(Some(&s), vec![&a, &b], Some(&e)).markers();

        let roles: Vec<MarkerRole> = markers.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MarkerRole::Start,
                MarkerRole::Interest,
                MarkerRole::Interest,
                MarkerRole::End
            ]
        );
        assert_eq!(markers[1].label, "Catedral");
        assert_eq!(markers[2].label, "Point #2");
    }

    #[test]
    fn no_end_marker_without_explicit_end() {
        let s = Waypoint::new(0.0, 0.0).unwrap();
        let a = Waypoint::new(0.2, 0.2).unwrap();
        let markers = Stops::new(Some(&s), vec![&a], None).markers();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers.last().map(|m| m.role), Some(MarkerRole::Interest));
    }

    #[test]
    fn styles_are_distinguishable() {
        assert_ne!(MarkerRole::Start.style(), MarkerRole::End.style());
        assert_ne!(MarkerRole::Interest.style(), MarkerRole::End.style());
    }
}
