use foundation::ids::PointKey;
use foundation::math::LatLng;
use serde::Serialize;

use crate::record::RouteRecord;
use crate::stops::Stops;
use crate::waypoint::Waypoint;

/// Which part of a draft a point occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "slot", content = "index", rename_all = "snake_case")]
pub enum Slot {
    Start,
    End,
    /// 0-based position in the interest sequence.
    Interest(usize),
}

impl Slot {
    /// Positional default name for unlabelled points.
    pub fn default_name(self) -> String {
        match self {
            Slot::Start => "Start Point".to_string(),
            Slot::End => "End Point".to_string(),
            Slot::Interest(i) => format!("Point #{}", i + 1),
        }
    }
}

/// One placed waypoint instance.
#[derive(Debug, Clone)]
pub struct Placed {
    pub key: PointKey,
    pub waypoint: Waypoint,
    /// Set once the author names the point; async labels no longer apply.
    renamed: bool,
}

/// Flattened view of a draft slot, in visit order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftEntry {
    pub slot: Slot,
    pub key: PointKey,
    pub name: String,
    pub waypoint: Waypoint,
}

/// In-progress route being authored: `{start, end, interest points}`.
///
/// Passive data. Which slot the next placement goes to is decided by the
/// caller (see [`crate::EditMode`]). Interest order is the visit order
/// between start and end; duplicates are allowed.
#[derive(Debug, Clone, Default)]
pub struct RouteDraft {
    next_key: u64,
    start: Option<Placed>,
    end: Option<Placed>,
    interest_points: Vec<Placed>,
}

impl RouteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft pre-filled from a persisted route (edit flow).
    pub fn from_record(record: &RouteRecord) -> Self {
        let mut draft = Self::new();
        if let Some(start) = &record.start {
            draft.set_start(start.clone());
        }
        for p in &record.interest_points {
            draft.add_interest_point(p.clone());
        }
        if let Some(end) = &record.end {
            draft.set_end(end.clone());
        }
        draft
    }

    fn place(&mut self, waypoint: Waypoint) -> Placed {
        let key = PointKey(self.next_key);
        self.next_key += 1;
        Placed {
            key,
            waypoint,
            renamed: false,
        }
    }

    pub fn set_start(&mut self, point: Waypoint) -> PointKey {
        let placed = self.place(point);
        let key = placed.key;
        self.start = Some(placed);
        key
    }

    pub fn set_end(&mut self, point: Waypoint) -> PointKey {
        let placed = self.place(point);
        let key = placed.key;
        self.end = Some(placed);
        key
    }

    pub fn add_interest_point(&mut self, point: Waypoint) -> PointKey {
        let placed = self.place(point);
        let key = placed.key;
        self.interest_points.push(placed);
        key
    }

    /// Removes the interest point at `index`; out of bounds is a no-op.
    pub fn remove_interest_point(&mut self, index: usize) -> Option<Waypoint> {
        if index >= self.interest_points.len() {
            return None;
        }
        Some(self.interest_points.remove(index).waypoint)
    }

    pub fn clear_start(&mut self) -> Option<Waypoint> {
        self.start.take().map(|p| p.waypoint)
    }

    pub fn clear_end(&mut self) -> Option<Waypoint> {
        self.end.take().map(|p| p.waypoint)
    }

    pub fn start(&self) -> Option<&Waypoint> {
        self.start.as_ref().map(|p| &p.waypoint)
    }

    pub fn end(&self) -> Option<&Waypoint> {
        self.end.as_ref().map(|p| &p.waypoint)
    }

    pub fn interest_points(&self) -> impl Iterator<Item = &Waypoint> + '_ {
        self.interest_points.iter().map(|p| &p.waypoint)
    }

    pub fn interest_len(&self) -> usize {
        self.interest_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.interest_points.is_empty()
    }

    pub fn stops(&self) -> Stops<'_> {
        Stops::new(self.start(), self.interest_points().collect(), self.end())
    }

    /// Start, interest points in order, end; absent slots skipped.
    pub fn ordered_points(&self) -> Vec<LatLng> {
        self.stops().ordered_points()
    }

    fn placed_mut(&mut self, key: PointKey) -> Option<&mut Placed> {
        self.start
            .iter_mut()
            .chain(self.interest_points.iter_mut())
            .chain(self.end.iter_mut())
            .find(|p| p.key == key)
    }

    pub fn slot_of(&self, key: PointKey) -> Option<Slot> {
        if self.start.as_ref().is_some_and(|p| p.key == key) {
            return Some(Slot::Start);
        }
        if self.end.as_ref().is_some_and(|p| p.key == key) {
            return Some(Slot::End);
        }
        self.interest_points
            .iter()
            .position(|p| p.key == key)
            .map(Slot::Interest)
    }

    /// Applies a late (async) label to the instance `key`.
    ///
    /// Returns `false` without touching anything when the instance was
    /// removed, replaced, or renamed by the author in the meantime.
    pub fn relabel(&mut self, key: PointKey, label: &str) -> bool {
        let Some(placed) = self.placed_mut(key) else {
            return false;
        };
        if placed.renamed {
            return false;
        }
        placed.waypoint = placed.waypoint.clone().with_label(label);
        true
    }

    /// Author rename. Final: later [`RouteDraft::relabel`] calls for `key` are ignored.
    pub fn rename(&mut self, key: PointKey, label: &str) -> bool {
        let Some(placed) = self.placed_mut(key) else {
            return false;
        };
        placed.waypoint = placed.waypoint.clone().with_label(label);
        placed.renamed = true;
        true
    }

    pub fn entries(&self) -> Vec<DraftEntry> {
        let mut out = Vec::with_capacity(self.interest_points.len() + 2);
        let mut push = |slot: Slot, p: &Placed| {
            out.push(DraftEntry {
                slot,
                key: p.key,
                name: p.waypoint.display_name(&slot.default_name()).to_string(),
                waypoint: p.waypoint.clone(),
            })
        };
        if let Some(p) = &self.start {
            push(Slot::Start, p);
        }
        for (i, p) in self.interest_points.iter().enumerate() {
            push(Slot::Interest(i), p);
        }
        if let Some(p) = &self.end {
            push(Slot::End, p);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{RouteDraft, Slot};
    use crate::waypoint::Waypoint;
    use foundation::math::LatLng;
    use pretty_assertions::assert_eq;

    fn wp(lat: f64, lng: f64) -> Waypoint {
        Waypoint::new(lat, lng).unwrap()
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut d = RouteDraft::new();
        for i in 0..5 {
            d.add_interest_point(wp(i as f64, 0.0));
        }
        assert_eq!(d.remove_interest_point(2), Some(wp(2.0, 0.0)));
        let lats: Vec<f64> = d.interest_points().map(|w| w.lat()).collect();
        assert_eq!(lats, vec![0.0, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn remove_out_of_bounds_is_noop() {
        let mut d = RouteDraft::new();
        d.add_interest_point(wp(1.0, 1.0));
        assert_eq!(d.remove_interest_point(1), None);
        assert_eq!(d.remove_interest_point(usize::MAX), None);
        assert_eq!(d.interest_len(), 1);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut d = RouteDraft::new();
        d.add_interest_point(wp(1.0, 1.0));
        d.add_interest_point(wp(1.0, 1.0));
        assert_eq!(d.interest_len(), 2);
    }

    #[test]
    fn start_equal_to_end_is_legal() {
        let mut d = RouteDraft::new();
        d.set_start(wp(3.0, 3.0));
        d.set_end(wp(3.0, 3.0));
        assert_eq!(d.start(), d.end());
    }

    #[test]
    fn ordered_points_visit_order() {
        let mut d = RouteDraft::new();
        d.set_end(wp(1.0, 1.0));
        d.add_interest_point(wp(0.5, 0.5));
        d.set_start(wp(0.0, 0.0));
        assert_eq!(
            d.ordered_points(),
            vec![
                LatLng { lat: 0.0, lng: 0.0 },
                LatLng { lat: 0.5, lng: 0.5 },
                LatLng { lat: 1.0, lng: 1.0 },
            ]
        );
    }

    #[test]
    fn clearing_slots_keeps_interest_points() {
        let mut d = RouteDraft::new();
        d.set_start(wp(0.0, 0.0));
        d.set_end(wp(1.0, 1.0));
        d.add_interest_point(wp(0.5, 0.5));
        assert!(d.clear_start().is_some());
        assert!(d.clear_end().is_some());
        assert!(d.clear_end().is_none());
        assert_eq!(d.interest_len(), 1);
        assert!(!d.is_empty());
    }

    #[test]
    fn positional_names() {
        let mut d = RouteDraft::new();
        d.set_start(wp(0.0, 0.0));
        d.add_interest_point(wp(0.1, 0.1));
        d.add_interest_point(wp(0.2, 0.2).with_label("Mirante"));
        d.set_end(wp(1.0, 1.0));
        let names: Vec<String> = d.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Start Point", "Point #1", "Mirante", "End Point"]);
    }

    #[test]
    fn relabel_targets_instance_not_slot() {
        let mut d = RouteDraft::new();
        let first = d.set_start(wp(0.0, 0.0));
        let second = d.set_start(wp(5.0, 5.0));
        assert!(!d.relabel(first, "Old place"));
        assert!(d.relabel(second, "New place"));
        assert_eq!(d.start().and_then(|w| w.label()), Some("New place"));
    }

    #[test]
    fn relabel_after_removal_is_discarded() {
        let mut d = RouteDraft::new();
        let key = d.add_interest_point(wp(1.0, 1.0));
        d.add_interest_point(wp(2.0, 2.0));
        d.remove_interest_point(0);
        assert!(!d.relabel(key, "Gone"));
        assert_eq!(d.interest_points().next().and_then(|w| w.label()), None);
    }

    #[test]
    fn rename_wins_over_late_relabel() {
        let mut d = RouteDraft::new();
        let key = d.add_interest_point(wp(1.0, 1.0));
        assert!(d.rename(key, "Minha praça"));
        assert!(!d.relabel(key, "Geocoded name"));
        assert_eq!(d.slot_of(key), Some(Slot::Interest(0)));
        assert_eq!(
            d.interest_points().next().and_then(|w| w.label()),
            Some("Minha praça")
        );
    }
}
