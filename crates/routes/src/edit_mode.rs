use foundation::ids::PointKey;
use serde::{Deserialize, Serialize};

use crate::draft::RouteDraft;
use crate::waypoint::Waypoint;

/// Selects the draft slot the next chosen point goes to.
///
/// Owned by the authoring page, never persisted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Start,
    End,
    Interest,
}

impl EditMode {
    /// Dispatches a chosen point into `draft`.
    pub fn apply(self, draft: &mut RouteDraft, point: Waypoint) -> PointKey {
        match self {
            EditMode::Start => draft.set_start(point),
            EditMode::End => draft.set_end(point),
            EditMode::Interest => draft.add_interest_point(point),
        }
    }
}
