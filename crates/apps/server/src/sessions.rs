//! Authoring sessions: one draft, edit mode and edit surface per open page.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use foundation::ids::{PointKey, RouteId};
use foundation::math::LatLng;
use parking_lot::Mutex;
use routes::deep_link::directions_url;
use routes::deep_link::TravelMode;
use routes::{
    DraftEntry, EditMode, GeometryCache, GeometryResolver, MapEditSurface, Marker, PlaceCandidate,
    PointChosen, Principal, ResolvedGeometry, RouteDraft, Slot, Viewport, WaypointError,
};
use runtime::liveness::Liveness;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// The persisted route a session writes back to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Editing {
    pub route_id: RouteId,
    /// Original publisher; kept when a moderator saves someone else's route.
    pub publisher_id: Option<String>,
}

pub struct DraftState {
    pub draft: RouteDraft,
    pub mode: EditMode,
    pub surface: MapEditSurface,
    pub editing: Option<Editing>,
}

/// Serialized page state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftView {
    pub id: Uuid,
    pub mode: EditMode,
    pub editing: Option<Editing>,
    pub points: Vec<DraftEntry>,
    pub markers: Vec<Marker>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub key: PointKey,
    pub slot: Option<Slot>,
    pub draft: DraftView,
}

pub struct DraftSession {
    id: Uuid,
    owner: Principal,
    state: Mutex<DraftState>,
    geometry: tokio::sync::Mutex<GeometryCache>,
    liveness: Liveness,
    last_seen: Mutex<Instant>,
}

impl DraftSession {
    pub fn new(owner: Principal, state: DraftState) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            state: Mutex::new(state),
            geometry: tokio::sync::Mutex::new(GeometryCache::new()),
            liveness: Liveness::new(),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    /// Runs `f` with exclusive access to the session state.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut DraftState) -> T) -> T {
        f(&mut self.state.lock())
    }

    pub fn view(&self) -> DraftView {
        let state = self.state.lock();
        self.view_of(&state)
    }

    fn view_of(&self, state: &DraftState) -> DraftView {
        DraftView {
            id: self.id,
            mode: state.mode,
            editing: state.editing.clone(),
            points: state.draft.entries(),
            markers: state.surface.markers(&state.draft.stops()),
            viewport: state.surface.viewport(),
        }
    }

    /// Map click, dispatched through the current edit mode.
    pub fn click(&self, lat: f64, lng: f64) -> Result<Placement, WaypointError> {
        self.choose(|surface| surface.click(lat, lng))
    }

    /// Search selection, dispatched through the current edit mode.
    pub fn select(&self, candidate: PlaceCandidate) -> Result<Placement, WaypointError> {
        self.choose(|surface| surface.select(candidate))
    }

    fn choose(
        &self,
        pick: impl FnOnce(&mut MapEditSurface) -> Result<PointChosen, WaypointError>,
    ) -> Result<Placement, WaypointError> {
        let mut state = self.state.lock();
        let chosen = pick(&mut state.surface)?;
        // Consumed synchronously; nothing else listens on this surface.
        state.surface.drain_events();
        let mode = state.mode;
        let key = mode.apply(&mut state.draft, chosen.waypoint);
        Ok(Placement {
            key,
            slot: state.draft.slot_of(key),
            draft: self.view_of(&state),
        })
    }

    /// Fetches a place name for the instance `key` in the background.
    ///
    /// The result is dropped when the session has been torn down, or when the
    /// instance was removed, replaced or renamed in the meantime. The handle
    /// resolves to whether the label was applied.
    pub fn spawn_label_lookup(self: &Arc<Self>, key: PointKey, at: LatLng) -> JoinHandle<bool> {
        let lookups = self.state.lock().surface.lookups().clone();
        let token = self.liveness.token();
        let session: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let Some(label) = lookups.label_for(at).await else {
                return false;
            };
            let applied = token
                .run_if_alive(|| {
                    session.upgrade().is_some_and(|s| {
                        let mut state = s.state.lock();
                        state.draft.relabel(key, &label)
                    })
                })
                .unwrap_or(false);
            if !applied {
                debug!(key = %key, "discarded stale place label");
            }
            applied
        })
    }

    /// Resolves the current stops, reusing the last result when unchanged,
    /// and fits the surface to it.
    pub async fn geometry(&self, resolver: &GeometryResolver) -> ResolvedGeometry {
        let points = self.state.lock().draft.ordered_points();
        let geometry = self.geometry.lock().await.resolve(resolver, &points).await;
        if self.liveness.is_alive() {
            self.state.lock().surface.fit_geometry(&geometry);
        }
        geometry
    }

    pub fn deep_link(&self, mode: Option<TravelMode>) -> Option<String> {
        let state = self.state.lock();
        directions_url(&state.draft.stops(), mode).map(String::from)
    }

    /// Tears the session down; pending lookups become no-ops.
    pub fn close(&self) {
        self.liveness.kill();
    }

    pub fn is_open(&self) -> bool {
        self.liveness.is_alive()
    }
}

/// Open sessions by id.
///
/// A draft nobody has touched for `idle_ttl` is closed and dropped: authors
/// who leave the page never send a close.
pub struct SessionTable {
    sessions: DashMap<Uuid, Arc<DraftSession>>,
    idle_ttl: Duration,
}

impl SessionTable {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl,
        }
    }

    pub fn open(&self, session: DraftSession) -> Arc<DraftSession> {
        self.evict_idle();
        let session = Arc::new(session);
        self.sessions.insert(session.id(), Arc::clone(&session));
        session
    }

    /// The session `id` if it is open and owned by `user_id`. Counts as activity.
    pub fn get(&self, id: Uuid, user_id: &str) -> Option<Arc<DraftSession>> {
        let session = self
            .sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|s| s.owner().user_id == user_id)?;
        session.touch();
        Some(session)
    }

    pub fn close(&self, id: Uuid, user_id: &str) -> bool {
        match self
            .sessions
            .remove_if(&id, |_, s| s.owner().user_id == user_id)
        {
            Some((_, session)) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Closes and drops every session idle for at least `idle_ttl`.
    pub fn evict_idle(&self) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|id, session| {
            if session.idle_for() < self.idle_ttl {
                return true;
            }
            session.close();
            debug!(session = %id, "evicted idle draft");
            evicted += 1;
            false
        });
        evicted
    }

    /// Sweeps idle sessions every `every` until the table is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let table = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let Some(table) = table.upgrade() else {
                    break;
                };
                let evicted = table.evict_idle();
                if evicted > 0 {
                    info!(evicted, open = table.len(), "swept idle drafts");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
