//! JSON handlers. Every request authenticates with a bearer token and runs
//! exactly one role check.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use foundation::ids::{PointKey, RouteId};
use foundation::math::LatLng;
use http::header::AUTHORIZATION;
use routes::{
    Action, EditMode, MapEditSurface, OverviewSnapshot, PlaceCandidate, Principal,
    ResolvedGeometry, RouteDetails, RouteDraft, RouteRecord, RouteSummary, RouteWrite, Viewport,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::sessions::{DraftSession, DraftState, DraftView, Editing, Placement};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/drafts", post(open_draft))
        .route("/drafts/:id", get(get_draft).delete(close_draft))
        .route("/drafts/:id/mode", put(set_mode))
        .route("/drafts/:id/click", post(click))
        .route("/drafts/:id/search", post(search))
        .route("/drafts/:id/select", post(select))
        .route("/drafts/:id/points/:key/label", put(rename_point))
        .route(
            "/drafts/:id/interest-points/:index",
            delete(remove_interest_point),
        )
        .route("/drafts/:id/start", delete(clear_start))
        .route("/drafts/:id/end", delete(clear_end))
        .route("/drafts/:id/geometry", get(draft_geometry))
        .route("/drafts/:id/deep-link", get(draft_deep_link))
        .route("/drafts/:id/save", post(save_draft))
        .route("/routes", get(list_routes))
        .route("/routes/:id", get(get_route).delete(delete_route))
        .route("/routes/:id/overview", get(route_overview))
}

/// The authenticated principal behind `Authorization: Bearer <token>`.
pub struct Caller(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;
        let principal = state.gateway.authenticate(token).await?;
        Ok(Caller(principal))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenDraft {
    /// Persisted route to edit; a blank draft when absent.
    #[serde(default)]
    pub route_id: Option<RouteId>,
}

#[derive(Debug, Deserialize)]
pub struct SetMode {
    pub mode: EditMode,
}

#[derive(Debug, Deserialize)]
pub struct MapClick {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct Rename {
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct GeometryView {
    pub geometry: ResolvedGeometry,
    pub length_m: Option<f64>,
    pub viewport: Viewport,
}

#[derive(Debug, Serialize)]
pub struct DeepLink {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Saved {
    pub route_id: RouteId,
}

/// Open session `id` of the caller, after the authoring check.
fn authoring(
    state: &AppState,
    caller: &Principal,
    id: Uuid,
) -> Result<Arc<DraftSession>, ApiError> {
    caller.authorize(Action::AuthorRoute)?;
    state
        .sessions
        .get(id, &caller.user_id)
        .ok_or(ApiError::SessionNotFound(id))
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn open_draft(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Option<Json<OpenDraft>>,
) -> Result<(StatusCode, Json<DraftView>), ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let mut surface = MapEditSurface::new(
        state.geocoder.clone(),
        state.search.clone(),
        state.settings.surface.clone(),
    );

    let (draft, editing) = match req.route_id {
        Some(route_id) => {
            let record = state.gateway.load_route(route_id).await?;
            caller.authorize_owned(record.publisher_id.as_deref())?;
            if let Some(start) = &record.start {
                surface.focus(start.position());
            }
            let editing = Editing {
                route_id,
                publisher_id: record.publisher_id.clone(),
            };
            (RouteDraft::from_record(&record), Some(editing))
        }
        None => {
            caller.authorize(Action::AuthorRoute)?;
            (RouteDraft::new(), None)
        }
    };

    let session = DraftSession::new(
        caller,
        DraftState {
            draft,
            mode: EditMode::default(),
            surface,
            editing,
        },
    );
    let session = state.sessions.open(session);
    info!(session = %session.id(), "draft opened");
    Ok((StatusCode::CREATED, Json(session.view())))
}

async fn get_draft(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    Ok(Json(session.view()))
}

async fn set_mode(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<SetMode>,
) -> Result<Json<DraftView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    session.with_state(|s| s.mode = req.mode);
    Ok(Json(session.view()))
}

async fn click(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<MapClick>,
) -> Result<Json<Placement>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    let placement = session.click(req.lat, req.lng)?;
    let at = LatLng {
        lat: req.lat,
        lng: req.lng,
    };
    session.spawn_label_lookup(placement.key, at);
    Ok(Json(placement))
}

async fn search(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<PlaceQuery>,
) -> Result<Json<Vec<PlaceCandidate>>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    let lookups = session.with_state(|s| s.surface.lookups().clone());
    Ok(Json(lookups.search(&req.query).await))
}

async fn select(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(candidate): Json<PlaceCandidate>,
) -> Result<Json<Placement>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    Ok(Json(session.select(candidate)?))
}

async fn rename_point(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((id, key)): Path<(Uuid, PointKey)>,
    Json(req): Json<Rename>,
) -> Result<Json<DraftView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    if !session.with_state(|s| s.draft.rename(key, &req.label)) {
        return Err(ApiError::PointNotFound(key));
    }
    Ok(Json(session.view()))
}

async fn remove_interest_point(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<DraftView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    session.with_state(|s| s.draft.remove_interest_point(index));
    Ok(Json(session.view()))
}

async fn clear_start(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    session.with_state(|s| s.draft.clear_start());
    Ok(Json(session.view()))
}

async fn clear_end(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    session.with_state(|s| s.draft.clear_end());
    Ok(Json(session.view()))
}

async fn draft_geometry(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<GeometryView>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    let geometry = session.geometry(&state.resolver).await;
    let length_m = (!geometry.is_empty()).then(|| geometry.length_m());
    Ok(Json(GeometryView {
        geometry,
        length_m,
        viewport: session.view().viewport,
    }))
}

async fn draft_deep_link(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DeepLink>, ApiError> {
    let session = authoring(&state, &caller, id)?;
    let url = session.deep_link(state.settings.overview.travel_mode);
    Ok(Json(DeepLink { url }))
}

/// Creates the route on first save; later saves of the same session update it.
async fn save_draft(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(details): Json<RouteDetails>,
) -> Result<(StatusCode, Json<Saved>), ApiError> {
    let session = authoring(&state, &caller, id)?;
    let (write, editing): (RouteWrite, Option<Editing>) = session.with_state(|s| {
        let publisher = s
            .editing
            .as_ref()
            .and_then(|e| e.publisher_id.clone())
            .unwrap_or_else(|| caller.user_id.clone());
        RouteWrite::from_draft(details, &s.draft, publisher).map(|w| (w, s.editing.clone()))
    })?;

    let (route_id, status) = match editing {
        Some(editing) => {
            state.gateway.update_route(editing.route_id, write).await?;
            (editing.route_id, StatusCode::OK)
        }
        None => {
            let route_id = state.gateway.save_route(write).await?;
            session.with_state(|s| {
                s.editing = Some(Editing {
                    route_id,
                    publisher_id: Some(caller.user_id.clone()),
                })
            });
            (route_id, StatusCode::CREATED)
        }
    };
    state.forget_overview(route_id);
    info!(session = %id, route = %route_id, "draft saved");
    Ok((status, Json(Saved { route_id })))
}

async fn close_draft(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    caller.authorize(Action::AuthorRoute)?;
    if state.sessions.close(id, &caller.user_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn list_routes(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<RouteSummary>>, ApiError> {
    caller.authorize(Action::BrowseRoutes)?;
    Ok(Json(state.gateway.list_routes().await?))
}

async fn get_route(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<RouteId>,
) -> Result<Json<RouteRecord>, ApiError> {
    caller.authorize(Action::BrowseRoutes)?;
    Ok(Json(state.gateway.load_route(id).await?))
}

async fn route_overview(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<RouteId>,
) -> Result<Json<OverviewSnapshot>, ApiError> {
    caller.authorize(Action::BrowseRoutes)?;
    let record = state.gateway.load_route(id).await?;
    let overview = state.overview_for(id);
    let snapshot = overview.lock().await.render(&state.resolver, &record).await;
    Ok(Json(snapshot))
}

async fn delete_route(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<RouteId>,
) -> Result<StatusCode, ApiError> {
    let record = state.gateway.load_route(id).await?;
    caller.authorize_owned(record.publisher_id.as_deref())?;
    state.gateway.delete_route(id).await?;
    state.forget_overview(id);
    info!(route = %id, by = %caller.user_id, "route deleted");
    Ok(StatusCode::NO_CONTENT)
}
