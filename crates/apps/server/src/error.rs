use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use foundation::ids::PointKey;
use routes::gateway::GatewayError;
use routes::{Forbidden, RouteWriteError, WaypointError};
use tracing::warn;
use uuid::Uuid;

/// Request failures surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or malformed bearer token")]
    Unauthorized,
    #[error(transparent)]
    Forbidden(#[from] Forbidden),
    #[error("draft session {0} not found")]
    SessionNotFound(Uuid),
    #[error("point {0} is not part of this draft")]
    PointNotFound(PointKey),
    #[error(transparent)]
    InvalidWaypoint(#[from] WaypointError),
    #[error(transparent)]
    InvalidRoute(#[from] RouteWriteError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::SessionNotFound(_) | Self::PointNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidWaypoint(_) | Self::InvalidRoute(_) => StatusCode::BAD_REQUEST,
            Self::Gateway(GatewayError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Gateway(GatewayError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("request failed: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
