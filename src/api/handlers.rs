//! HTTP request handlers

use super::types::{ErrorResponse, WorkLogResponse};
use super::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(get_version))
        // Work log export, linked from `.export`
        .route("/:file", get(export_work_log))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_version() -> &'static str {
    concat!("pomodoro-bot ", env!("CARGO_PKG_VERSION"))
}

/// GET /{nick}.json
async fn export_work_log(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Json<WorkLogResponse>, AppError> {
    let Some(nick) = file.strip_suffix(".json").filter(|n| !n.is_empty()) else {
        return Err(AppError::NotFound(format!("No such export: {file}")));
    };

    let sessions = state
        .db
        .work_log(nick)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(WorkLogResponse {
        nick: nick.to_lowercase(),
        sessions,
    }))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Work log export failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
