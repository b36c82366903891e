//! HTTP surface for the checklist engine.
//!
//! Serves the operator page, the status snapshot, and the start/cancel
//! controls. CORS-permissive so the page can be rehosted during development.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use rollcall_core::model::SectionStatus;

use crate::engine::ChecklistEngine;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Build the axum router with a shared [`ChecklistEngine`].
pub fn router(engine: ChecklistEngine) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status))
        .route("/start", get(start))
        .route("/cancel", get(cancel))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn status(State(engine): State<ChecklistEngine>) -> Json<Vec<SectionStatus>> {
    Json(engine.status())
}

#[derive(serde::Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

async fn start(
    State(engine): State<ChecklistEngine>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match engine.start() {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Checklist started",
        })),
        Err(e) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

async fn cancel(State(engine): State<ChecklistEngine>) -> Json<MessageResponse> {
    engine.cancel();
    Json(MessageResponse {
        message: "Cancel requested",
    })
}
