pub mod admin;
pub mod config;
pub mod entries;
pub mod error;
pub mod gate;
pub mod notify;
pub mod state;
pub mod text;

use axum::routing::get;
use axum::{Json, Router, middleware};

use guestbook_types::api::HealthResponse;

use crate::state::AppState;

/// Public and admin routes. Static files, CORS and tracing are layered on by
/// the server binary.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/pending", get(admin::list_pending))
        .route("/admin/approve", get(admin::approve))
        .route("/admin/reject", get(admin::reject))
        .route_layer(middleware::from_fn_with_state(state.clone(), gate::require_admin));

    Router::new()
        .route("/api/entries", get(entries::list_entries).post(entries::submit_entry))
        .route("/health", get(health))
        .merge(admin_routes)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
