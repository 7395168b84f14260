use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/session", get(handlers::get_session))
        .route("/api/day", get(handlers::get_day).post(handlers::patch_day))
        .route("/api/break", post(handlers::toggle_break))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/notifications", get(handlers::get_notifications))
        .route("/api/notifications/permission", post(handlers::set_permission))
        .route("/api/migrate", post(handlers::migrate))
        .with_state(state)
}
