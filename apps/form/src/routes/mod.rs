pub mod apply;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    // The host speaks plain HTTP, so the session cookie cannot be `Secure`.
    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(apply::handle_page))
        .route(
            "/apply",
            post(apply::handle_apply).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/notice/dismiss", post(apply::handle_dismiss_notice))
        .route("/api/state", get(apply::handle_get_state))
        .layer(sessions)
        .with_state(state)
}
