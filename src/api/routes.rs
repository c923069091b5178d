use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/regions/:region/movies", post(handlers::create_movie))
        .route("/regions/:region/movies", get(handlers::list_movies))
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:id", delete(handlers::delete_session))
        // Feed
        .route("/sessions/:id/next", get(handlers::next_item))
        .route("/sessions/:id/peek", get(handlers::peek_items))
        .route("/sessions/:id/swipes", post(handlers::record_swipe))
        .route("/sessions/:id/profile", put(handlers::update_profile))
        .route("/sessions/:id/stats", get(handlers::session_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
