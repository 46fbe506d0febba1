use super::handlers;
use super::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full router: three routes plus request logging.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/info", post(handlers::info))
        .route("/data", get(handlers::get_data))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
