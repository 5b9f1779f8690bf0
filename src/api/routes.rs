//! API Routes
//!
//! Configures the Axum router with all state service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_filters_handler, clear_handler, filters_handler, health_handler, invalidate_handler,
    palette_handler, read_handler, reset_filters_handler, stats_handler, update_filters_handler,
    write_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|PUT|DELETE /cache/:key` - Read, write or invalidate one entry
/// - `DELETE /cache?prefix=` - Clear by prefix, or everything
/// - `GET|PATCH|DELETE /filters/:scope` - Resolve, update or clear a filter scope
/// - `POST /filters/:scope/reset` - Restore the scope's defaults
/// - `GET /palette/:seed` - Shade palette for a hex seed color
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// Filter endpoints take the page's query string as their own and return
/// the rewritten one.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:key",
            get(read_handler).put(write_handler).delete(invalidate_handler),
        )
        .route("/cache", delete(clear_handler))
        .route(
            "/filters/:scope",
            get(filters_handler)
                .patch(update_filters_handler)
                .delete(clear_filters_handler),
        )
        .route("/filters/:scope/reset", post(reset_filters_handler))
        .route("/palette/:seed", get(palette_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
