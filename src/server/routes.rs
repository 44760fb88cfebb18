//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Camera ranges (read-only; writes answer 405)
        .route(
            "/api/serial-numbers",
            get(handlers::list_serial_numbers).post(handlers::create_serial_number),
        )
        .route(
            "/api/serial-numbers/:id",
            get(handlers::get_serial_number)
                .put(handlers::update_serial_number)
                .patch(handlers::update_serial_number)
                .delete(handlers::delete_serial_number),
        )
        // Range containment
        .route(
            "/api/lookup/:serial",
            get(handlers::lookup_serial)
                .post(handlers::create_serial_number)
                .put(handlers::update_serial_number)
                .patch(handlers::update_serial_number)
                .delete(handlers::delete_serial_number),
        )
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
