//! HTTP surface for the safe-route service.

pub mod request_id;
mod routes;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::RoutingBackend;
use crate::state::AppState;

pub use routes::ZonePolygonsRequest;

pub fn routes<B: RoutingBackend + 'static>() -> Router<Arc<AppState<B>>> {
    routes::create_router()
}

/// Full application: API routes and `/health` inside the request span,
/// with request ids and CORS outermost.
pub fn app<B: RoutingBackend + 'static>(state: Arc<AppState<B>>) -> Router {
    routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(request_id::request_span))
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(CorsLayer::permissive())
}
