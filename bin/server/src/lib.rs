//! cutlist HTTP server.
//!
//! Wires the person resource to Postgres, the in-process cache and search
//! index, and the NATS event bus, and serves it over axum.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod routes;
pub mod search;

use auth::AppState;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .merge(routes::people::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
