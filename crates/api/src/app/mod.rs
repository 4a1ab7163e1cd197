//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, token signer and payment processor
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response shapes that are not domain types
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: extractors with API-shaped rejections

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::AuthState;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

pub use services::{AppServices, StartupError, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let gates = routes::Gates {
        auth: AuthState {
            jwt: services.tokens.clone(),
        },
        users: services.stores.users.clone(),
    };

    routes::router(&gates).layer(Extension(services)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}
