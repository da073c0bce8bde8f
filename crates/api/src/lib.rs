//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for leave types, balances and leave transactions
//! - A server-sent event stream of leave changes
//! - JWT authentication middleware and the `AuthUser` extractor
//! - Mapping of domain errors to JSON responses
//!
//! Handlers are generic over the [`LeaveStore`], so the same router runs on
//! Postgres in production and on the in-memory store in tests.

pub mod error;
pub mod middleware;
pub mod notify;
pub mod routes;

#[cfg(test)]
mod test_support;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use kawani_core::leave::{LeaveService, LeaveStore, PermissionOracle, RolePermissions};
use kawani_shared::JwtService;

pub use error::ApiError;
pub use notify::BroadcastNotifier;

/// Application state shared across handlers.
pub struct AppState<S> {
    /// Leave transaction manager.
    pub leave: Arc<LeaveService<S>>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Role-based permission checks.
    pub permissions: Arc<dyn PermissionOracle>,
    /// Change hub feeding the SSE stream.
    pub changes: BroadcastNotifier,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            leave: Arc::clone(&self.leave),
            jwt_service: Arc::clone(&self.jwt_service),
            permissions: Arc::clone(&self.permissions),
            changes: self.changes.clone(),
        }
    }
}

impl<S: LeaveStore> AppState<S> {
    /// Wires a leave service over `store` to a fresh change hub.
    pub fn new(store: S, jwt_service: JwtService, notification_capacity: usize) -> Self {
        let changes = BroadcastNotifier::new(notification_capacity);
        let leave = LeaveService::new(store, Arc::new(changes.clone()));

        Self {
            leave: Arc::new(leave),
            jwt_service: Arc::new(jwt_service),
            permissions: Arc::new(RolePermissions),
            changes,
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: LeaveStore + 'static>(
    state: AppState<S>,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(&state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
