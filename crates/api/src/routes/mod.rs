//! API route definitions.

use axum::{Router, middleware};
use std::sync::Arc;

use kawani_core::leave::{Actor, LeaveAction, LeaveStore, ResourceKind};
use kawani_shared::types::EmployeeId;

use crate::{AppState, error::ApiError, middleware::auth_middleware};

pub mod changes;
pub mod employees;
pub mod health;
pub mod leave_transactions;
pub mod leave_types;

/// Creates the API router; everything but the health check needs a token.
pub fn api_routes_with_state<S: LeaveStore + 'static>(state: &AppState<S>) -> Router<AppState<S>> {
    let protected_routes = Router::new()
        .merge(leave_types::routes())
        .merge(leave_transactions::routes())
        .merge(employees::routes())
        .merge(changes::routes())
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.jwt_service),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Refuses the request unless the actor's role allows `action`.
fn authorize<S>(state: &AppState<S>, actor: &Actor, action: LeaveAction) -> Result<(), ApiError> {
    if state
        .permissions
        .can_perform(actor, ResourceKind::Leave, action)
    {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "{} is not allowed to {} leave",
            actor.role,
            action.as_str()
        )))
    }
}

/// Refuses the request unless the actor may act for `employee_id`.
fn ensure_employee(actor: &Actor, employee_id: EmployeeId) -> Result<(), ApiError> {
    if actor.can_access_employee(employee_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "leave records of other employees are not accessible",
        ))
    }
}

/// Employee the actor is restricted to; `None` means every employee.
fn visible_employee(actor: &Actor) -> Result<Option<EmployeeId>, ApiError> {
    if actor.role.is_staff() {
        return Ok(None);
    }
    actor.employee_id.map(Some).ok_or_else(|| {
        ApiError::forbidden("account is not linked to an employee record")
    })
}
