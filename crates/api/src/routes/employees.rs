//! Per-employee leave routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde_json::{Value, json};

use kawani_core::leave::{LeaveAction, LeaveBalance, LeaveStore};
use kawani_shared::types::EmployeeId;

use super::leave_transactions::ListTransactionsQuery;
use super::{authorize, ensure_employee, visible_employee};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the employee routes.
pub fn routes<S: LeaveStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/employees/leave-summary", get(list_leave_summaries::<S>))
        .route(
            "/employees/{employee_id}/leave-balance",
            get(get_leave_balance::<S>),
        )
        .route(
            "/employees/{employee_id}/leave-transactions",
            get(list_employee_transactions::<S>),
        )
}

/// GET `/employees/leave-summary` - Balance and filing roll-up of every employee.
///
/// Staff only; an employee account is refused even though it may read leave.
async fn list_leave_summaries<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;
    if visible_employee(&actor)?.is_some() {
        return Err(ApiError::forbidden(
            "leave summaries of other employees are not accessible",
        ));
    }

    let employees = state.leave.employee_summaries().await?;
    Ok(Json(json!({ "employees": employees })))
}

/// GET `/employees/{employee_id}/leave-balance` - Current VL and SL balance.
async fn get_leave_balance<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(employee_id): Path<EmployeeId>,
) -> Result<Json<LeaveBalance>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;
    ensure_employee(&actor, employee_id)?;

    Ok(Json(state.leave.balance(employee_id).await?))
}

/// GET `/employees/{employee_id}/leave-transactions` - One employee's leaves.
async fn list_employee_transactions<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(employee_id): Path<EmployeeId>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;
    ensure_employee(&actor, employee_id)?;

    let mut filter = query.into_filter();
    filter.employee_id = Some(employee_id);

    let transactions = state.leave.list(&filter).await?;
    Ok(Json(json!({ "transactions": transactions })))
}
