//! Leave type routes.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde_json::{Value, json};

use kawani_core::leave::{LeaveAction, LeaveStore};

use super::authorize;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the leave type routes.
pub fn routes<S: LeaveStore + 'static>() -> Router<AppState<S>> {
    Router::new().route("/leave-types", get(list_leave_types::<S>))
}

/// GET `/leave-types` - List leave types by name.
async fn list_leave_types<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;

    let leave_types = state.leave.list_leave_types().await?;
    Ok(Json(json!({ "leave_types": leave_types })))
}
