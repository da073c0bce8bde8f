//! Leave transaction routes.
//!
//! Filing, editing, approval, and the dry-run limit check. Every handler
//! checks the role table first, then that the actor may act for the
//! transaction's employee.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use kawani_core::leave::{
    Actor, CreateLeaveTransaction, CreatedLeaveTransaction, LeaveAction, LeaveError, LeaveStatus,
    LeaveStore, LeaveTransaction, LeaveTransactionRecord, LimitCheck, TransactionFilter,
    UpdateLeaveTransaction,
};
use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId};

use super::{authorize, ensure_employee, visible_employee};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the leave transaction routes.
pub fn routes<S: LeaveStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/leave-transactions",
            get(list_transactions::<S>).post(create_transaction::<S>),
        )
        .route(
            "/leave-transactions/validate",
            post(validate_transaction::<S>),
        )
        .route(
            "/leave-transactions/{id}",
            get(get_transaction::<S>)
                .put(update_transaction::<S>)
                .delete(delete_transaction::<S>),
        )
        .route(
            "/leave-transactions/{id}/unapprove",
            put(unapprove_transaction::<S>),
        )
        .route(
            "/leave-transactions/{id}/approve",
            post(approve_transaction::<S>),
        )
        .route(
            "/leave-transactions/{id}/return",
            post(return_transaction::<S>),
        )
        .route(
            "/leave-transactions/{id}/cancel",
            post(cancel_transaction::<S>),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by employee.
    pub employee_id: Option<EmployeeId>,
    /// Filter by leave type.
    pub leave_type_id: Option<LeaveTypeId>,
    /// Filter by status; any spelling accepted by the normalizer.
    pub status: Option<String>,
    /// Keep leaves with a date on or after this day (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Keep leaves with a date on or before this day (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

impl ListTransactionsQuery {
    /// Converts the query into a store filter.
    #[must_use]
    pub fn into_filter(self) -> TransactionFilter {
        TransactionFilter {
            employee_id: self.employee_id,
            leave_type_id: self.leave_type_id,
            status: self
                .status
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(LeaveStatus::normalize),
            date_from: self.from,
            date_to: self.to,
        }
    }
}

/// Body for approve, return, cancel and unapprove.
#[derive(Debug, Default, Deserialize)]
pub struct StatusChangeRequest {
    /// Replaces the remarks when non-blank.
    #[serde(default)]
    pub remarks: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/leave-transactions` - List transactions, newest first.
async fn list_transactions<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;

    let mut filter = query.into_filter();
    if let Some(own) = visible_employee(&actor)? {
        if filter.employee_id.is_some_and(|id| id != own) {
            return Err(ApiError::forbidden(
                "leave records of other employees are not accessible",
            ));
        }
        filter.employee_id = Some(own);
    }

    let transactions = state.leave.list(&filter).await?;
    Ok(Json(json!({ "transactions": transactions })))
}

/// GET `/leave-transactions/{id}` - One transaction with details and answer.
async fn get_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
) -> Result<Json<LeaveTransactionRecord>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;

    Ok(Json(load_visible(&state, &actor, id).await?))
}

/// POST `/leave-transactions/validate` - Dry-run limit check.
///
/// A request over the limit is a successful check with `valid: false`.
async fn validate_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(check): Json<LimitCheck>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Validate)?;
    ensure_employee(&actor, check.employee_id)?;

    match state.leave.validate_limits(&check).await {
        Ok(context) => Ok(Json(json!({ "valid": true, "context": context }))),
        Err(LeaveError::ValidationFailed { message, context }) => Ok(Json(json!({
            "valid": false,
            "message": message,
            "context": context
        }))),
        Err(e) => Err(e.into()),
    }
}

/// POST `/leave-transactions` - File a leave.
async fn create_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(input): Json<CreateLeaveTransaction>,
) -> Result<(StatusCode, Json<CreatedLeaveTransaction>), ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Create)?;
    if let Some(status) = input.status {
        authorize(&state, &actor, LeaveAction::for_status(status))?;
    }
    ensure_employee(&actor, input.employee_id)?;

    let created = state.leave.create(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT `/leave-transactions/{id}` - Edit a leave, optionally moving its status.
///
/// The edit is authorized as the action it amounts to, so reverting or
/// re-posting an approved leave needs `unapprove` or `approve`.
async fn update_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
    Json(patch): Json<UpdateLeaveTransaction>,
) -> Result<Json<LeaveTransaction>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Update)?;
    let current = load_visible(&state, &actor, id).await?;
    let from = current.transaction.status;
    let to = patch.status.unwrap_or(from);
    authorize(
        &state,
        &actor,
        LeaveAction::for_transition(from, to, patch.changes_posting(&current)),
    )?;

    Ok(Json(state.leave.update(id, patch, &actor).await?))
}

/// PUT `/leave-transactions/{id}/unapprove` - Revert an approval.
async fn unapprove_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<LeaveTransaction>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Unapprove)?;
    load_visible(&state, &actor, id).await?;

    Ok(Json(state.leave.unapprove(id, body.remarks, &actor).await?))
}

/// POST `/leave-transactions/{id}/approve`.
async fn approve_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<LeaveTransaction>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Approve)?;
    load_visible(&state, &actor, id).await?;

    Ok(Json(state.leave.approve(id, body.remarks, &actor).await?))
}

/// POST `/leave-transactions/{id}/return`.
async fn return_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<LeaveTransaction>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Return)?;
    load_visible(&state, &actor, id).await?;

    Ok(Json(state.leave.return_leave(id, body.remarks, &actor).await?))
}

/// POST `/leave-transactions/{id}/cancel`.
async fn cancel_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<LeaveTransaction>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Cancel)?;
    load_visible(&state, &actor, id).await?;

    Ok(Json(state.leave.cancel(id, body.remarks, &actor).await?))
}

/// DELETE `/leave-transactions/{id}` - Remove a leave.
async fn delete_transaction<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<LeaveTransactionId>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Delete)?;
    load_visible(&state, &actor, id).await?;

    state.leave.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_visible<S: LeaveStore + 'static>(
    state: &AppState<S>,
    actor: &Actor,
    id: LeaveTransactionId,
) -> Result<LeaveTransactionRecord, ApiError> {
    let record = state.leave.get(id).await?;
    ensure_employee(actor, record.transaction.employee_id)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kawani_core::leave::ChargingMode;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use crate::test_support::{TestApp, decimal};

    fn filing(employee_id: EmployeeId, leave_type_id: LeaveTypeId, credit: &str) -> Value {
        json!({
            "employee_id": employee_id,
            "leave_type_id": leave_type_id,
            "purpose": "family trip",
            "dates": ["2026-03-02", "2026-03-03"],
            "deducted_credit": credit
        })
    }

    #[tokio::test]
    async fn test_requires_token() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/v1/leave-transactions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");

        let (status, body) = app
            .send("GET", "/api/v1/leave-transactions", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["message"],
            "Authentication failed: Invalid or malformed token"
        );
    }

    #[tokio::test]
    async fn test_file_approve_unapprove_flow() {
        let app = TestApp::new();
        let employee = app.employee(dec!(0), dec!(3)).await;
        let sl = app.leave_type(ChargingMode::Sl, None).await;
        let hr = app.token("hr", None);

        let (status, created) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&hr),
                Some(filing(employee, sl, "2.0")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["transaction_no"].as_str().unwrap().contains("LV-"));
        let id = created["transaction_id"].as_str().unwrap().to_string();

        let (status, record) = app
            .send("GET", &format!("/api/v1/leave-transactions/{id}"), Some(&hr), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["status"], "For Approval");
        assert_eq!(record["details"].as_array().unwrap().len(), 2);

        let (status, approved) = app
            .send(
                "POST",
                &format!("/api/v1/leave-transactions/{id}/approve"),
                Some(&hr),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "Approved");

        let (_, balance) = app
            .send(
                "GET",
                &format!("/api/v1/employees/{employee}/leave-balance"),
                Some(&hr),
                None,
            )
            .await;
        assert_eq!(decimal(&balance["sl"]), dec!(1));

        let (status, reverted) = app
            .send(
                "PUT",
                &format!("/api/v1/leave-transactions/{id}/unapprove"),
                Some(&hr),
                Some(json!({ "remarks": "wrong dates" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reverted["status"], "For Approval");
        assert_eq!(reverted["remarks"], "wrong dates");

        let (_, balance) = app
            .send(
                "GET",
                &format!("/api/v1/employees/{employee}/leave-balance"),
                Some(&hr),
                None,
            )
            .await;
        assert_eq!(decimal(&balance["sl"]), dec!(3));
    }

    #[tokio::test]
    async fn test_employee_cannot_approve_own_leave() {
        let app = TestApp::new();
        let employee = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let own = app.token("employee", Some(employee));

        let (status, created) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&own),
                Some(filing(employee, vl, "1")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["transaction_id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/leave-transactions/{id}/approve"),
                Some(&own),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");

        // Filing straight into Approved needs the approve permission too.
        let mut approved = filing(employee, vl, "1");
        approved["status"] = json!("approved");
        let (status, _) = app
            .send("POST", "/api/v1/leave-transactions", Some(&own), Some(approved))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_employee_cannot_revert_or_repost_approved_leave() {
        let app = TestApp::new();
        let employee = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let hr = app.token("hr", None);
        let own = app.token("employee", Some(employee));

        let (_, created) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&hr),
                Some(filing(employee, vl, "2")),
            )
            .await;
        let uri = format!(
            "/api/v1/leave-transactions/{}",
            created["transaction_id"].as_str().unwrap()
        );
        let (status, _) = app
            .send("POST", &format!("{uri}/approve"), Some(&hr), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send("PUT", &format!("{uri}/unapprove"), Some(&own), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(
                "PUT",
                &uri,
                Some(&own),
                Some(json!({ "deducted_credit": "0" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access denied: employee is not allowed to approve leave");

        let (status, body) = app
            .send(
                "PUT",
                &uri,
                Some(&own),
                Some(json!({ "status": "For Approval" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access denied: employee is not allowed to unapprove leave");

        // Non-posting edits stay open to the filer.
        let (status, edited) = app
            .send(
                "PUT",
                &uri,
                Some(&own),
                Some(json!({ "purpose": "rescheduled trip", "deducted_credit": "2" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["status"], "Approved");

        let (_, balance) = app
            .send(
                "GET",
                &format!("/api/v1/employees/{employee}/leave-balance"),
                Some(&own),
                None,
            )
            .await;
        assert_eq!(decimal(&balance["vl"]), dec!(3));
    }

    #[tokio::test]
    async fn test_employee_is_scoped_to_own_records() {
        let app = TestApp::new();
        let me = app.employee(dec!(5), dec!(5)).await;
        let colleague = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let hr = app.token("hr", None);
        let own = app.token("employee", Some(me));

        for employee in [me, colleague] {
            let (status, _) = app
                .send(
                    "POST",
                    "/api/v1/leave-transactions",
                    Some(&hr),
                    Some(filing(employee, vl, "1")),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = app
            .send("GET", "/api/v1/leave-transactions", Some(&own), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let listed = body["transactions"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["employee_id"], json!(me));

        let (status, _) = app
            .send(
                "GET",
                &format!("/api/v1/employees/{colleague}/leave-balance"),
                Some(&own),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&own),
                Some(filing(colleague, vl, "1")),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_validate_reports_limit_without_failing() {
        let app = TestApp::new();
        let employee = app.employee(dec!(1), dec!(0)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let hr = app.token("hr", None);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/leave-transactions/validate",
                Some(&hr),
                Some(json!({
                    "employee_id": employee,
                    "leave_type_id": vl,
                    "requested_credit": "2",
                    "dates": ["2026-04-06"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Insufficient leave balance")
        );
        assert_eq!(decimal(&body["context"]["balance"]), dec!(1));
    }

    #[tokio::test]
    async fn test_over_limit_filing_is_bad_request() {
        let app = TestApp::new();
        let employee = app.employee(dec!(100), dec!(100)).await;
        let capped = app.leave_type(ChargingMode::Vl, Some(dec!(1))).await;
        let hr = app.token("hr", None);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&hr),
                Some(filing(employee, capped, "2")),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "LEAVE_LIMIT_EXCEEDED");
        assert_eq!(decimal(&body["context"]["annual_entitlement"]), dec!(1));
    }

    #[tokio::test]
    async fn test_returned_leave_cannot_be_approved_directly() {
        let app = TestApp::new();
        let employee = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let hr = app.token("hr", None);

        let (_, created) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&hr),
                Some(filing(employee, vl, "1")),
            )
            .await;
        let id = created["transaction_id"].as_str().unwrap().to_string();

        let (status, returned) = app
            .send(
                "POST",
                &format!("/api/v1/leave-transactions/{id}/return"),
                Some(&hr),
                Some(json!({ "remarks": "attach certificate" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(returned["status"], "Returned");

        let (status, body) = app
            .send(
                "PUT",
                &format!("/api/v1/leave-transactions/{id}"),
                Some(&hr),
                Some(json!({ "status": "Approved" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_delete_then_not_found() {
        let app = TestApp::new();
        let employee = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let admin = app.token("admin", None);

        let (_, created) = app
            .send(
                "POST",
                "/api/v1/leave-transactions",
                Some(&admin),
                Some(filing(employee, vl, "1")),
            )
            .await;
        let uri = format!(
            "/api/v1/leave-transactions/{}",
            created["transaction_id"].as_str().unwrap()
        );

        let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app.send("GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "LEAVE_TRANSACTION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_range() {
        let app = TestApp::new();
        let employee = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let hr = app.token("hr", None);

        app.send(
            "POST",
            "/api/v1/leave-transactions",
            Some(&hr),
            Some(filing(employee, vl, "1")),
        )
        .await;

        let (_, body) = app
            .send(
                "GET",
                &format!(
                    "/api/v1/employees/{employee}/leave-transactions?status=for_approval&from=2026-03-03&to=2026-03-31"
                ),
                Some(&hr),
                None,
            )
            .await;
        assert_eq!(body["transactions"].as_array().unwrap().len(), 1);

        let (_, body) = app
            .send(
                "GET",
                &format!("/api/v1/employees/{employee}/leave-transactions?status=approved"),
                Some(&hr),
                None,
            )
            .await;
        assert!(body["transactions"].as_array().unwrap().is_empty());

        let (status, body) = app
            .send(
                "GET",
                "/api/v1/leave-transactions?from=2026-04-01&to=2026-03-01",
                Some(&hr),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_INPUT");
    }

    #[rstest]
    #[case(Some("CANCELED"), Some(LeaveStatus::Cancelled))]
    #[case(Some("for_approval"), Some(LeaveStatus::ForApproval))]
    #[case(Some("pending"), Some(LeaveStatus::ForApproval))]
    #[case(Some("  "), None)]
    #[case(None, None)]
    fn test_query_status_is_normalized(
        #[case] raw: Option<&str>,
        #[case] expected: Option<LeaveStatus>,
    ) {
        let query = ListTransactionsQuery {
            status: raw.map(str::to_string),
            ..Default::default()
        };
        assert_eq!(query.into_filter().status, expected);
    }
}
