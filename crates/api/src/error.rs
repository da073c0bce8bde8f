//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use kawani_core::leave::LeaveError;
use kawani_shared::AppError;

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Leave ledger failure.
    Leave(LeaveError),
    /// Authentication, permission or request failure.
    App(AppError),
}

impl ApiError {
    /// Shorthand for an authentication failure.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::App(AppError::Unauthorized(message.into()))
    }

    /// Shorthand for a permission refusal.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::App(AppError::Forbidden(message.into()))
    }

    fn status(&self) -> StatusCode {
        let code = match self {
            Self::Leave(e) => e.status_code(),
            Self::App(e) => e.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<LeaveError> for ApiError {
    fn from(e: LeaveError) -> Self {
        Self::Leave(e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Leave(e @ LeaveError::Storage(detail)) => {
                error!(error = %detail, "Leave storage failure");
                json!({
                    "error": e.error_code(),
                    "message": "An internal error occurred"
                })
            }
            Self::Leave(e @ LeaveError::ValidationFailed { context, .. }) => json!({
                "error": e.error_code(),
                "message": e.to_string(),
                "context": context
            }),
            Self::Leave(e) => json!({
                "error": e.error_code(),
                "message": e.to_string()
            }),
            Self::App(e) => json!({
                "error": e.error_code(),
                "message": e.to_string()
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use kawani_core::leave::{ChargingMode, LimitContext};
    use rust_decimal_macros::dec;
    use serde_json::Value;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_storage_detail_is_hidden() {
        let (status, body) =
            body_of(LeaveError::Storage("relation does not exist".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "STORAGE_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_validation_failure_carries_context() {
        let err = LeaveError::ValidationFailed {
            message: "Insufficient leave balance.".into(),
            context: LimitContext {
                annual_entitlement: None,
                total_annual_used: None,
                available_balance: Some(dec!(1)),
                balance: Some(dec!(1)),
                charging_mode: ChargingMode::Vl,
            },
        };
        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "LEAVE_LIMIT_EXCEEDED");
        assert_eq!(body["context"]["charging_mode"], "VL");
    }

    #[tokio::test]
    async fn test_forbidden() {
        let (status, body) = body_of(ApiError::forbidden("employee cannot approve leave")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (status, body) = body_of(ApiError::unauthorized("Token has expired")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Authentication failed: Token has expired");
    }
}
