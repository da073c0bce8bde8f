//! Router test helpers over the in-memory store.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

use kawani_core::leave::{ChargingMode, InMemoryLeaveStore, LeaveBalance, LeaveType};
use kawani_shared::types::{EmployeeId, LeaveTypeId, UserId};
use kawani_shared::{JwtConfig, JwtService};

use crate::{AppState, create_router};

pub(crate) struct TestApp {
    pub router: Router,
    pub store: InMemoryLeaveStore,
    pub state: AppState<InMemoryLeaveStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryLeaveStore::new();
        let state = AppState::new(store.clone(), JwtService::new(JwtConfig::default()), 16);
        let router = create_router(state.clone(), Duration::from_secs(5));
        Self {
            router,
            store,
            state,
        }
    }

    pub fn token(&self, role: &str, employee_id: Option<EmployeeId>) -> String {
        self.state
            .jwt_service
            .generate_access_token(UserId::new(), employee_id, role)
            .expect("should generate token")
    }

    pub async fn employee(&self, vl: Decimal, sl: Decimal) -> EmployeeId {
        let employee_id = EmployeeId::new();
        self.store
            .put_balance(LeaveBalance::new(employee_id, vl, sl))
            .await;
        employee_id
    }

    pub async fn leave_type(&self, mode: ChargingMode, cap: Option<Decimal>) -> LeaveTypeId {
        let id = LeaveTypeId::new();
        self.store
            .put_leave_type(LeaveType {
                id,
                code: mode.as_str().to_string(),
                name: format!("{mode} leave"),
                charging_mode: mode,
                annual_entitlement: cap,
            })
            .await;
        id
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

pub(crate) fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}
