//! Server-sent stream of leave changes.
//!
//! Staff see every event. Employees only see events about their own leave.

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::warn;

use kawani_core::leave::{LeaveAction, LeaveChangeEvent, LeaveStore};
use kawani_shared::types::EmployeeId;

use super::{authorize, visible_employee};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the change stream route.
pub fn routes<S: LeaveStore + 'static>() -> Router<AppState<S>> {
    Router::new().route("/changes", get(stream_changes::<S>))
}

/// GET `/changes` - Leave change events as `leave` SSE messages.
async fn stream_changes<S: LeaveStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let actor = auth.actor()?;
    authorize(&state, &actor, LeaveAction::Read)?;
    let scope = visible_employee(&actor)?;

    let events = state.changes.subscribe();
    Ok(Sse::new(change_stream(events, scope)).keep_alive(KeepAlive::default()))
}

fn change_stream(
    events: Receiver<LeaveChangeEvent>,
    scope: Option<EmployeeId>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(events, move |mut events| async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if scope.is_some_and(|own| own != event.employee_id) {
                        continue;
                    }
                    let sse = Event::default().event("leave").json_data(&event);
                    return Some((sse, events));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Change stream subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use http_body_util::BodyExt;
    use kawani_core::leave::ChargingMode;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::test_support::TestApp;

    async fn open_stream(app: &TestApp, token: &str) -> axum::response::Response {
        let request = Request::builder()
            .uri("/api/v1/changes")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn next_frame(response: &mut axum::response::Response) -> String {
        let frame = tokio::time::timeout(Duration::from_secs(5), response.body_mut().frame())
            .await
            .expect("event within timeout")
            .expect("stream open")
            .unwrap();
        String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_stream_requires_token() {
        let app = TestApp::new();
        let (status, _) = app.send("GET", "/api/v1/changes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_employee_only_sees_own_changes() {
        let app = TestApp::new();
        let me = app.employee(dec!(5), dec!(5)).await;
        let colleague = app.employee(dec!(5), dec!(5)).await;
        let vl = app.leave_type(ChargingMode::Vl, None).await;
        let hr = app.token("hr", None);
        let own = app.token("employee", Some(me));

        let mut response = open_stream(&app, &own).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.state.changes.subscriber_count(), 1);

        for employee in [colleague, me] {
            let (status, _) = app
                .send(
                    "POST",
                    "/api/v1/leave-transactions",
                    Some(&hr),
                    Some(json!({
                        "employee_id": employee,
                        "leave_type_id": vl,
                        "dates": ["2026-05-04"],
                        "deducted_credit": "1"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let frame = next_frame(&mut response).await;
        assert!(frame.starts_with("event: leave"));
        assert!(frame.contains(&me.to_string()));
        assert!(!frame.contains(&colleague.to_string()));
        assert!(frame.contains("\"action\":\"created\""));
    }
}
