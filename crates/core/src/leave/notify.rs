//! Post-commit change notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId};

use crate::leave::status::LeaveStatus;

/// Kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// A transaction was filed.
    Created,
    /// A transaction was edited or changed status.
    Updated,
    /// A transaction was removed.
    Deleted,
}

/// Event published after a leave change commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveChangeEvent {
    /// Employee whose leave changed.
    pub employee_id: EmployeeId,
    /// Always `"leave"`.
    pub change_type: &'static str,
    /// Kind of change.
    pub action: ChangeAction,
    /// Affected transaction.
    pub transaction_id: LeaveTransactionId,
    /// Transaction number, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_no: Option<String>,
    /// Status after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeaveStatus>,
    /// Status before the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<LeaveStatus>,
    /// Leave type after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_type_id: Option<LeaveTypeId>,
    /// Commit time.
    pub occurred_at: DateTime<Utc>,
}

impl LeaveChangeEvent {
    /// Creates an event with only the required fields set.
    #[must_use]
    pub fn new(
        employee_id: EmployeeId,
        action: ChangeAction,
        transaction_id: LeaveTransactionId,
    ) -> Self {
        Self {
            employee_id,
            change_type: "leave",
            action,
            transaction_id,
            transaction_no: None,
            status: None,
            previous_status: None,
            leave_type_id: None,
            occurred_at: Utc::now(),
        }
    }
}

/// Errors a notifier can report. They are logged, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The sink has shut down.
    #[error("notification channel closed")]
    Closed,

    /// The sink refused the event.
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Sink for leave change events.
pub trait ChangeNotifier: Send + Sync {
    /// Publishes an event.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the sink could not accept the event.
    fn notify(&self, event: LeaveChangeEvent) -> Result<(), NotifyError>;
}

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify(&self, _event: LeaveChangeEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let mut event = LeaveChangeEvent::new(
            EmployeeId::new(),
            ChangeAction::Updated,
            LeaveTransactionId::new(),
        );
        event.status = Some(LeaveStatus::Approved);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["change_type"], "leave");
        assert_eq!(json["action"], "updated");
        assert_eq!(json["status"], "Approved");
        assert!(json.get("previous_status").is_none());
    }
}
