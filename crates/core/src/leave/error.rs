//! Leave ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId};

use crate::leave::limits::LimitContext;
use crate::leave::status::LeaveStatus;
use crate::leave::types::ChargingMode;

/// Errors that can occur during leave ledger operations.
#[derive(Debug, Error)]
pub enum LeaveError {
    /// Requested credit exceeds the annual cap or the running balance.
    #[error("{message}")]
    ValidationFailed {
        /// Human-readable explanation.
        message: String,
        /// Figures the decision was based on.
        context: LimitContext,
    },

    /// Malformed input.
    #[error("{0}")]
    InvalidInput(String),

    /// Leave type not found.
    #[error("Leave type {0} not found")]
    LeaveTypeNotFound(LeaveTypeId),

    /// Leave transaction not found.
    #[error("Leave transaction {0} not found")]
    TransactionNotFound(LeaveTransactionId),

    /// Employee has no balance row.
    #[error("Leave record not found for employee {0}")]
    BalanceNotFound(EmployeeId),

    /// Status transition not permitted.
    #[error("Cannot change leave status from {from} to {to}: {reason}")]
    InvalidState {
        /// Current status.
        from: LeaveStatus,
        /// Requested status.
        to: LeaveStatus,
        /// Why the transition is refused.
        reason: String,
    },

    /// A debit would take a balance below zero.
    #[error("{charging_mode} balance of employee {employee_id} is {balance}, cannot deduct {amount}")]
    BalanceWouldGoNegative {
        /// Owning employee.
        employee_id: EmployeeId,
        /// Bucket being debited.
        charging_mode: ChargingMode,
        /// Balance before the debit.
        balance: Decimal,
        /// Requested debit.
        amount: Decimal,
    },

    /// Storage failure; the unit of work was rolled back.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LeaveError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ValidationFailed { .. } | Self::InvalidInput(_) => 400,
            Self::LeaveTypeNotFound(_) | Self::TransactionNotFound(_) | Self::BalanceNotFound(_) => {
                404
            }
            Self::InvalidState { .. } | Self::BalanceWouldGoNegative { .. } => 409,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationFailed { .. } => "LEAVE_LIMIT_EXCEEDED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::LeaveTypeNotFound(_) => "LEAVE_TYPE_NOT_FOUND",
            Self::TransactionNotFound(_) => "LEAVE_TRANSACTION_NOT_FOUND",
            Self::BalanceNotFound(_) => "LEAVE_BALANCE_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::BalanceWouldGoNegative { .. } => "INSUFFICIENT_BALANCE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub(crate) fn invalid_state(from: LeaveStatus, to: LeaveStatus, reason: &str) -> Self {
        Self::InvalidState {
            from,
            to,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LeaveError::InvalidInput(String::new()).status_code(), 400);
        assert_eq!(
            LeaveError::TransactionNotFound(LeaveTransactionId::new()).status_code(),
            404
        );
        assert_eq!(
            LeaveError::BalanceNotFound(EmployeeId::new()).status_code(),
            404
        );
        assert_eq!(
            LeaveError::invalid_state(LeaveStatus::Returned, LeaveStatus::Approved, "x")
                .status_code(),
            409
        );
        assert_eq!(LeaveError::Storage(String::new()).status_code(), 500);
    }

    #[test]
    fn test_validation_failed_code_and_message() {
        let err = LeaveError::ValidationFailed {
            message: "Insufficient leave balance.".into(),
            context: LimitContext::no_deduction(),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "LEAVE_LIMIT_EXCEEDED");
        assert_eq!(err.to_string(), "Insufficient leave balance.");
    }

    #[test]
    fn test_invalid_state_message() {
        let err = LeaveError::invalid_state(
            LeaveStatus::Cancelled,
            LeaveStatus::Approved,
            "resubmit it for approval first",
        );
        assert_eq!(
            err.to_string(),
            "Cannot change leave status from Cancelled to Approved: resubmit it for approval first"
        );
        assert_eq!(err.error_code(), "INVALID_STATE");
    }
}
