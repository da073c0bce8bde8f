//! Leave transaction ledger and approval state machine.
//!
//! # Modules
//!
//! - `status` - Status normalization
//! - `types` - Leave domain types and operation inputs
//! - `limits` - Annual-cap and running-balance rules
//! - `ledger` - Balance debits and credits
//! - `details` - Per-day credit split and transaction numbering
//! - `transition` - Status transition planning
//! - `store` - Unit-of-work persistence seam
//! - `notify` - Post-commit change events
//! - `access` - Actors and the permission oracle
//! - `service` - Transaction manager
//! - `memory` - In-memory store

pub mod access;
pub mod details;
pub mod error;
pub mod ledger;
pub mod limits;
pub mod memory;
pub mod notify;
pub mod service;
pub mod status;
pub mod store;
pub mod transition;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use access::{Actor, LeaveAction, PermissionOracle, ResourceKind, Role, RolePermissions};
pub use error::LeaveError;
pub use ledger::Posting;
pub use limits::LimitContext;
pub use memory::InMemoryLeaveStore;
pub use notify::{ChangeAction, ChangeNotifier, LeaveChangeEvent, NoopNotifier, NotifyError};
pub use service::LeaveService;
pub use status::LeaveStatus;
pub use store::{LeaveStore, LeaveUnitOfWork};
pub use transition::{ApprovalStamp, TransitionPlan, TransitionService};
pub use types::{
    ChargingMode, CreateLeaveTransaction, CreatedLeaveTransaction, EmployeeLeaveSummary,
    Entitlement, LeaveBalance,
    LeaveTransaction, LeaveTransactionDetail, LeaveTransactionRecord, LeaveType, LimitCheck,
    QuestionAnswer, TransactionFilter, UpdateLeaveTransaction,
};
