//! Actors and the permission oracle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use kawani_shared::types::{EmployeeId, UserId};

use crate::leave::status::LeaveStatus;

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// HR staff.
    Hr,
    /// Decides on leave requests.
    Approver,
    /// Files their own leave.
    Employee,
}

impl Role {
    /// Returns the role as string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Hr => "hr",
            Self::Approver => "approver",
            Self::Employee => "employee",
        }
    }

    /// Whether this role acts on behalf of other employees.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Employee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "owner" => Ok(Self::Admin),
            "hr" => Ok(Self::Hr),
            "approver" => Ok(Self::Approver),
            "employee" | "member" => Ok(Self::Employee),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Employee record of the user, if any.
    pub employee_id: Option<EmployeeId>,
    /// Role.
    pub role: Role,
}

impl Actor {
    /// Whether the actor may see or act on `employee_id`'s records.
    #[must_use]
    pub fn can_access_employee(&self, employee_id: EmployeeId) -> bool {
        self.role.is_staff() || self.employee_id == Some(employee_id)
    }
}

/// Resource family an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Leave transactions and balances.
    Leave,
}

/// Actions on leave resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaveAction {
    /// Read transactions, balances and leave types.
    Read,
    /// Dry-run limit check.
    Validate,
    /// File a leave.
    Create,
    /// Edit a leave.
    Update,
    /// Approve a leave.
    Approve,
    /// Return a leave to the filer.
    Return,
    /// Cancel a leave.
    Cancel,
    /// Revert an approval.
    Unapprove,
    /// Remove a leave.
    Delete,
}

impl LeaveAction {
    /// Returns the action name used in error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Validate => "validate",
            Self::Create => "create",
            Self::Update => "update",
            Self::Approve => "approve",
            Self::Return => "return",
            Self::Cancel => "cancel",
            Self::Unapprove => "unapprove",
            Self::Delete => "delete",
        }
    }

    /// Action implied by moving a leave to `status`.
    #[must_use]
    pub const fn for_status(status: LeaveStatus) -> Self {
        match status {
            LeaveStatus::Approved => Self::Approve,
            LeaveStatus::Returned => Self::Return,
            LeaveStatus::Cancelled => Self::Cancel,
            LeaveStatus::ForApproval => Self::Update,
        }
    }

    /// Action implied by editing a leave from `from` to `to`.
    ///
    /// Pulling an approved leave back to `For Approval` is an unapproval,
    /// and changing what an approved leave charges is a fresh approval.
    #[must_use]
    pub const fn for_transition(from: LeaveStatus, to: LeaveStatus, changes_posting: bool) -> Self {
        match (from, to) {
            (LeaveStatus::Approved, LeaveStatus::ForApproval) => Self::Unapprove,
            (LeaveStatus::Approved, LeaveStatus::Approved) if changes_posting => Self::Approve,
            (LeaveStatus::Approved, LeaveStatus::Approved) => Self::Update,
            (_, to) => Self::for_status(to),
        }
    }
}

/// Decides whether an actor may perform an action.
pub trait PermissionOracle: Send + Sync {
    /// Returns `true` when `actor` may perform `action` on `resource`.
    fn can_perform(&self, actor: &Actor, resource: ResourceKind, action: LeaveAction) -> bool;
}

/// Fixed role table.
///
/// | Role | Actions |
/// |---|---|
/// | admin, hr | all |
/// | approver | read, validate, approve, return, cancel, unapprove |
/// | employee | read, validate, create, update, cancel |
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePermissions;

impl PermissionOracle for RolePermissions {
    fn can_perform(&self, actor: &Actor, resource: ResourceKind, action: LeaveAction) -> bool {
        let ResourceKind::Leave = resource;
        match actor.role {
            Role::Admin | Role::Hr => true,
            Role::Approver => matches!(
                action,
                LeaveAction::Read
                    | LeaveAction::Validate
                    | LeaveAction::Approve
                    | LeaveAction::Return
                    | LeaveAction::Cancel
                    | LeaveAction::Unapprove
            ),
            Role::Employee => matches!(
                action,
                LeaveAction::Read
                    | LeaveAction::Validate
                    | LeaveAction::Create
                    | LeaveAction::Update
                    | LeaveAction::Cancel
            ),
        }
    }
}
