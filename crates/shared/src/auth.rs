//! Authentication types for JWT claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{EmployeeId, UserId};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (system user ID).
    pub sub: Uuid,
    /// Employee record linked to the user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp: Option<Uuid>,
    /// User's role (admin, hr, approver, employee).
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: UserId,
        employee_id: Option<EmployeeId>,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into_inner(),
            emp: employee_id.map(EmployeeId::into_inner),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// Returns the employee ID linked to this user, if any.
    #[must_use]
    pub fn employee_id(&self) -> Option<EmployeeId> {
        self.emp.map(EmployeeId::from_uuid)
    }
}
