//! Application-wide error types.

use thiserror::Error;

/// Errors raised before a request reaches the leave ledger
/// (authentication and permissions).
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The actor is not allowed to perform the action.
    #[error("Access denied: {0}")]
    Forbidden(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::Forbidden(String::new()).status_code(), 403);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(AppError::Forbidden(String::new()).error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_messages_carry_prefix() {
        let err = AppError::Unauthorized("Token has expired".into());
        assert_eq!(err.to_string(), "Authentication failed: Token has expired");

        let err = AppError::Forbidden("cannot approve leave".into());
        assert_eq!(err.to_string(), "Access denied: cannot approve leave");
    }
}
