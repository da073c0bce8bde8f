//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use kawani_core::leave::{Actor, Role};
use kawani_shared::{Claims, JwtError, JwtService};

use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            let message = match e {
                JwtError::Expired => "Token has expired",
                _ => "Invalid or malformed token",
            };
            ApiError::unauthorized(message).into_response()
        }
    }
}

/// Extractor for authenticated user claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the inner claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    /// Builds the acting identity from the claims.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when the token carries an unknown role.
    pub fn actor(&self) -> Result<Actor, ApiError> {
        let role: Role = self
            .0
            .role
            .parse()
            .map_err(|_| ApiError::forbidden(format!("unknown role '{}'", self.0.role)))?;

        Ok(Actor {
            user_id: self.0.user_id(),
            employee_id: self.0.employee_id(),
            role,
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use kawani_shared::types::{EmployeeId, UserId};

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_actor_from_claims() {
        let user_id = UserId::new();
        let employee_id = EmployeeId::new();
        let claims = Claims::new(
            user_id,
            Some(employee_id),
            "employee",
            Utc::now() + Duration::hours(1),
        );

        let actor = AuthUser(claims).actor().unwrap();
        assert_eq!(actor.user_id, user_id);
        assert_eq!(actor.employee_id, Some(employee_id));
        assert_eq!(actor.role, Role::Employee);
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let claims = Claims::new(UserId::new(), None, "janitor", Utc::now());
        assert!(matches!(
            AuthUser(claims).actor(),
            Err(ApiError::App(kawani_shared::AppError::Forbidden(_)))
        ));
    }
}
