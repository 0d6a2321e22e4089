use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use learnhub_auth::{AdminClaims, verify_token};
use learnhub_core::errors::AppError;
use learnhub_models::ids::SchoolId;
use uuid::Uuid;

use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

/// An authenticated administrator, from a JWT minted by the CLI.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminClaims);

impl AdminUser {
    pub fn is_system_admin(&self) -> bool {
        self.0.is_system_admin()
    }

    /// The school a request acts on.
    ///
    /// School admins are pinned to the school in their token; asking for a
    /// different one is forbidden. System admins must name a school.
    pub fn school_scope(&self, requested: Option<Uuid>) -> Result<SchoolId, AppError> {
        if self.is_system_admin() {
            return requested.map(SchoolId::from).ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!(
                    "school_id is required for system admins"
                ))
            });
        }

        let own = self
            .0
            .school_id
            .ok_or_else(|| AppError::forbidden("Admin is not assigned to a school"))?;

        match requested {
            Some(other) if other != own => Err(AppError::forbidden(
                "Cannot access students of another school",
            )),
            _ => Ok(SchoolId::from(own)),
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already verified by the role middleware.
        if let Some(admin) = parts.extensions.get::<AdminUser>() {
            return Ok(admin.clone());
        }

        let token = bearer_token(parts)?;
        let claims = verify_token(token, &state.jwt_config)?;
        Ok(AdminUser(claims))
    }
}

/// The raw bearer token of a student or guest session.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts).map(|token| SessionToken(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use learnhub_auth::AdminRole;

    fn admin(role: AdminRole, school_id: Option<Uuid>) -> AdminUser {
        AdminUser(AdminClaims {
            sub: "ops@learnhub.test".to_string(),
            role,
            school_id,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_school_admin_is_pinned_to_own_school() {
        let school = Uuid::new_v4();
        let user = admin(AdminRole::SchoolAdmin, Some(school));

        assert_eq!(user.school_scope(None).unwrap(), SchoolId::from(school));
        assert_eq!(user.school_scope(Some(school)).unwrap(), SchoolId::from(school));
        assert_eq!(
            user.school_scope(Some(Uuid::new_v4())).unwrap_err().status.as_u16(),
            403
        );
    }

    #[test]
    fn test_system_admin_must_name_school() {
        let user = admin(AdminRole::SystemAdmin, None);
        let school = Uuid::new_v4();

        assert_eq!(user.school_scope(None).unwrap_err().status.as_u16(), 400);
        assert_eq!(user.school_scope(Some(school)).unwrap(), SchoolId::from(school));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "abc123");

        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap_err().status.as_u16(), 401);

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(bearer_token(&parts).unwrap_err().status.as_u16(), 401);
    }
}
