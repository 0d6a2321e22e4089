//! Route-layer guards for admin routes.
//!
//! The verified [`AdminUser`] is stored in the request extensions so
//! handlers extracting it do not verify the token twice.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use learnhub_auth::AdminRole;
use learnhub_core::errors::AppError;

use crate::middleware::auth::AdminUser;
use crate::state::AppState;

pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed_roles: &[AdminRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let admin = AdminUser::from_request_parts(&mut parts, state).await?;
    check_any_role(&admin, allowed_roles)?;

    parts.extensions.insert(admin);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub fn check_any_role(admin: &AdminUser, allowed_roles: &[AdminRole]) -> Result<(), AppError> {
    if allowed_roles.contains(&admin.0.role) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Access denied for role {}",
            admin.0.role.as_str()
        )))
    }
}

pub async fn require_system_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(&state, req, next, &[AdminRole::SystemAdmin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// School admins and system admins.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(
        &state,
        req,
        next,
        &[AdminRole::SystemAdmin, AdminRole::SchoolAdmin],
    )
    .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_auth::AdminClaims;
    use uuid::Uuid;

    fn admin(role: AdminRole) -> AdminUser {
        AdminUser(AdminClaims {
            sub: "ops@learnhub.test".to_string(),
            role,
            school_id: Some(Uuid::new_v4()),
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_check_any_role() {
        let school_admin = admin(AdminRole::SchoolAdmin);
        assert!(check_any_role(&school_admin, &[AdminRole::SchoolAdmin]).is_ok());

        let err = check_any_role(&school_admin, &[AdminRole::SystemAdmin]).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.message(), "Access denied for role school_admin");
    }
}
