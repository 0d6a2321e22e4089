//! Admin JWT creation and verification.

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use learnhub_config::JwtConfig;
use learnhub_core::AppError;

use crate::claims::{AdminClaims, AdminRole};

/// Creates an admin access token.
///
/// School admins must carry a `school_id`; the token is refused otherwise so
/// that every school-scoped request can be resolved without a lookup.
///
/// # Errors
///
/// Returns a bad request for a school admin without a school, or an internal
/// error if encoding fails.
pub fn create_admin_token(
    subject: &str,
    role: AdminRole,
    school_id: Option<Uuid>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    if role == AdminRole::SchoolAdmin && school_id.is_none() {
        return Err(AppError::bad_request(anyhow!(
            "School admin tokens require a school_id"
        )));
    }

    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = AdminClaims {
        sub: subject.to_string(),
        role,
        school_id,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to create token: {}", e)))
}

/// Verifies signature and expiry and returns the claims.
///
/// # Errors
///
/// Returns `401 Unauthorized` for any invalid, tampered or expired token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<AdminClaims, AppError> {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(expiry: i64) -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: expiry,
        }
    }

    #[test]
    fn test_round_trip_school_admin() {
        let school_id = Uuid::new_v4();
        let token = create_admin_token(
            "admin@school.test",
            AdminRole::SchoolAdmin,
            Some(school_id),
            &config(3600),
        )
        .unwrap();

        let claims = verify_token(&token, &config(3600)).unwrap();
        assert_eq!(claims.sub, "admin@school.test");
        assert_eq!(claims.role, AdminRole::SchoolAdmin);
        assert_eq!(claims.school_id, Some(school_id));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_school_admin_requires_school() {
        let result = create_admin_token("a", AdminRole::SchoolAdmin, None, &config(3600));
        assert_eq!(result.unwrap_err().status.as_u16(), 400);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_admin_token("a", AdminRole::SystemAdmin, None, &config(3600)).unwrap();
        let other = JwtConfig {
            secret: "other-secret".to_string(),
            access_token_expiry: 3600,
        };
        assert_eq!(verify_token(&token, &other).unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims_config = config(3600);
        let now = Utc::now().timestamp() as usize;
        let claims = AdminClaims {
            sub: "a".to_string(),
            role: AdminRole::SystemAdmin,
            school_id: None,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(claims_config.secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, &claims_config).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not.a.jwt", &config(3600)).is_err());
    }
}
