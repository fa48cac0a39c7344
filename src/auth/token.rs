use crate::auth::AuthError;
use crate::error::AppError;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Regular user sessions last a week.
pub const USER_TOKEN_TTL_HOURS: i64 = 24 * 7;
/// Admin sessions last a day.
pub const ADMIN_TOKEN_TTL_HOURS: i64 = 24;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Represents the claims encoded within a session JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the record's unique identifier.
    pub sub: Uuid,
    /// Role the token was minted for: [`ROLE_USER`] or [`ROLE_ADMIN`].
    /// Admin-role tokens resolve against the admins table.
    pub role: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
}

/// Mints a session token for a record.
///
/// The signing secret comes from [`crate::config::Config`], resolved once at
/// startup; nothing here touches the environment.
pub fn issue(record_id: Uuid, role: &str, secret: &str, ttl_hours: i64) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::hours(ttl_hours))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: record_id,
        role: role.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a session token and decodes its claims.
///
/// Expired tokens are distinguished from malformed or forged ones so the gate
/// can report `TokenExpired` versus `InvalidToken`.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_for_token_tests";

    #[test]
    fn test_token_issue_and_verify() {
        let user_id = Uuid::new_v4();
        let token = issue(user_id, ROLE_USER, SECRET, USER_TOKEN_TTL_HOURS).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, ROLE_USER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let user_id = Uuid::new_v4();
        // Issued two hours in the past, well beyond the default leeway.
        let token = issue(user_id, ROLE_USER, SECRET, -2).unwrap();
        assert_eq!(verify(&token, SECRET).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue(Uuid::new_v4(), ROLE_ADMIN, SECRET, 1).unwrap();
        assert_eq!(
            verify(&token, "a_completely_different_secret").unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert_eq!(
            verify("not-a-jwt-at-all", SECRET).unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
