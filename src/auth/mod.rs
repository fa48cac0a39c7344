pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::User;

// Re-export necessary items
pub use extractors::{AdminPrincipal, AuthenticatedUser};
pub use middleware::{AdminAuthMiddleware, AuthMiddleware};
pub use password::{hash_password, verify_password};
pub use token::{Claims, ROLE_ADMIN, ROLE_USER};

/// Errors produced by the access control gate while resolving a bearer token
/// to a principal. Converted to 401/403 responses at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was supplied.
    NoToken,
    /// The token is malformed or its signature does not verify.
    InvalidToken,
    /// The token verified but has expired.
    TokenExpired,
    /// The token verified but its subject no longer exists.
    PrincipalNotFound,
    /// The principal exists but lacks the required role.
    Forbidden,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::NoToken => write!(f, "No token provided, authorization denied"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::PrincipalNotFound => write!(f, "Token is not valid - user not found"),
            AuthError::Forbidden => write!(f, "Access denied. Admin privileges required"),
        }
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    #[validate(email)]
    pub email: String,
    /// User's password. Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address for the new account.
    #[validate(email)]
    pub email: String,
    /// Password for the new account. Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response after successful authentication (login or registration).
/// The user is serialized through its safe representation: credentials and
/// tokens are never included.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The JWT for session authentication.
    pub token: String,
    /// The authenticated user record.
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let short_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "Ama Mensah".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let empty_name_register = RegisterRequest {
            name: "".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(empty_name_register.validate().is_err());

        let short_password_register = RegisterRequest {
            name: "Ama Mensah".to_string(),
            email: "test@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password_register.validate().is_err());
    }
}
