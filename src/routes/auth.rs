use crate::{
    approval::{generate_token_hex, ApprovalError, VERIFICATION_TOKEN_TTL_HOURS},
    auth::{hash_password, token, verify_password, AuthResponse, LoginRequest, RegisterRequest},
    config::Config,
    error::AppError,
    mailer::{self, Mailer},
    models::User,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Password reset links are deliberately short-lived.
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Register a new user
///
/// Creates the account unverified and unapproved, issues an email
/// verification token and asks the mailer to deliver the link. The account
/// cannot log in until one side of the dual gate opens.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<dyn Mailer>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let email = register_data.email.to_lowercase();

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "User already exists with this email".into(),
        ));
    }

    let password_hash = hash_password(&register_data.password)?;
    let verification_token = generate_token_hex();
    let verification_expiry = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, name, email, password_hash, verification_token, verification_expiry)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&register_data.name)
    .bind(&email)
    .bind(&password_hash)
    .bind(&verification_token)
    .bind(verification_expiry)
    .fetch_one(&**pool)
    .await?;

    // Delivery failures only get logged: the account exists either way and
    // the user can request a resend.
    let (subject, body) = mailer::verification_email(&config.api_url, &verification_token);
    if let Err(e) = mailer.send(&user.email, &subject, &body) {
        log::error!("Failed to send verification email to {}: {}", user.email, e);
    }

    let jwt = token::issue(
        user.id,
        token::ROLE_USER,
        &config.jwt_secret,
        token::USER_TOKEN_TTL_HOURS,
    )?;

    Ok(HttpResponse::Created().json(AuthResponse { token: jwt, user }))
}

/// Login user
///
/// Authenticates credentials and checks the usability gate: the account must
/// be email-verified or admin-approved (either one suffices). An account
/// failing the gate gets a 403 carrying both flags so the frontend can direct
/// the user to the right next step.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let email = login_data.email.to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?;

    // Same response for unknown email and wrong password.
    let user = match user {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };
    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    if !user.approval_state().is_usable() {
        return Ok(HttpResponse::Forbidden().json(json!({
            "error": "Account not verified. Please verify your email or wait for admin approval.",
            "needs_verification": true,
            "email_verified": user.email_verified,
            "approved": user.approved,
        })));
    }

    let jwt = token::issue(
        user.id,
        token::ROLE_USER,
        &config.jwt_secret,
        token::USER_TOKEN_TTL_HOURS,
    )?;

    Ok(HttpResponse::Ok().json(AuthResponse { token: jwt, user }))
}

/// Redeem an email verification token
///
/// The failure response does not distinguish a wrong token from an expired
/// one.
#[get("/verify-email/{token}")]
pub async fn verify_email(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let token_param = path.into_inner();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE verification_token = $1")
        .bind(&token_param)
        .fetch_optional(&**pool)
        .await?
        .ok_or(ApprovalError::InvalidOrExpiredToken)?;

    let mut state = user.approval_state();
    state.redeem_verification_token(
        &token_param,
        Utc::now(),
        config.auto_approve_on_email_verify,
    )?;

    // The token column is part of the WHERE so a concurrent reissue or
    // redeem cannot be overwritten.
    let updated = sqlx::query_as::<_, User>(
        "UPDATE users
         SET email_verified = $1, approved = $2, last_approved_at = $3,
             verification_token = NULL, verification_expiry = NULL, updated_at = now()
         WHERE id = $4 AND verification_token = $5
         RETURNING *",
    )
    .bind(state.email_verified)
    .bind(state.approved)
    .bind(state.last_approved_at)
    .bind(user.id)
    .bind(&token_param)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Verification state changed, please retry".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Email verified successfully",
        "user": updated,
    })))
}

/// Resend the verification email
///
/// Issues a fresh token; the previous link stops working.
#[post("/resend-verification")]
pub async fn resend_verification(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<dyn Mailer>,
    body: web::Json<EmailRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let email = body.email.to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found with this email".into()))?;

    if user.email_verified {
        return Err(AppError::BadRequest("Email is already verified".into()));
    }

    let mut state = user.approval_state();
    let verification_token = state.issue_verification_token(Utc::now());

    sqlx::query(
        "UPDATE users SET verification_token = $1, verification_expiry = $2, updated_at = now()
         WHERE id = $3",
    )
    .bind(&verification_token)
    .bind(state.verification_expiry)
    .bind(user.id)
    .execute(&**pool)
    .await?;

    let (subject, body_html) = mailer::verification_email(&config.api_url, &verification_token);
    if let Err(e) = mailer.send(&user.email, &subject, &body_html) {
        log::error!("Failed to send verification email to {}: {}", user.email, e);
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Verification email sent successfully"
    })))
}

/// Request a password reset link
#[post("/forgot-password")]
pub async fn forgot_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<dyn Mailer>,
    body: web::Json<EmailRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let email = body.email.to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let reset_token = generate_token_hex();
    let reset_expiry = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    sqlx::query(
        "UPDATE users SET reset_token = $1, reset_token_expiry = $2, updated_at = now()
         WHERE id = $3",
    )
    .bind(&reset_token)
    .bind(reset_expiry)
    .bind(user.id)
    .execute(&**pool)
    .await?;

    let (subject, body_html) = mailer::password_reset_email(&config.base_url, &reset_token);
    if let Err(e) = mailer.send(&user.email, &subject, &body_html) {
        log::error!("Failed to send reset email to {}: {}", user.email, e);
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password reset email sent"
    })))
}

/// Reset the password with a token from the reset email
#[post("/reset-password")]
pub async fn reset_password(
    pool: web::Data<PgPool>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let password_hash = hash_password(&body.password)?;

    let result = sqlx::query(
        "UPDATE users
         SET password_hash = $1, reset_token = NULL, reset_token_expiry = NULL, updated_at = now()
         WHERE reset_token = $2 AND reset_token_expiry > $3",
    )
    .bind(&password_hash)
    .bind(&body.token)
    .bind(Utc::now())
    .execute(&**pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BadRequest("Invalid or expired token".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password has been reset successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_request_validation() {
        let valid = EmailRequest {
            email: "someone@example.com".into(),
        };
        assert!(valid.validate().is_ok());

        let invalid = EmailRequest {
            email: "not-an-email".into(),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_reset_password_request_validation() {
        let valid = ResetPasswordRequest {
            token: "sometoken".into(),
            password: "newpassword1".into(),
        };
        assert!(valid.validate().is_ok());

        let short = ResetPasswordRequest {
            token: "sometoken".into(),
            password: "short".into(),
        };
        assert!(short.validate().is_err());
    }
}
