use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::extractors::AdminPrincipal;
use crate::auth::{token, AuthError};
use crate::config::Config;
use crate::error::AppError;
use crate::models::User;

/// Pulls the bearer token out of the `Authorization` header.
pub fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Session-token gate for protected scopes.
///
/// Verifies the bearer token, confirms its subject still exists, and inserts
/// the decoded [`token::Claims`] into request extensions, where the
/// `AuthenticatedUser` extractor picks them up. A valid token whose user has
/// since been deleted is rejected as unauthorized, not passed through.
/// Routes that are only partially protected skip this middleware and rely on
/// the extractor's own header fallback instead.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let secret = req
                .app_data::<web::Data<Config>>()
                .map(|config| config.jwt_secret.clone())
                .ok_or_else(|| {
                    Error::from(AppError::InternalServerError(
                        "Application configuration missing".into(),
                    ))
                })?;
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(AppError::InternalServerError(
                        "Database pool missing".into(),
                    ))
                })?;

            let token = bearer_token(&req)
                .ok_or_else(|| Error::from(AppError::from(AuthError::NoToken)))?;
            let claims =
                token::verify(&token, &secret).map_err(|e| Error::from(AppError::from(e)))?;

            let principal: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE id = $1")
                    .bind(claims.sub)
                    .fetch_optional(&**pool)
                    .await
                    .map_err(|e| Error::from(AppError::from(e)))?;
            if principal.is_none() {
                return Err(AppError::from(AuthError::PrincipalNotFound).into());
            }

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

/// Admin gate for the `/api/admin` scope.
///
/// Verifies the token itself, then resolves the principal against the
/// database: admin-role tokens load from the admins table, user tokens load
/// the user and pass only if either of the two role fields marks it as an
/// administrator. On success an [`AdminPrincipal`] is inserted into request
/// extensions.
pub struct AdminAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdminAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AdminAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let secret = req
                .app_data::<web::Data<Config>>()
                .map(|config| config.jwt_secret.clone())
                .ok_or_else(|| {
                    Error::from(AppError::InternalServerError(
                        "Application configuration missing".into(),
                    ))
                })?;
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(AppError::InternalServerError(
                        "Database pool missing".into(),
                    ))
                })?;

            let token = bearer_token(&req)
                .ok_or_else(|| Error::from(AppError::from(AuthError::NoToken)))?;
            let claims =
                token::verify(&token, &secret).map_err(|e| Error::from(AppError::from(e)))?;

            let principal = resolve_admin(&pool, &claims)
                .await
                .map_err(Error::from)?;

            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(principal);
            service.call(req).await
        })
    }
}

/// Resolves verified claims to an administrator principal.
///
/// Tokens minted by the admin login carry `role == "admin"` and resolve
/// against the admins table. Ordinary user tokens are accepted too when the
/// user record itself is an administrator; both the legacy `role` enum and
/// the `user_type` field can mark that, populated by different upstream
/// paths, so either one suffices.
async fn resolve_admin(pool: &PgPool, claims: &token::Claims) -> Result<AdminPrincipal, AppError> {
    if claims.role == token::ROLE_ADMIN {
        let admin = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, name, email FROM admins WHERE id = $1",
        )
        .bind(claims.sub)
        .fetch_optional(pool)
        .await?;

        let (id, name, email) = admin.ok_or(AuthError::PrincipalNotFound)?;
        return Ok(AdminPrincipal { id, name, email });
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    if !user.is_admin() {
        return Err(AuthError::Forbidden.into());
    }

    Ok(AdminPrincipal {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}
