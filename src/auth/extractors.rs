use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::{token, AuthError};
use crate::config::Config;
use crate::error::AppError;

/// The authenticated caller of a request.
///
/// On routes behind `AuthMiddleware` this reads the claims the middleware
/// already verified. On mixed scopes (where some routes are public) it falls
/// back to verifying the `Authorization` header itself, so handlers only need
/// to take this extractor to be protected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<token::Claims>().cloned();
        if let Some(claims) = claims {
            return ready(Ok(AuthenticatedUser {
                id: claims.sub,
                role: claims.role,
            }));
        }

        let secret = match req.app_data::<web::Data<Config>>() {
            Some(config) => config.jwt_secret.clone(),
            None => {
                let err =
                    AppError::InternalServerError("Application configuration missing".into());
                return ready(Err(err.into()));
            }
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let result = match header {
            Some(raw) => token::verify(raw, &secret)
                .map(|claims| AuthenticatedUser {
                    id: claims.sub,
                    role: claims.role,
                })
                .map_err(|e| AppError::from(e).into()),
            None => Err(AppError::from(AuthError::NoToken).into()),
        };
        ready(result)
    }
}

/// The administrator resolved by `AdminAuthMiddleware`.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl FromRequest for AdminPrincipal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AdminPrincipal>().cloned() {
            Some(principal) => ready(Ok(principal)),
            // Only reachable if the route was registered outside the admin
            // scope; reject rather than guess.
            None => ready(Err(AppError::Unauthorized(
                "Admin authentication required".to_string(),
            )
            .into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://unused".into(),
            server_host: "127.0.0.1".into(),
            server_port: 8080,
            jwt_secret: "extractor-test-secret".into(),
            api_url: "http://127.0.0.1:8080".into(),
            base_url: "http://localhost:5173".into(),
            auto_approve_on_email_verify: false,
        }
    }

    #[actix_rt::test]
    async fn test_authenticated_user_from_extensions() {
        let req = test::TestRequest::default().to_http_request();
        let user_id = Uuid::new_v4();
        req.extensions_mut().insert(token::Claims {
            sub: user_id,
            role: token::ROLE_USER.to_string(),
            exp: 0,
            iat: 0,
        });

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.id, user_id);
        assert_eq!(extracted.role, token::ROLE_USER);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_from_header() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let jwt = token::issue(user_id, token::ROLE_USER, &config.jwt_secret, 1).unwrap();

        let req = test::TestRequest::default()
            .app_data(web::Data::new(config))
            .insert_header(("Authorization", format!("Bearer {}", jwt)))
            .to_http_request();

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.id, user_id);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_missing_token() {
        let req = test::TestRequest::default()
            .app_data(web::Data::new(test_config()))
            .to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert!(result.is_err());

        let response = result.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_admin_principal_requires_middleware() {
        let req = test::TestRequest::default().to_http_request();
        let mut payload = Payload::None;
        let result = AdminPrincipal::from_request(&req, &mut payload).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().error_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
