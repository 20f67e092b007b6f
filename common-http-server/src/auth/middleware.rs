//! Bearer-token authentication middleware.
//!
//! The middleware validates the `Authorization: Bearer <jwt>` header and writes
//! `AuthUser` into request extensions for downstream handlers/guards.

use crate::auth::types::{AuthError, AuthUser};
use crate::auth::{AuthConfig, JwtUtils};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// 提取Bearer token
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthFormat)?;

    let token = auth_str
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthFormat)?;

    if token.is_empty() {
        return Err(AuthError::InvalidAuthFormat);
    }

    Ok(token)
}

/// JWT 认证中间件
pub async fn jwt_auth_middleware(
    State(config): State<Arc<AuthConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = {
        let token = extract_bearer_token(request.headers()).inspect_err(|error| {
            debug!(path = %request.uri().path(), error = %error, "Rejected request without bearer token");
        })?;
        JwtUtils::verify_token(token, &config).inspect_err(|error| {
            warn!(path = %request.uri().path(), error = %error, "Rejected bearer token");
        })?
    };

    let auth_user = AuthUser::from(claims);
    debug!(subject = %auth_user.subject, "JWT authentication successful");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::presets;
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode, header::AUTHORIZATION},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    async fn whoami(Extension(auth_user): Extension<AuthUser>) -> String {
        auth_user.subject
    }

    fn app(config: Arc<AuthConfig>) -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(middleware::from_fn_with_state(config, jwt_auth_middleware))
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let response = app(presets::development().shared())
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let request = HttpRequest::builder()
            .uri("/")
            .header(AUTHORIZATION, "Basic YWRtaW46YWRtaW4=")
            .body(Body::empty())
            .unwrap();

        let response = app(presets::development().shared())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let request = HttpRequest::builder()
            .uri("/")
            .header(AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();

        let response = app(presets::development().shared())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_subject() {
        let config = presets::development().shared();
        let token = JwtUtils::generate_token("viewer@example.com", &config).unwrap();
        let request = HttpRequest::builder()
            .uri("/")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = app(config).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn insecure_secret_is_a_server_error() {
        let mut config = presets::development();
        config.jwt_secret = "your-secret-key".to_string();
        let request = HttpRequest::builder()
            .uri("/")
            .header(AUTHORIZATION, "Bearer dummy-token")
            .body(Body::empty())
            .unwrap();

        let response = app(config.shared()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn extracts_token_after_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn empty_bearer_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidAuthFormat)
        ));
    }
}
