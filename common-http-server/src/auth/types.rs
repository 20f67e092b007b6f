use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

/// Identity established by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// The token subject. Applications decide what it names (an email, an id).
    pub subject: String,
    pub issued_at: usize,
    pub expires_at: usize,
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// 认证错误
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthFormat,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Failed to issue token")]
    TokenIssue,
    #[error("Insecure JWT secret configuration: {0}")]
    InsecureJwtSecret(String),
    #[error("Invalid auth configuration: {0}")]
    InvalidAuthConfig(String),
}

impl From<AuthError> for axum::http::StatusCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenIssue
            | AuthError::InsecureJwtSecret(_)
            | AuthError::InvalidAuthConfig(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            _ => axum::http::StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let error_message = self.to_string();
        let status: axum::http::StatusCode = self.into();
        crate::core::response::ApiResponse::<()>::error_with_status(error_message, status)
            .into_response()
    }
}
