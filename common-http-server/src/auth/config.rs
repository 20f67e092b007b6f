//! Authentication configuration models and presets.

use crate::auth::types::AuthError;
use jsonwebtoken::Algorithm;
use std::sync::Arc;
use uuid::Uuid;

pub type SharedAuthConfig = Arc<AuthConfig>;
const INSECURE_JWT_SECRET_PLACEHOLDER: &str = "your-secret-key";
const MIN_JWT_SECRET_LEN: usize = 32;

/// 认证配置
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub jwt_algorithm: Algorithm,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub jwt_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            jwt_expiration_hours: 24,
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: None,
            jwt_audience: None,
            jwt_leeway_seconds: 0,
        }
    }
}

impl AuthConfig {
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    pub fn with_jwt_expiration_hours(mut self, hours: i64) -> Self {
        self.jwt_expiration_hours = hours;
        self
    }

    pub fn validate_jwt_secret(&self) -> Result<(), AuthError> {
        let secret = self.jwt_secret.trim();

        if secret.is_empty() {
            return Err(AuthError::InsecureJwtSecret(
                "JWT secret must not be empty".to_string(),
            ));
        }

        if secret == INSECURE_JWT_SECRET_PLACEHOLDER {
            return Err(AuthError::InsecureJwtSecret(
                "JWT secret is still using the insecure placeholder".to_string(),
            ));
        }

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AuthError::InsecureJwtSecret(format!(
                "JWT secret must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            )));
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        self.validate_jwt_secret()?;
        if self.jwt_expiration_hours <= 0 {
            return Err(AuthError::InvalidAuthConfig(
                "JWT expiration must be greater than 0 hours".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_jwt_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.jwt_algorithm = algorithm;
        self
    }

    pub fn with_jwt_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.jwt_issuer = Some(issuer.into());
        self
    }

    pub fn with_jwt_audience(mut self, audience: impl Into<String>) -> Self {
        self.jwt_audience = Some(audience.into());
        self
    }

    pub fn with_jwt_leeway_seconds(mut self, leeway_seconds: u64) -> Self {
        self.jwt_leeway_seconds = leeway_seconds;
        self
    }

    pub fn shared(self) -> SharedAuthConfig {
        Arc::new(self)
    }
}

/// 预定义的认证配置
pub mod presets {
    use super::*;

    /// 开发环境配置
    pub fn development() -> AuthConfig {
        AuthConfig {
            jwt_secret: format!("dev-{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            jwt_expiration_hours: 24,
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: None,
            jwt_audience: None,
            jwt_leeway_seconds: 30,
        }
    }

    /// 生产环境配置
    pub fn production(jwt_secret: String) -> AuthConfig {
        AuthConfig {
            jwt_secret,
            jwt_expiration_hours: 24,
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: None,
            jwt_audience: None,
            jwt_leeway_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_secret_is_not_placeholder_and_long_enough() {
        let config = AuthConfig::default();
        assert_ne!(config.jwt_secret, INSECURE_JWT_SECRET_PLACEHOLDER);
        assert!(config.jwt_secret.len() >= MIN_JWT_SECRET_LEN);
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        let config = AuthConfig::default().with_jwt_secret(INSECURE_JWT_SECRET_PLACEHOLDER);
        assert!(matches!(
            config.validate_jwt_secret(),
            Err(AuthError::InsecureJwtSecret(_))
        ));
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = AuthConfig::default().with_jwt_secret("too-short");
        assert!(matches!(
            config.validate(),
            Err(AuthError::InsecureJwtSecret(_))
        ));
    }

    #[test]
    fn non_positive_expiration_is_rejected() {
        let config = AuthConfig::default().with_jwt_expiration_hours(0);
        assert!(matches!(
            config.validate(),
            Err(AuthError::InvalidAuthConfig(_))
        ));
    }
}
