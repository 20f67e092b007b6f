use crate::auth::{
    AuthConfig,
    types::{AuthError, Claims},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::error;

/// JWT 工具函数
pub struct JwtUtils;

impl JwtUtils {
    /// 生成 JWT Token
    pub fn generate_token(subject: &str, config: &AuthConfig) -> Result<String, AuthError> {
        if let Err(validation_error) = config.validate_jwt_secret() {
            error!(
                error = %validation_error,
                "Rejected JWT token generation because secret configuration is insecure"
            );
            return Err(validation_error);
        }

        let now = Utc::now();
        let exp = now + Duration::hours(config.jwt_expiration_hours);

        let claims = Claims {
            sub: subject.to_string(),
            iss: config.jwt_issuer.clone(),
            aud: config.jwt_audience.clone(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let header = Header {
            alg: config.jwt_algorithm,
            ..Header::default()
        };

        encode(
            &header,
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_ref()),
        )
        .map_err(|e| {
            error!(error = %e, "Failed to encode JWT token");
            AuthError::TokenIssue
        })
    }

    /// 验证 JWT Token
    pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, AuthError> {
        config.validate_jwt_secret()?;

        let mut validation = Validation::new(config.jwt_algorithm);
        validation.leeway = config.jwt_leeway_seconds;
        if let Some(issuer) = &config.jwt_issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        if let Some(audience) = &config.jwt_audience {
            validation.set_audience(&[audience.as_str()]);
        }
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::presets;

    #[test]
    fn issued_token_round_trips_subject() {
        let config = presets::development();
        let token = JwtUtils::generate_token("viewer@example.com", &config).unwrap();

        let claims = JwtUtils::verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "viewer@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let issuer = presets::development();
        let verifier = presets::development();
        let token = JwtUtils::generate_token("viewer@example.com", &issuer).unwrap();

        assert!(matches!(
            JwtUtils::verify_token(&token, &verifier),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let config = presets::development().with_jwt_leeway_seconds(0);
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "viewer@example.com".to_string(),
            iss: None,
            aud: None,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_ref()),
        )
        .unwrap();

        assert!(matches!(
            JwtUtils::verify_token(&token, &config),
            Err(AuthError::TokenExpired)
        ));
    }
}
