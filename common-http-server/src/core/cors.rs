//! CORS configuration helpers and presets.

use crate::core::server::ConfigError;
use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_MAX_AGE_SECS: u64 = 86400;

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    /// 预检请求缓存时间（秒）
    pub max_age: Option<u64>,
    /// Accept any origin. Only meant for local development.
    pub dev_mode_allow_all: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            allowed_headers: ["Content-Type", "Authorization", "X-Request-ID"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            exposed_headers: vec!["X-Request-ID".to_string()],
            allow_credentials: false,
            max_age: Some(DEFAULT_MAX_AGE_SECS),
            dev_mode_allow_all: false,
        }
    }
}

impl CorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置允许的源
    pub fn allowed_origins<S: AsRef<str>>(mut self, origins: impl IntoIterator<Item = S>) -> Self {
        self.allowed_origins = origins
            .into_iter()
            .map(|origin| origin.as_ref().trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        self
    }

    pub fn allowed_methods(mut self, methods: Vec<&str>) -> Self {
        self.allowed_methods = methods.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn allowed_headers(mut self, headers: Vec<&str>) -> Self {
        self.allowed_headers = headers.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    pub fn max_age(mut self, max_age: u64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// 设置开发模式（允许所有源）
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode_allow_all = dev_mode;
        self
    }

    fn header_names(values: &[String]) -> Vec<HeaderName> {
        values
            .iter()
            .filter_map(|s| HeaderName::from_str(s).ok())
            .collect()
    }

    /// 构建生产环境 CORS 层
    pub fn build_production_layer(&self) -> CorsLayer {
        let mut cors = CorsLayer::new();

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        }

        let methods: Vec<Method> = self
            .allowed_methods
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if !methods.is_empty() {
            cors = cors.allow_methods(methods);
        }

        let headers = Self::header_names(&self.allowed_headers);
        if !headers.is_empty() {
            cors = cors.allow_headers(headers);
        }

        let exposed = Self::header_names(&self.exposed_headers);
        if !exposed.is_empty() {
            cors = cors.expose_headers(exposed);
        }

        if self.allow_credentials {
            cors = cors.allow_credentials(true);
        }

        if let Some(max_age) = self.max_age {
            cors = cors.max_age(Duration::from_secs(max_age));
        }

        cors
    }

    /// 构建开发环境 CORS 层（允许所有）
    pub fn build_development_layer(&self) -> CorsLayer {
        // Wildcards cannot be combined with credentials, so dev mode never
        // advertises them.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Self::header_names(&self.exposed_headers))
            .max_age(Duration::from_secs(
                self.max_age.unwrap_or(DEFAULT_MAX_AGE_SECS),
            ))
    }

    /// 根据环境配置构建 CORS 层
    pub fn build_layer(&self) -> CorsLayer {
        if self.dev_mode_allow_all {
            tracing::warn!("CORS is running in development mode - allowing all origins");
            self.build_development_layer()
        } else {
            tracing::info!(
                origins = ?self.allowed_origins,
                "CORS is running in production mode with restricted origins"
            );
            self.build_production_layer()
        }
    }

    /// 验证 CORS 配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.is_empty() && !self.dev_mode_allow_all {
            return Err(ConfigError::EmptyAllowedOrigins);
        }

        if self.allowed_methods.is_empty() {
            return Err(ConfigError::EmptyAllowedMethods);
        }

        if self.allowed_headers.is_empty() {
            return Err(ConfigError::EmptyAllowedHeaders);
        }

        Ok(())
    }
}

/// 预定义的 CORS 配置
pub mod presets {
    use super::*;

    /// 开发环境配置
    pub fn development() -> CorsConfig {
        CorsConfig::new().dev_mode(true)
    }

    /// Browser front-end served from a known set of origins.
    pub fn web_frontend<S: AsRef<str>>(origins: impl IntoIterator<Item = S>) -> CorsConfig {
        CorsConfig::new()
            .allowed_origins(origins)
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_origins_are_rejected_outside_dev_mode() {
        let config = CorsConfig::new().allowed_origins(Vec::<&str>::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyAllowedOrigins)
        ));
        assert!(config.dev_mode(true).validate().is_ok());
    }

    #[test]
    fn blank_origins_are_dropped() {
        let config = presets::web_frontend(["https://app.example.com", " ", ""]);
        assert_eq!(config.allowed_origins, vec!["https://app.example.com"]);
        assert!(config.allow_credentials);
    }
}
