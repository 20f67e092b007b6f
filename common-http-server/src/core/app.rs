//! Application router builder.
//!
//! `AppBuilder` only focuses on route composition. Runtime concerns such as
//! logging/tracing/cors layers are applied by `Server::start` (or
//! `AppBuilder::into_router` when serving in-process).

use crate::core::{
    health::{detailed_health_check, health_check},
    response::ApiResponse,
    server::{AppConfig, ConfigError, StartupValidation, apply_app_layers},
};
use crate::monitoring::metrics_endpoint;
use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{MethodRouter, get},
};
use std::convert::Infallible;
use tower::Service;

/// 应用构建器
pub struct AppBuilder {
    router: Router,
    app_config: AppConfig,
    startup_validations: Vec<StartupValidation>,
    known_endpoints: Vec<String>,
}

impl AppBuilder {
    /// 创建新的应用构建器
    pub fn new(app_config: AppConfig) -> Self {
        Self {
            router: Router::new()
                .route("/health", get(health_check))
                .route("/health/detailed", get(detailed_health_check))
                .route("/api/v1/status", get(health_check)),
            app_config,
            startup_validations: Vec::new(),
            known_endpoints: vec![
                "/health".to_string(),
                "/health/detailed".to_string(),
                "/api/v1/status".to_string(),
            ],
        }
    }

    /// 添加路由
    pub fn route(mut self, path: &str, method: MethodRouter) -> Self {
        self.router = self.router.route(path, method);
        self.known_endpoints.push(path.to_string());
        self
    }

    /// 嵌套路由
    pub fn nest(mut self, path: &str, router: Router) -> Self {
        self.router = self.router.nest(path, router);
        self.known_endpoints.push(format!("{}/*", path));
        self
    }

    /// Merge a router whose routes are already absolute.
    pub fn merge(mut self, router: Router) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// Mount a tower service (e.g. a static file server) under `path`.
    pub fn nest_service<S>(mut self, path: &str, service: S) -> Self
    where
        S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        self.router = self.router.nest_service(path, service);
        self.known_endpoints.push(format!("{}/*", path));
        self
    }

    /// Register a startup validation check that runs before binding the server
    /// socket. Use this for fail-fast checks on external/auth/protection config.
    pub fn startup_validation<F>(mut self, validation: F) -> Self
    where
        F: Fn() -> Result<(), ConfigError> + Send + Sync + 'static,
    {
        self.startup_validations.push(Box::new(validation));
        self
    }

    /// Validate shared auth config (JWT secret/expiry etc.) during startup.
    pub fn validate_auth_config(self, auth_config: crate::auth::SharedAuthConfig) -> Self {
        self.startup_validation(move || {
            auth_config
                .validate()
                .map_err(|e| ConfigError::InvalidAuth(e.to_string()))
        })
    }

    /// Validate size-limit config during startup.
    pub fn validate_size_limit_config(
        self,
        size_limit_config: crate::protection::SizeLimitConfig,
    ) -> Self {
        self.startup_validation(move || {
            size_limit_config
                .validate()
                .map_err(ConfigError::InvalidProtection)
        })
    }

    /// Consume the builder and return:
    /// - the finalized router (with metrics route and fallback)
    /// - the app runtime configuration used by `Server`
    /// - registered startup validations
    /// - the sorted list of known endpoints
    pub(crate) fn into_parts(self) -> (Router, AppConfig, Vec<StartupValidation>, Vec<String>) {
        let mut endpoints = self.known_endpoints;
        let mut router = self.router;

        if let Some(monitoring) = &self.app_config.monitoring {
            router = router.merge(
                Router::new()
                    .route("/metrics", get(metrics_endpoint))
                    .with_state(monitoring.clone()),
            );
            endpoints.push("/metrics".to_string());
        }

        endpoints.sort();
        endpoints.dedup();

        (
            router.fallback(fallback_handler),
            self.app_config,
            self.startup_validations,
            endpoints,
        )
    }

    /// Run startup validations and return the fully layered router without
    /// binding a socket or touching the global logger.
    pub fn into_router(self) -> Result<Router, ConfigError> {
        let (router, app_config, startup_validations, _) = self.into_parts();
        app_config.validate()?;
        for startup_validation in startup_validations {
            startup_validation()?;
        }
        Ok(apply_app_layers(router, &app_config))
    }
}

/// 默认的 fallback 处理器
async fn fallback_handler() -> ApiResponse<()> {
    ApiResponse::error_with_status("Endpoint not found".to_string(), StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::MonitoringState;
    use axum::body::Body;
    use tower::ServiceExt;

    async fn custom_handler() -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn keeps_custom_routes_when_building() {
        let (app, _, _, endpoints) = AppBuilder::new(AppConfig::default())
            .route("/custom", get(custom_handler))
            .into_parts();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/custom")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(endpoints.iter().any(|endpoint| endpoint == "/custom"));
    }

    #[tokio::test]
    async fn unknown_route_falls_back_to_404_envelope() {
        let app = AppBuilder::new(AppConfig::default().with_cors(false))
            .into_router()
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_route_is_mounted_when_monitoring_enabled() {
        let app = AppBuilder::new(AppConfig::default().with_monitoring(MonitoringState::new()))
            .into_router()
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn failing_startup_validation_aborts_router_build() {
        let result = AppBuilder::new(AppConfig::default())
            .startup_validation(|| Err(ConfigError::InvalidAuth("weak secret".into())))
            .into_router();

        assert!(matches!(result, Err(ConfigError::InvalidAuth(_))));
    }
}
