//! `common-http-server` provides a reusable Axum-based HTTP server scaffold.
//!
//! It focuses on four areas:
//! - core bootstrap (`Server`, `ServerConfig`, `AppBuilder`, `AppConfig`)
//! - JWT bearer authentication middleware
//! - request size guards for upload endpoints
//! - monitoring (Prometheus metrics)

pub mod auth;
pub mod core;
pub mod monitoring;
pub mod protection;

// Re-export core modules
pub use core::{
    ApiResponse, AppBuilder, AppConfig, ComponentCheck, ConfigError, CorsConfig, HealthResponse,
    LogFormat, LoggingConfig, REQUEST_ID_HEADER, RequestId, Server, ServerConfig, cors::presets,
    health_check, init_logging, structured_logging_middleware,
};

// Re-export auth modules
pub use auth::{
    AuthConfig, AuthError, AuthUser, Claims, JwtUtils, SharedAuthConfig, auth_subject,
    extract_bearer_token, get_auth_user, jwt_auth_middleware,
};

pub use auth::presets as auth_presets;

// Re-export protection modules
pub use protection::{
    SizeLimitConfig, SizeLimitError, SizeLimitService, content_length_middleware,
    size_limit_presets,
};

// Re-export monitoring modules
pub use monitoring::{
    MetricsCollector, MonitoringState, RequestStats, SharedStats, metrics_endpoint,
    performance_monitoring_middleware,
};
