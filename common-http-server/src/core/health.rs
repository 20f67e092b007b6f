use crate::core::response::HealthResponse;
use axum::response::IntoResponse;

/// 健康检查端点
pub async fn health_check() -> impl IntoResponse {
    tracing::debug!("Health check requested");
    HealthResponse::healthy()
}

/// Liveness plus process uptime-independent build info. Applications that own
/// external dependencies register their own detailed probe instead.
pub async fn detailed_health_check() -> impl IntoResponse {
    tracing::debug!("Detailed health check requested");
    HealthResponse::healthy()
}
