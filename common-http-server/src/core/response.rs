use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

/// 统一的 API 响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub request_id: Option<String>,
    pub status_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_status(data, StatusCode::OK)
    }

    pub fn success_with_status(data: T, status: StatusCode) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_id: None,
            status_code: Some(status.as_u16()),
        }
    }

    pub fn error(error: String) -> Self {
        Self::error_with_status(error, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn error_with_status(error: String, status: StatusCode) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            request_id: None,
            status_code: Some(status.as_u16()),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let default_status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let status = self
            .status_code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(default_status);

        (status, Json(self)).into_response()
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<ComponentCheck>,
}

/// One dependency probed by a detailed health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentCheck {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            detail: None,
        }
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks: Vec::new(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>, version: impl Into<String>) -> Self {
        self.service = service.into();
        self.version = version.into();
        self
    }

    /// Attaches component checks; any failed check flips the status to `unhealthy`.
    pub fn with_checks(mut self, checks: Vec<ComponentCheck>) -> Self {
        if checks.iter().any(|check| !check.healthy) {
            self.status = "unhealthy".to_string();
        }
        self.checks = checks;
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> axum::response::Response {
        let status = if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_check_marks_response_unhealthy() {
        let response = HealthResponse::healthy().with_checks(vec![
            ComponentCheck::ok("database"),
            ComponentCheck::failed("storage", "bucket unreachable"),
        ]);
        assert!(!response.is_healthy());
        assert_eq!(
            response.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn error_envelope_keeps_status_code() {
        let response = ApiResponse::<()>::error_with_status("nope".into(), StatusCode::CONFLICT)
            .with_request_id("req-1");
        assert_eq!(response.status_code, Some(409));
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
        assert_eq!(response.into_response().status(), StatusCode::CONFLICT);
    }
}
