//! Request size-limiting middleware.
//!
//! Only request metadata is inspected here. Bodies are never buffered, so the
//! guard is safe to place in front of streaming upload handlers; handlers that
//! stream must still enforce the byte ceiling themselves.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::CONTENT_LENGTH},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SizeLimitConfig {
    pub max_body_size: u64,
    pub max_header_size: usize,
    pub max_url_length: usize,
    pub log_violations: bool,
}

impl Default for SizeLimitConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
            max_header_size: 8 * 1024,       // 8KB
            max_url_length: 2048,
            log_violations: true,
        }
    }
}

impl SizeLimitConfig {
    pub fn new(max_body_size: u64) -> Self {
        Self {
            max_body_size,
            ..Default::default()
        }
    }

    pub fn max_header_size(mut self, size: usize) -> Self {
        self.max_header_size = size;
        self
    }

    pub fn max_url_length(mut self, length: usize) -> Self {
        self.max_url_length = length;
        self
    }

    pub fn log_violations(mut self, log: bool) -> Self {
        self.log_violations = log;
        self
    }

    pub fn build(self) -> Arc<SizeLimitService> {
        Arc::new(SizeLimitService::new(self))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_body_size == 0 {
            return Err("max_body_size must be greater than 0".to_string());
        }
        if self.max_header_size == 0 {
            return Err("max_header_size must be greater than 0".to_string());
        }
        if self.max_url_length == 0 {
            return Err("max_url_length must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SizeLimitService {
    config: SizeLimitConfig,
}

impl SizeLimitService {
    pub fn new(config: SizeLimitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizeLimitConfig {
        &self.config
    }

    pub fn check_request_size(&self, request: &Request) -> Result<(), SizeLimitError> {
        let url_length = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().len())
            .unwrap_or(0);
        if url_length > self.config.max_url_length {
            return Err(self.violation(SizeLimitError::UrlTooLong {
                actual: url_length,
                limit: self.config.max_url_length,
            }));
        }

        let header_size = calculate_header_size(request.headers());
        if header_size > self.config.max_header_size {
            return Err(self.violation(SizeLimitError::HeadersTooLarge {
                actual: header_size,
                limit: self.config.max_header_size,
            }));
        }

        if let Some(size) = declared_content_length(request.headers())
            && size > self.config.max_body_size
        {
            return Err(self.violation(SizeLimitError::BodyTooLarge {
                actual: size,
                limit: self.config.max_body_size,
            }));
        }

        Ok(())
    }

    fn violation(&self, error: SizeLimitError) -> SizeLimitError {
        if self.config.log_violations {
            warn!(error = %error, "Request rejected by size limit");
        }
        error
    }
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn calculate_header_size(headers: &HeaderMap) -> usize {
    let mut size = 0;
    for (name, value) in headers {
        size += name.as_str().len();
        size += value.len();
        size += 4; // ": " + "\r\n"
    }
    size + 2 // Final "\r\n"
}

#[derive(Debug, thiserror::Error)]
pub enum SizeLimitError {
    #[error("Request body too large: {actual} bytes (limit: {limit} bytes)")]
    BodyTooLarge { actual: u64, limit: u64 },

    #[error("Request headers too large: {actual} bytes (limit: {limit} bytes)")]
    HeadersTooLarge { actual: usize, limit: usize },

    #[error("Request URL too long: {actual} characters (limit: {limit} characters)")]
    UrlTooLong { actual: usize, limit: usize },
}

impl IntoResponse for SizeLimitError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            SizeLimitError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            SizeLimitError::HeadersTooLarge { .. } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            SizeLimitError::UrlTooLong { .. } => StatusCode::URI_TOO_LONG,
        };

        crate::core::response::ApiResponse::<()>::error_with_status(self.to_string(), status)
            .into_response()
    }
}

/// Rejects requests whose declared `Content-Length` (or URL/headers) exceed
/// the configured limits, without touching the body.
pub async fn content_length_middleware(
    State(service): State<Arc<SizeLimitService>>,
    request: Request,
    next: Next,
) -> Result<Response, SizeLimitError> {
    service.check_request_size(&request)?;
    Ok(next.run(request).await)
}

pub mod presets {
    use super::*;

    pub fn api() -> SizeLimitConfig {
        SizeLimitConfig::new(5 * 1024 * 1024) // 5MB
            .max_header_size(8 * 1024)
            .max_url_length(2048)
    }

    /// Large media uploads; the body ceiling is caller-supplied.
    pub fn file_upload(max_body_size: u64) -> SizeLimitConfig {
        SizeLimitConfig::new(max_body_size)
            .max_header_size(16 * 1024)
            .max_url_length(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::post};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn app(limit: u64) -> Router {
        Router::new()
            .route("/upload", post(ok_handler))
            .layer(middleware::from_fn_with_state(
                presets::file_upload(limit).build(),
                content_length_middleware,
            ))
    }

    #[tokio::test]
    async fn declared_length_over_limit_is_rejected_with_413() {
        let response = app(16)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header(CONTENT_LENGTH, "17")
                    .body(Body::from(vec![0u8; 17]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn declared_length_at_limit_passes() {
        let response = app(16)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header(CONTENT_LENGTH, "16")
                    .body(Body::from(vec![0u8; 16]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn header_size_counts_separators() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer token".parse().unwrap());
        assert_eq!(calculate_header_size(&headers), 13 + 12 + 4 + 2);
    }

    #[test]
    fn zero_body_limit_is_invalid() {
        assert!(SizeLimitConfig::new(0).validate().is_err());
        assert!(presets::api().validate().is_ok());
    }
}
