//! Multipart video upload.
//!
//! The declared `Content-Length` is checked before the body is read; the
//! streamed byte count is checked again while buffering the file part.

use crate::handler::extract::MultipartBody;
use crate::service::error::ServiceError;
use crate::service::upload_service::{UploadRequest, UploadService, validate_video_type};
use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Multipart, multipart::MultipartError},
    http::StatusCode,
    middleware,
    response::Response,
    routing::post,
};
use bytes::BytesMut;
use common_http_server_rs::{
    AuthUser, SharedAuthConfig, SizeLimitConfig, content_length_middleware,
    jwt_auth_middleware, size_limit_presets,
};

use super::success_response;

/// Room for multipart boundaries and the non-file fields.
pub(crate) const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

fn request_ceiling(max_upload_bytes: u64) -> u64 {
    max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
}

/// Header-level limits for the upload route.
pub(crate) fn upload_size_limits(max_upload_bytes: u64) -> SizeLimitConfig {
    size_limit_presets::file_upload(request_ceiling(max_upload_bytes)).log_violations(true)
}

pub(crate) fn router(service: UploadService, auth_config: SharedAuthConfig) -> Router {
    let size_limits = upload_size_limits(service.max_upload_bytes()).build();
    let body_limit =
        usize::try_from(request_ceiling(service.max_upload_bytes())).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/upload",
            post(move |auth_user: Extension<AuthUser>, body: MultipartBody| {
                upload_video(service.clone(), auth_user, body)
            }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            size_limits,
            content_length_middleware,
        ))
        .layer(middleware::from_fn_with_state(auth_config, jwt_auth_middleware))
}

async fn upload_video(
    service: UploadService,
    Extension(auth_user): Extension<AuthUser>,
    MultipartBody(multipart): MultipartBody,
) -> Result<Response, ServiceError> {
    let upload = read_upload(multipart, service.max_upload_bytes())
        .await
        .inspect_err(|error| {
            tracing::warn!(subject = %auth_user.subject, error = %error, "Rejected video upload");
            service.record_rejection();
        })?;

    let receipt = service.store(&auth_user.subject, upload).await?;
    Ok(success_response(StatusCode::OK, receipt))
}

fn malformed(error: MultipartError) -> ServiceError {
    ServiceError::bad_request(format!("malformed multipart body: {}", error.body_text()))
}

async fn read_upload(
    mut multipart: Multipart,
    max_upload_bytes: u64,
) -> Result<UploadRequest, ServiceError> {
    let mut file = None;
    let mut title = None;

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let original_filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_owned);
                validate_video_type(&original_filename, content_type.as_deref())?;

                let mut buffer = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                    if (buffer.len() + chunk.len()) as u64 > max_upload_bytes {
                        return Err(ServiceError::bad_request(format!(
                            "file exceeds the {max_upload_bytes} byte upload limit"
                        )));
                    }
                    buffer.extend_from_slice(&chunk);
                }
                file = Some((original_filename, content_type, buffer.freeze()));
            }
            Some("title") => title = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    let (original_filename, content_type, bytes) =
        file.ok_or_else(|| ServiceError::bad_request("multipart field `file` is required"))?;

    Ok(UploadRequest {
        original_filename,
        content_type,
        title,
        bytes,
    })
}
