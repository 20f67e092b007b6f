pub(crate) mod account_guard;
pub(crate) mod analysis_handler;
pub(crate) mod auth_handler;
mod error_mapper;
pub(crate) mod extract;
pub(crate) mod health_handler;
pub(crate) mod upload_handler;
pub(crate) mod video_handler;


use crate::service::{
    account_service::AccountService, analysis_service::AnalysisService,
    upload_service::UploadService, video_service::VideoService,
};
use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use common_http_server_rs::{ApiResponse, SharedAuthConfig, jwt_auth_middleware};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

/// Everything the HTTP layer needs, built once at startup.
#[derive(Clone)]
pub(crate) struct ApiServices {
    pub(crate) db: Arc<DatabaseConnection>,
    pub(crate) auth_config: SharedAuthConfig,
    pub(crate) accounts: AccountService,
    pub(crate) videos: VideoService,
    pub(crate) analysis: AnalysisService,
    pub(crate) uploads: UploadService,
    pub(crate) storage_provider: &'static str,
}

/// Routes under `/api`: public health and auth, the upload endpoint, and the
/// account-scoped `/api/v1` resources.
pub(crate) fn api_router(services: ApiServices) -> Router {
    Router::new()
        .merge(health_handler::router(
            services.db.clone(),
            services.storage_provider,
        ))
        .nest("/auth", auth_handler::router(services.accounts.clone()))
        .nest(
            "/videos",
            upload_handler::router(services.uploads.clone(), services.auth_config.clone()),
        )
        .nest("/v1", api_v1_router(&services))
}

fn api_v1_router(services: &ApiServices) -> Router {
    Router::new()
        .merge(video_handler::router(services.videos.clone()))
        .nest("/analysis", analysis_handler::router(services.analysis.clone()))
        // Last layer runs first: the JWT check, then the account lookup.
        .layer(middleware::from_fn_with_state(
            services.accounts.clone(),
            account_guard::account_guard,
        ))
        .layer(middleware::from_fn_with_state(
            services.auth_config.clone(),
            jwt_auth_middleware,
        ))
}

pub(crate) fn success_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    ApiResponse::success_with_status(data, status).into_response()
}
