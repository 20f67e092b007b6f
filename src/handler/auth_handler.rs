use crate::handler::{extract::JsonBody, success_response};
use crate::service::account_service::AccountService;
use crate::service::error::ServiceError;
use axum::{Router, http::StatusCode, response::Response, routing::post};
use serde_json::Value;

pub(crate) fn router(service: AccountService) -> Router {
    let register_service = service.clone();
    let login_service = service;

    Router::new()
        .route(
            "/register",
            post(move |JsonBody(payload): JsonBody| register(register_service.clone(), payload)),
        )
        .route(
            "/login",
            post(move |JsonBody(payload): JsonBody| login(login_service.clone(), payload)),
        )
}

async fn register(service: AccountService, payload: Value) -> Result<Response, ServiceError> {
    let data = service.register(payload).await?;
    Ok(success_response(StatusCode::CREATED, data))
}

async fn login(service: AccountService, payload: Value) -> Result<Response, ServiceError> {
    let data = service.login(payload).await?;
    Ok(success_response(StatusCode::OK, data))
}
