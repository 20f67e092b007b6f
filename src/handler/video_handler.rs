use crate::handler::{
    account_guard::CurrentAccount,
    extract::{JsonBody, QueryParams},
    success_response,
};
use crate::service::error::ServiceError;
use crate::service::video_service::VideoService;
use axum::{
    Extension, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde::Deserialize;

type Account = Extension<CurrentAccount>;

#[derive(Debug, Deserialize)]
struct ListQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    #[serde(default)]
    include_tasks: bool,
}

pub(crate) fn router(service: VideoService) -> Router {
    let list_service = service.clone();
    let create_service = service.clone();
    let get_service = service.clone();
    let delete_service = service;

    Router::new()
        .route(
            "/videos",
            get(move |account: Account, query: QueryParams<ListQuery>| {
                list_videos(list_service.clone(), account, query)
            })
            .post(move |account: Account, payload: JsonBody| {
                create_video(create_service.clone(), account, payload)
            }),
        )
        .route(
            "/videos/{id}",
            get(move |account: Account, id: Path<String>| {
                get_video(get_service.clone(), account, id)
            })
            .delete(move |account: Account, id: Path<String>| {
                delete_video(delete_service.clone(), account, id)
            }),
        )
}

async fn list_videos(
    service: VideoService,
    Extension(CurrentAccount(account)): Account,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Response, ServiceError> {
    let data = service
        .list(&account, query.skip, query.limit, query.include_tasks)
        .await?;
    Ok(success_response(StatusCode::OK, data))
}

async fn create_video(
    service: VideoService,
    Extension(CurrentAccount(account)): Account,
    JsonBody(payload): JsonBody,
) -> Result<Response, ServiceError> {
    let data = service.create(&account, payload).await?;
    Ok(success_response(StatusCode::CREATED, data))
}

async fn get_video(
    service: VideoService,
    Extension(CurrentAccount(account)): Account,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let data = service.get(&account, &id).await?;
    Ok(success_response(StatusCode::OK, data))
}

async fn delete_video(
    service: VideoService,
    Extension(CurrentAccount(account)): Account,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let data = service.delete(&account, &id).await?;
    Ok(success_response(StatusCode::OK, data))
}
