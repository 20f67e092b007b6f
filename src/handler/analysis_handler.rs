use crate::handler::{account_guard::CurrentAccount, extract::JsonBody, success_response};
use crate::service::analysis_service::AnalysisService;
use crate::service::error::ServiceError;
use axum::{
    Extension, Router, extract::Path, http::StatusCode, response::Response, routing::get,
};

type Account = Extension<CurrentAccount>;

pub(crate) fn router(service: AnalysisService) -> Router {
    let list_service = service.clone();
    let create_service = service.clone();
    let get_service = service.clone();
    let video_service = service.clone();
    let results_service = service;

    Router::new()
        .route(
            "/tasks",
            get(move |account: Account| list_tasks(list_service.clone(), account)).post(
                move |account: Account, payload: JsonBody| {
                    create_task(create_service.clone(), account, payload)
                },
            ),
        )
        .route(
            "/tasks/{id}",
            get(move |account: Account, id: Path<String>| {
                get_task(get_service.clone(), account, id)
            }),
        )
        .route(
            "/tasks/{id}/results",
            get(move |account: Account, id: Path<String>| {
                task_results(results_service.clone(), account, id)
            }),
        )
        .route(
            "/videos/{id}/tasks",
            get(move |account: Account, id: Path<String>| {
                video_tasks(video_service.clone(), account, id)
            }),
        )
}

async fn list_tasks(
    service: AnalysisService,
    Extension(CurrentAccount(account)): Account,
) -> Result<Response, ServiceError> {
    let tasks = service.list(&account).await?;
    Ok(success_response(StatusCode::OK, tasks))
}

async fn create_task(
    service: AnalysisService,
    Extension(CurrentAccount(account)): Account,
    JsonBody(payload): JsonBody,
) -> Result<Response, ServiceError> {
    let task = service.create(&account, payload).await?;
    Ok(success_response(StatusCode::CREATED, task))
}

async fn get_task(
    service: AnalysisService,
    Extension(CurrentAccount(account)): Account,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let task = service.get(&account, &id).await?;
    Ok(success_response(StatusCode::OK, task))
}

async fn video_tasks(
    service: AnalysisService,
    Extension(CurrentAccount(account)): Account,
    Path(video_id): Path<String>,
) -> Result<Response, ServiceError> {
    let tasks = service.list_for_video(&account, &video_id).await?;
    Ok(success_response(StatusCode::OK, tasks))
}

/// Engine output plus a `data_quality` report.
async fn task_results(
    service: AnalysisService,
    Extension(CurrentAccount(account)): Account,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let results = service.results(&account, &id).await?;
    Ok(success_response(StatusCode::OK, results))
}
