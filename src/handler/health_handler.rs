use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{SecondsFormat, Utc};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct ServiceHealth {
    status: &'static str,
    version: &'static str,
    timestamp: String,
    database: &'static str,
    storage: &'static str,
}

fn backend_name(db: &DatabaseConnection) -> &'static str {
    match db.get_database_backend() {
        DatabaseBackend::Sqlite => "sqlite",
        DatabaseBackend::Postgres => "postgres",
        DatabaseBackend::MySql => "mysql",
    }
}

pub(crate) fn router(db: Arc<DatabaseConnection>, storage_provider: &'static str) -> Router {
    Router::new().route(
        "/health",
        get(move || service_health(db.clone(), storage_provider)),
    )
}

async fn service_health(
    db: Arc<DatabaseConnection>,
    storage_provider: &'static str,
) -> impl IntoResponse {
    let reachable = match db.ping().await {
        Ok(()) => true,
        Err(error) => {
            tracing::error!(error = %error, "Database ping failed");
            false
        }
    };

    let body = ServiceHealth {
        status: if reachable { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        database: backend_name(&db),
        storage: storage_provider,
    };
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
