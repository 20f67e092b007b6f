use crate::analysis_backend::AnalysisBackendClient;
use crate::config::AppSettings;
use crate::handler::{ApiServices, api_router, upload_handler::upload_size_limits};
use crate::service::{
    account_service::AccountService, analysis_service::AnalysisService,
    upload_service::UploadService, video_service::VideoService,
};
use crate::storage::{self, SharedObjectStorage};
use common_http_server_rs::{
    AppBuilder, AppConfig, LoggingConfig, MonitoringState, Server, ServerConfig,
    SharedAuthConfig, auth_presets, init_logging, presets as cors_presets,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DbErr};
use std::{path::PathBuf, sync::Arc};
use tower_http::services::ServeDir;

const LOG_FILE_PATH: &str = "logs/video-analysis-bff.jsonl";

fn sanitize_sqlite_url(database_url: String) -> String {
    let is_sqlite = database_url.starts_with("sqlite://") || database_url.starts_with("sqlite:");
    if !is_sqlite {
        return database_url;
    }

    let mut parts = database_url.splitn(2, '?');
    let base = parts.next().unwrap_or_default();
    let Some(query) = parts.next() else {
        return database_url;
    };

    let filtered: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !key.eq_ignore_ascii_case("foreign_keys")
        })
        .collect();

    if filtered.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", filtered.join("&"))
    }
}

/// Opens the database and brings the schema up to date.
async fn connect_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let database_url = sanitize_sqlite_url(database_url.to_string());
    let db = Database::connect(&database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

fn auth_config(settings: &AppSettings) -> SharedAuthConfig {
    let config = match &settings.jwt_secret {
        Some(secret) => auth_presets::production(secret.clone()),
        None => {
            tracing::warn!(
                "JWT_SECRET_KEY is not set; using a random secret, tokens will not survive a restart"
            );
            auth_presets::development()
        }
    };
    config
        .with_jwt_expiration_hours(settings.jwt_expiration_hours)
        .shared()
}

fn logging_config(settings: &AppSettings) -> LoggingConfig {
    LoggingConfig::default()
        .with_format(settings.log_format)
        .with_json_backend(true)
        .with_json_backend_path(LOG_FILE_PATH)
}

fn app_config(settings: &AppSettings, monitoring: MonitoringState) -> AppConfig {
    let cors = if settings.cors_allowed_origins.is_empty() {
        cors_presets::development()
    } else {
        cors_presets::web_frontend(&settings.cors_allowed_origins)
    };

    AppConfig::new()
        .with_logging(true)
        .with_tracing(true)
        .with_cors_config(cors)
        .with_logging_config(logging_config(settings))
        .with_monitoring(monitoring)
}

pub(crate) fn build_services(
    db: Arc<DatabaseConnection>,
    settings: &AppSettings,
    storage: SharedObjectStorage,
    monitoring: &MonitoringState,
) -> ApiServices {
    let auth_config = auth_config(settings);
    let upload_outcomes = monitoring.metrics.register_counter(
        "video_uploads_total",
        "Video uploads by outcome",
        &["outcome"],
    );

    ApiServices {
        accounts: AccountService::new(db.clone(), auth_config.clone()),
        videos: VideoService::new(db.clone()),
        analysis: AnalysisService::new(
            db.clone(),
            settings
                .analysis_backend_url
                .as_deref()
                .map(AnalysisBackendClient::new),
        ),
        uploads: UploadService::new(storage.clone(), settings.max_upload_bytes)
            .with_outcome_counter(upload_outcomes),
        storage_provider: storage.provider_name(),
        auth_config,
        db,
    }
}

/// Mounts `/api` and, for local storage, the uploaded files under `/files`.
pub(crate) fn app_builder(
    app_config: AppConfig,
    services: ApiServices,
    served_root: Option<PathBuf>,
) -> AppBuilder {
    let max_upload_bytes = services.uploads.max_upload_bytes();
    let mut builder = AppBuilder::new(app_config)
        .validate_auth_config(services.auth_config.clone())
        .validate_size_limit_config(upload_size_limits(max_upload_bytes))
        .nest("/api", api_router(services));

    if let Some(root) = served_root {
        builder = builder.nest_service("/files", ServeDir::new(root));
    }

    builder
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = AppSettings::from_env()?;
    // Installed before startup so connection and storage logs are captured.
    init_logging(&logging_config(&settings))?;

    let db = connect_database(&settings.database_url).await?;
    tracing::info!(
        storage = settings.storage_provider_name(),
        analysis_backend = settings.analysis_backend_url.as_deref().unwrap_or("disabled"),
        "Database ready"
    );

    let storage = storage::from_settings(&settings.storage)?;
    let served_root = storage.served_root().map(|root| root.to_path_buf());

    let monitoring = MonitoringState::new();
    let services = build_services(Arc::new(db), &settings, storage, &monitoring);
    let builder = app_builder(app_config(&settings, monitoring), services, served_root);

    let server_config = ServerConfig::new(settings.port).with_host(settings.host.clone());
    Server::new(server_config, builder).start().await
}
