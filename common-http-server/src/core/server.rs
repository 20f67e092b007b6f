//! Server bootstrap and runtime configuration.
//!
//! The startup flow is intentionally single-path:
//! `AppBuilder -> Server::new(...) -> Server::start()`.

use crate::core::{
    app::AppBuilder, cors::CorsConfig, logging::LoggingConfig, logging::init_logging,
    logging::structured_logging_middleware,
};
use crate::monitoring::{MonitoringState, performance_monitoring_middleware};
use axum::{Router, middleware};
use std::net::SocketAddr;
use tracing::{error, info};

pub(crate) type StartupValidation =
    Box<dyn Fn() -> Result<(), ConfigError> + Send + Sync + 'static>;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub enable_cors: bool,
    pub enable_tracing: bool,
    pub enable_logging: bool,
    pub cors_config: Option<CorsConfig>,
    pub logging_config: LoggingConfig,
    /// Prometheus state; when set, `/metrics` is mounted and every request is timed.
    pub monitoring: Option<MonitoringState>,
}

impl ServerConfig {
    /// 创建新的服务器配置
    pub fn new(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    /// 设置主机地址
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// 获取 SocketAddr
    pub fn address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            ConfigError::InvalidSocketAddress {
                host: self.host.clone(),
                port: self.port,
            }
        })
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 端口 0 会触发系统随机端口分配，这里要求显式配置固定端口
        if self.port == 0 {
            return Err(ConfigError::InvalidPort {
                port: self.port,
                min: 1,
                max: u16::MAX,
            });
        }

        // 验证主机地址
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        self.address()?;

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(3000)
    }
}

impl AppConfig {
    /// 创建新的应用配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 CORS
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// 设置 CORS 配置
    pub fn with_cors_config(mut self, config: CorsConfig) -> Self {
        self.cors_config = Some(config);
        self.enable_cors = true;
        self
    }

    /// 设置追踪
    pub fn with_tracing(mut self, enable: bool) -> Self {
        self.enable_tracing = enable;
        self
    }

    /// 设置日志
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// 设置日志配置
    pub fn with_logging_config(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self
    }

    /// 启用 Prometheus 指标
    pub fn with_monitoring(mut self, monitoring: MonitoringState) -> Self {
        self.monitoring = Some(monitoring);
        self
    }

    /// 获取 CORS 配置
    pub fn get_cors_config(&self) -> Option<CorsConfig> {
        if self.enable_cors {
            Some(self.cors_config.clone().unwrap_or_else(|| {
                if cfg!(debug_assertions) {
                    CorsConfig::new().dev_mode(true)
                } else {
                    CorsConfig::new()
                }
            }))
        } else {
            None
        }
    }

    /// 验证应用配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证 CORS 配置
        if self.enable_cors
            && let Some(cors_config) = &self.cors_config
        {
            cors_config
                .validate()
                .map_err(|e| ConfigError::InvalidCors(e.to_string()))?;
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            enable_tracing: true,
            enable_logging: true,
            cors_config: None,
            logging_config: LoggingConfig::default(),
            monitoring: None,
        }
    }
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port {port}: must be between {min} and {max}")]
    InvalidPort { port: u16, min: u16, max: u16 },
    #[error("Empty host address")]
    EmptyHost,
    #[error("Invalid CORS configuration: {0}")]
    InvalidCors(String),
    #[error("Invalid socket address: {host}:{port}")]
    InvalidSocketAddress { host: String, port: u16 },
    #[error("Empty allowed origins")]
    EmptyAllowedOrigins,
    #[error("Empty allowed methods")]
    EmptyAllowedMethods,
    #[error("Empty allowed headers")]
    EmptyAllowedHeaders,
    #[error("Invalid auth configuration: {0}")]
    InvalidAuth(String),
    #[error("Invalid protection configuration: {0}")]
    InvalidProtection(String),
}

/// HTTP 服务器
pub struct Server {
    server_config: ServerConfig,
    app_builder: AppBuilder,
}

impl Server {
    /// 创建新的服务器
    pub fn new(server_config: ServerConfig, app_builder: AppBuilder) -> Self {
        Self {
            server_config,
            app_builder,
        }
    }

    /// 启动服务器
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let (app, app_config, startup_validations, endpoints) = self.app_builder.into_parts();

        // 初始化日志系统
        if app_config.enable_logging {
            init_logging(&app_config.logging_config)?;
        }

        // 验证服务器配置
        self.server_config
            .validate()
            .map_err(|e| format!("Invalid server configuration: {}", e))?;

        // 验证应用配置
        app_config
            .validate()
            .map_err(|e| format!("Invalid app configuration: {}", e))?;

        for startup_validation in startup_validations {
            startup_validation().map_err(|e| format!("Invalid startup configuration: {}", e))?;
        }

        // 构建应用
        let app = apply_app_layers(app, &app_config);

        let addr = self
            .server_config
            .address()
            .map_err(|e| format!("Invalid server configuration: {}", e))?;

        info!(
            host = %self.server_config.host,
            port = %self.server_config.port,
            cors_enabled = app_config.enable_cors,
            metrics_enabled = app_config.monitoring.is_some(),
            "Server starting on http://{}",
            addr
        );
        log_known_endpoints(addr, &endpoints);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

pub(crate) fn apply_app_layers(mut router: Router, config: &AppConfig) -> Router {
    // Outermost layer is added last: CORS, then tracing, request logging, metrics.
    if let Some(monitoring) = &config.monitoring {
        router = router.layer(middleware::from_fn_with_state(
            monitoring.clone(),
            performance_monitoring_middleware,
        ));
    }

    if config.enable_logging {
        router = router.layer(middleware::from_fn(structured_logging_middleware));
    }

    if config.enable_tracing {
        router = router.layer(tower_http::trace::TraceLayer::new_for_http());
    }

    if let Some(cors_config) = config.get_cors_config() {
        router = router.layer(cors_config.build_layer());
    }

    router
}

fn log_known_endpoints(addr: SocketAddr, endpoints: &[String]) {
    for endpoint in endpoints {
        info!(endpoint = %format!("http://{addr}{endpoint}"), "Route registered");
    }
}

async fn shutdown_signal() {
    // `Ctrl+C` is supported on every platform.
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };

    info!(
        signal,
        "Shutdown signal received, starting graceful shutdown"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_zero_is_rejected() {
        assert!(matches!(
            ServerConfig::new(0).validate(),
            Err(ConfigError::InvalidPort { .. })
        ));
    }

    #[test]
    fn host_must_parse_as_socket_address() {
        let config = ServerConfig::new(8080).with_host("not a host");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSocketAddress { .. })
        ));
        assert!(ServerConfig::new(8080).with_host("0.0.0.0").validate().is_ok());
    }

    #[test]
    fn disabled_cors_skips_origin_validation() {
        let config = AppConfig::new()
            .with_cors_config(CorsConfig::new().allowed_origins(Vec::<&str>::new()))
            .with_cors(false);
        assert!(config.validate().is_ok());
        assert!(config.get_cors_config().is_none());
    }
}
