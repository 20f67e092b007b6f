//! Monitoring primitives:
//! - Prometheus metrics collector
//! - request performance middleware
//! - `/metrics` exposition endpoint

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::Collector,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error};

const UNMATCHED_PATH_LABEL: &str = "__unmatched__";

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    registry: Registry,
    http_requests_total: Option<CounterVec>,
    http_request_duration_seconds: Option<HistogramVec>,
    in_flight_requests: Option<Gauge>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = register_metric(
            &registry,
            "http_requests_total",
            CounterVec::new(
                Opts::new("http_requests_total", "Total number of HTTP requests"),
                &["method", "path", "status_code"],
            ),
        );

        let http_request_duration_seconds = register_metric(
            &registry,
            "http_request_duration_seconds",
            HistogramVec::new(
                HistogramOpts::new(
                    "http_request_duration_seconds",
                    "HTTP request duration in seconds",
                )
                .buckets(vec![
                    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
                ]),
                &["method", "path", "status_code"],
            ),
        );

        let in_flight_requests = register_metric(
            &registry,
            "http_requests_in_flight",
            Gauge::new("http_requests_in_flight", "Requests currently being served"),
        );

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            in_flight_requests,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers an application-level counter on the shared registry.
    /// Returns `None` (and logs) when the metric cannot be created.
    pub fn register_counter(&self, name: &str, help: &str, labels: &[&str]) -> Option<CounterVec> {
        register_metric(
            &self.registry,
            name,
            CounterVec::new(Opts::new(name, help), labels),
        )
    }

    pub fn increment_requests(&self, method: &str, path: &str, status_code: u16) {
        if let Some(metric) = &self.http_requests_total {
            let labels = &[method, path, &status_code.to_string()];
            metric.with_label_values(labels).inc();
        }
    }

    pub fn record_request_duration(
        &self,
        method: &str,
        path: &str,
        status_code: u16,
        duration: Duration,
    ) {
        if let Some(metric) = &self.http_request_duration_seconds {
            let labels = &[method, path, &status_code.to_string()];
            metric
                .with_label_values(labels)
                .observe(duration.as_secs_f64());
        }
    }

    fn track_in_flight(&self, delta: f64) {
        if let Some(gauge) = &self.in_flight_requests {
            gauge.add(delta);
        }
    }

    pub fn export_metrics(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn register_metric<T>(
    registry: &Registry,
    metric_name: &str,
    metric_result: Result<T, prometheus::Error>,
) -> Option<T>
where
    T: Collector + Clone + 'static,
{
    // Fail open: a broken metric never takes the server down.
    let metric = match metric_result {
        Ok(metric) => metric,
        Err(err) => {
            error!(
                metric = metric_name,
                error = %err,
                "Failed to create Prometheus metric"
            );
            return None;
        }
    };

    if let Err(err) = registry.register(Box::new(metric.clone())) {
        error!(
            metric = metric_name,
            error = %err,
            "Failed to register Prometheus metric"
        );
        return None;
    }

    Some(metric)
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestStats {
    #[serde(skip)]
    start_time: Instant,
    total_requests: u64,
    error_requests: u64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: 0,
            error_requests: 0,
        }
    }

    pub fn record_request(&mut self, is_error: bool) {
        self.total_requests += 1;
        if is_error {
            self.error_requests += 1;
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.total_requests > 0 {
            (self.error_requests as f64 / self.total_requests as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn error_requests(&self) -> u64 {
        self.error_requests
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedStats = Arc<RwLock<RequestStats>>;

#[derive(Debug, Clone)]
pub struct MonitoringState {
    pub metrics: Arc<MetricsCollector>,
    pub stats: SharedStats,
}

impl MonitoringState {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(MetricsCollector::new()),
            stats: Arc::new(RwLock::new(RequestStats::new())),
        }
    }
}

impl Default for MonitoringState {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn metrics_endpoint(State(state): State<MonitoringState>) -> impl IntoResponse {
    match state.metrics.export_metrics() {
        Ok(metrics) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to export metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export metrics",
            )
                .into_response()
        }
    }
}

pub async fn performance_monitoring_middleware(
    State(state): State<MonitoringState>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = metric_path_label(&request);

    state.metrics.track_in_flight(1.0);
    let response = next.run(request).await;
    state.metrics.track_in_flight(-1.0);

    let status_code = response.status().as_u16();
    let duration = start_time.elapsed();

    state.stats.write().await.record_request(status_code >= 400);
    state
        .metrics
        .increment_requests(&method, &path, status_code);
    state
        .metrics
        .record_request_duration(&method, &path, status_code, duration);

    debug!(
        method = %method,
        path_label = %path,
        status_code,
        duration_ms = duration.as_millis() as u64,
        "Request processed"
    );

    response
}

fn metric_path_label(request: &Request) -> String {
    // Route templates keep label cardinality bounded (`/videos/{id}`, not ids).
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH_LABEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn metrics_use_matched_path_label() {
        let state = MonitoringState::new();
        let app = Router::new().route("/videos/{id}", get(ok_handler)).layer(
            middleware::from_fn_with_state(state.clone(), performance_monitoring_middleware),
        );

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/videos/123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let metrics_text = state.metrics.export_metrics().unwrap();
        assert!(metrics_text.contains("path=\"/videos/{id}\""));
        assert!(!metrics_text.contains("path=\"/videos/123\""));
    }

    #[tokio::test]
    async fn unmatched_paths_count_as_errors() {
        let state = MonitoringState::new();
        let app = Router::new()
            .route("/", get(ok_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                performance_monitoring_middleware,
            ));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/totally/random/path/123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let metrics_text = state.metrics.export_metrics().unwrap();
        assert!(metrics_text.contains("path=\"__unmatched__\""));
        assert_eq!(state.stats.read().await.error_requests(), 1);
    }

    #[test]
    fn duplicate_counter_registration_fails_open() {
        let collector = MetricsCollector::new();
        assert!(collector.register_counter("uploads_total", "uploads", &["outcome"]).is_some());
        assert!(collector.register_counter("uploads_total", "uploads", &["outcome"]).is_none());
    }
}
