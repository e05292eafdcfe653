//! # sy2ora: Sybase to Oracle SQL conversion service
//!
//! `sy2ora` accepts batches of Sybase SQL files over HTTP, asks a code-generation model (an
//! Ollama-compatible `/api/generate` endpoint) to rewrite each one in Oracle SQL, and returns the
//! generated code for the whole batch in one JSON response.
//!
//! ## Request Flow
//!
//! A client posts a multipart form to `POST /convert-multiple` with one `files` part per upload.
//! The [`api`] handler collects the parts and hands them to the [`conversion::Converter`], which
//! drops files that are not `.sql`/`.txt`, builds a fixed instruction prompt for each remaining
//! file, calls the [`backend::ModelBackend`] and pulls the SQL out of the first ```` ```sql ````
//! fenced block of the answer. Files are converted concurrently through a bounded pool and
//! returned in upload order. A failed model call never fails the batch: that file's content is
//! replaced by a fixed placeholder.
//!
//! Nothing is persisted. The service does not check that either the input or the generated SQL
//! is valid.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use sy2ora::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = sy2ora::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     sy2ora::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod backend;
pub mod config;
pub mod conversion;
pub mod errors;
pub mod metrics;
mod openapi;
pub mod telemetry;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use crate::backend::{ModelBackend, OllamaBackend};
use crate::config::CorsOrigin;
use crate::conversion::Converter;
use crate::openapi::ApiDoc;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .converter(converter)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub converter: Converter,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry a path; Url adds a trailing slash
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// - `POST /convert-multiple` with the configured upload limit
/// - `GET /healthz`
/// - OpenAPI document at `/api-docs/openapi.json`, rendered at `/docs`
/// - `/internal/metrics` when metrics are enabled
/// - CORS and tracing layers
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let upload_limit = state.config.limits.max_upload_size;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/convert-multiple",
            post(api::handlers::conversions::convert_multiple).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state.clone())
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router.layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Owns the router and configuration for the lifetime of the process.
///
/// 1. **Create**: [`Application::new`] builds the Ollama backend, the converter and the router
/// 2. **Serve**: [`Application::serve`] binds the TCP listener and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create an application talking to the Ollama endpoint from `config.backend`
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = Arc::new(OllamaBackend::new(&config.backend)?);
        Self::with_backend(config, backend)
    }

    /// Create an application around any model backend
    pub fn with_backend(config: Config, backend: Arc<dyn ModelBackend>) -> anyhow::Result<Self> {
        debug!("Starting sy2ora with configuration: {:#?}", config);

        let converter = Converter::new(backend, &config.backend);
        let state = AppState::builder().config(config.clone()).converter(converter).build();
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            backend = %self.config.backend.url,
            model = %self.config.backend.model,
            "sy2ora listening on http://{}",
            bind_addr
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
