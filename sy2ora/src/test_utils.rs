//! Test utilities for handler and integration tests.

use crate::backend::MockBackend;
use crate::config::Config;
use axum_test::TestServer;
use axum_test::multipart::Part;
use std::sync::Arc;
use std::time::Duration;

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    config.backend.timeout = Duration::from_secs(5);
    config.backend.max_concurrency = 2;
    config.backend.retry_backoff = Duration::from_millis(10);
    config
}

pub fn create_test_app(backend: MockBackend) -> TestServer {
    create_test_app_with_config(create_test_config(), backend)
}

pub fn create_test_app_with_config(config: Config, backend: MockBackend) -> TestServer {
    crate::Application::with_backend(config, Arc::new(backend))
        .expect("Failed to create application")
        .into_test_server()
}

/// A `files` upload part with the given filename.
pub fn sql_part(name: &str, content: &str) -> Part {
    Part::bytes(content.as_bytes().to_vec())
        .file_name(name)
        .mime_type("application/sql")
}
