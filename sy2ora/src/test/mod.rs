//! End-to-end tests running the full application against a mocked Ollama server.

use crate::Application;
use crate::conversion::NO_RESPONSE_PLACEHOLDER;
use crate::test_utils::{create_test_config, sql_part};
use axum_test::{TestServer, multipart::MultipartForm};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app_against(mock_server: &MockServer, configure: impl FnOnce(&mut crate::Config)) -> TestServer {
    let mut config = create_test_config();
    config.backend.url = format!("{}/api/generate", mock_server.uri())
        .parse()
        .expect("mock server URL is valid");
    configure(&mut config);

    Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}

/// Full flow: upload, prompt sent to Ollama, fenced SQL extracted from the reply
#[test_log::test(tokio::test)]
async fn test_e2e_conversion_with_mocked_ollama() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "codellama", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "codellama",
            "response": "Here is the converted code:\n```sql\nSELECT * FROM orders WHERE ROWNUM <= 10;\n```\nLet me know if you need more.",
            "done": true
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let server = app_against(&mock_server, |_| {}).await;

    let form = MultipartForm::new()
        .add_part("files", sql_part("orders.sql", "SELECT TOP 10 * FROM orders"))
        .add_part("files", sql_part("notes.txt", "SELECT TOP 10 * FROM orders"));

    let response = server.post("/convert-multiple").multipart(form).await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "files": [
            { "name": "orders_oracle.sql", "content": "SELECT * FROM orders WHERE ROWNUM <= 10;" },
            { "name": "notes_oracle.sql", "content": "SELECT * FROM orders WHERE ROWNUM <= 10;" }
        ]
    }));

    let requests = mock_server.received_requests().await.expect("request recording enabled");
    let body: serde_json::Value = requests[0].body_json().expect("request body is JSON");
    assert!(
        body["prompt"]
            .as_str()
            .expect("prompt is a string")
            .starts_with("Convert the following Sybase SQL code into optimized Oracle SQL:\nSELECT TOP 10 * FROM orders")
    );
}

/// An unfenced reply is returned trimmed as-is
#[test_log::test(tokio::test)]
async fn test_e2e_unfenced_reply_used_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  SELECT 1 FROM DUAL;\n" })))
        .mount(&mock_server)
        .await;

    let server = app_against(&mock_server, |_| {}).await;

    let response = server
        .post("/convert-multiple")
        .multipart(MultipartForm::new().add_part("files", sql_part("one.sql", "SELECT 1")))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "files": [{ "name": "one_oracle.sql", "content": "SELECT 1 FROM DUAL;" }]
    }));
}

/// Ollama failing does not fail the batch
#[test_log::test(tokio::test)]
async fn test_e2e_backend_error_yields_placeholder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let server = app_against(&mock_server, |_| {}).await;

    let form = MultipartForm::new()
        .add_part("files", sql_part("a.sql", "SELECT 1"))
        .add_part("files", sql_part("image.png", "not sql"));

    let response = server.post("/convert-multiple").multipart(form).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["files"],
        json!([{ "name": "a_oracle.sql", "content": NO_RESPONSE_PLACEHOLDER }])
    );
    assert_eq!(body["skipped"][0]["name"], "image.png");
}

/// A single transient failure is retried when retries are configured
#[test_log::test(tokio::test)]
async fn test_e2e_transient_error_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "```sql\nSELECT 1 FROM DUAL;\n```" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let server = app_against(&mock_server, |config| config.backend.max_retries = 2).await;

    let response = server
        .post("/convert-multiple")
        .multipart(MultipartForm::new().add_part("files", sql_part("retry.sql", "SELECT 1")))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "files": [{ "name": "retry_oracle.sql", "content": "SELECT 1 FROM DUAL;" }]
    }));
}

#[test_log::test(tokio::test)]
async fn test_healthz() {
    let mock_server = MockServer::start().await;
    let server = app_against(&mock_server, |_| {}).await;

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[test_log::test(tokio::test)]
async fn test_openapi_document_lists_conversion_endpoint() {
    let mock_server = MockServer::start().await;
    let server = app_against(&mock_server, |_| {}).await;

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/convert-multiple"]["post"].is_object());
    assert!(doc["components"]["schemas"]["ConvertResponse"].is_object());
}

#[test_log::test(tokio::test)]
async fn test_cors_wildcard_by_default() {
    let mock_server = MockServer::start().await;
    let server = app_against(&mock_server, |_| {}).await;

    let response = server
        .get("/healthz")
        .add_header("origin", "https://app.example.com")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

#[test_log::test(tokio::test)]
async fn test_cors_restricted_origins() {
    let mock_server = MockServer::start().await;
    let server = app_against(&mock_server, |config| {
        config.cors.allowed_origins = vec![crate::config::CorsOrigin::Url(
            "https://app.example.com".parse().expect("valid origin"),
        )];
    })
    .await;

    let allowed = server
        .get("/healthz")
        .add_header("origin", "https://app.example.com")
        .await;
    assert_eq!(allowed.header("access-control-allow-origin"), "https://app.example.com");

    let denied = server.get("/healthz").add_header("origin", "https://evil.example.com").await;
    assert!(denied.maybe_header("access-control-allow-origin").is_none());
}

#[test_log::test(tokio::test)]
async fn test_metrics_endpoint_disabled_by_default() {
    let mock_server = MockServer::start().await;
    let server = app_against(&mock_server, |_| {}).await;

    let response = server.get("/internal/metrics").await;

    response.assert_status_not_found();
}

// The only test that enables metrics: axum-prometheus installs a process-wide recorder.
#[test_log::test(tokio::test)]
async fn test_metrics_endpoint_counts_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "SELECT 1 FROM DUAL;" })))
        .mount(&mock_server)
        .await;

    let server = app_against(&mock_server, |config| config.enable_metrics = true).await;

    server
        .post("/convert-multiple")
        .multipart(MultipartForm::new().add_part("files", sql_part("m.sql", "SELECT 1")))
        .await
        .assert_status_ok();

    let response = server.get("/internal/metrics").await;

    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("sy2ora_files_total"));
    assert!(text.contains("outcome=\"converted\""));
}
