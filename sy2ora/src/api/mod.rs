//! HTTP API: route handlers and the JSON shapes they exchange.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! The only business endpoint is `POST /convert-multiple`. OpenAPI documentation for it is served
//! at `/docs` (see [`crate::openapi`]).

pub mod handlers;
pub mod models;
